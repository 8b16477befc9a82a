use std::path::PathBuf;

use rubric_core::report::{Results, TestResult, TestStatus, TestVisibility};
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use crate::exec::{run_shell_with_deadline, run_with_deadline, CommandOutput};
use crate::gradescope::KEY_RESULTS;

/// Comando como línea de shell o como argv explícito.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Argv(Vec<String>),
}

impl CommandSpec {
    fn printable(&self) -> String {
        match self {
            CommandSpec::Line(line) => line.clone(),
            CommandSpec::Argv(argv) => argv.join(" "),
        }
    }
}

/// Corre un comando arbitrario y vuelca su resultado como test del reporte.
#[derive(Debug, Clone)]
pub struct RunCommand;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunCommandConfig {
    #[serde(default = "default_display_name")]
    pub display_name: String,
    pub command: CommandSpec,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Segundos; vencido el plazo el comando cuenta como fallido.
    #[serde(default)]
    pub command_timeout: Option<u64>,
    /// Puntos que otorga el test cuando el comando termina en cero.
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default = "default_true")]
    pub show_output: bool,
    #[serde(default)]
    pub output_visibility: Option<TestVisibility>,
    #[serde(default)]
    pub shell: bool,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_display_name() -> String {
    "No Name".to_string()
}

fn default_true() -> bool {
    true
}

impl StepConfig for RunCommandConfig {
    fn fields() -> &'static [&'static str] {
        &[
            "display_name",
            "command",
            "working_dir",
            "command_timeout",
            "points",
            "show_output",
            "output_visibility",
            "shell",
            "halt_on_fail",
        ]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl RunCommand {
    fn execute(config: &RunCommandConfig) -> Result<CommandOutput, StepError> {
        let cwd = config.working_dir.as_deref();
        let output = match (&config.command, config.shell) {
            (CommandSpec::Line(line), true) => run_shell_with_deadline(line, cwd, config.command_timeout),
            (CommandSpec::Argv(argv), true) => {
                run_shell_with_deadline(&argv.join(" "), cwd, config.command_timeout)
            }
            (CommandSpec::Line(line), false) => {
                let argv: Vec<String> = line.split_whitespace().map(str::to_string).collect();
                run_with_deadline(&argv, cwd, config.command_timeout)
            }
            (CommandSpec::Argv(argv), false) => run_with_deadline(argv, cwd, config.command_timeout),
        };
        output.map_err(StepError::from)
    }
}

impl TypedStep for RunCommand {
    type Config = RunCommandConfig;

    fn name(&self) -> &'static str {
        "common.run_command"
    }

    fn display_name(&self, config: &Self::Config) -> String {
        config.display_name.clone()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let mut results: Results = session.fetch(KEY_RESULTS)?;

        if let Some(dir) = &config.working_dir {
            session.private().debug(format!("Working directory: {}", dir.display()));
        }
        session.private().debug(format!("\n{}", config.command.printable()));

        let output = Self::execute(config)?;

        let mut test_result = TestResult {
            name: Some(config.display_name.clone()),
            max_score: config.points,
            ..Default::default()
        };

        let passed = !output.timed_out && output.return_code == 0;
        if passed {
            test_result.status = Some(TestStatus::Passed);
            test_result.score = config.points;
        } else {
            test_result.status = Some(TestStatus::Failed);
            if config.points.is_some() {
                test_result.score = Some(0.0);
            }
        }

        if config.show_output {
            let mut text = output.combined();
            if output.timed_out {
                let limit = config.command_timeout.unwrap_or_default();
                text.push_str(&format!("\n------------\nTimed out after {limit} seconds."));
            }
            test_result.output = Some(text);
            test_result.visibility = config.output_visibility;
            results.tests.push(test_result);
        }

        session.put(KEY_RESULTS, &results)?;
        Ok(passed)
    }
}
