use std::fs;
use std::path::PathBuf;

use rubric_core::report::{fold_step_logs, round_to, Results};
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::types::KEY_RESULTS;

/// Serializa el reporte acumulado al archivo que la plataforma recoge.
///
/// Antes de escribir, antepone a los tests reales un test sintético por
/// cada step que haya hablado con el estudiante. Un reporte sin score
/// utilizable se degrada a 0 con warning privado, nunca aborta: sin
/// archivo de salida el alumno no ve nada.
#[derive(Debug, Clone)]
pub struct WriteResults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultsConfig {
    #[serde(default = "default_digits")]
    pub round_tests_to_digits: i32,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_digits() -> i32 {
    3
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/autograder/results/results.json")
}

impl StepConfig for ResultsConfig {
    fn fields() -> &'static [&'static str] {
        &["round_tests_to_digits", "output_path", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl TypedStep for WriteResults {
    type Config = ResultsConfig;

    fn name(&self) -> &'static str {
        "gradescope.results"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "Results".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let mut results: Results = session.fetch(KEY_RESULTS)?;

        if !results.score_is_valid() {
            session
                .private()
                .warning("Not all tests have a score and top-level score not set.");
            session
                .private()
                .warning("Defaulting top-level score to 0 to produce the results file.");
            results.score = Some(0.0);
        }

        let digits = config.round_tests_to_digits;
        results.score = results.score.map(|s| round_to(s, digits));
        for test in results.tests.iter_mut() {
            test.score = test.score.map(|s| round_to(s, digits));
            test.max_score = test.max_score.map(|m| round_to(m, digits));
        }

        let mut folded = fold_step_logs(&session.step_logs, digits);
        folded.append(&mut results.tests);
        results.tests = folded;

        fs::write(&config.output_path, serde_json::to_string(&results)?)?;
        session.put(KEY_RESULTS, &results)?;

        Ok(true)
    }
}
