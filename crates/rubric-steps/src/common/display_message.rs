use rubric_core::report::TestStatus;
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

/// Muestra un mensaje fijo al estudiante, como test sintético propio.
///
/// El `title` hace de nombre visible y `result` decide si el step cuenta
/// como aprobado, lo que permite usarlo como aviso bloqueante.
#[derive(Debug, Clone)]
pub struct DisplayMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayMessageConfig {
    pub title: String,
    pub text: String,
    #[serde(default = "default_result")]
    pub result: TestStatus,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_result() -> TestStatus {
    TestStatus::Passed
}

impl StepConfig for DisplayMessageConfig {
    fn fields() -> &'static [&'static str] {
        &["title", "text", "result", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl TypedStep for DisplayMessage {
    type Config = DisplayMessageConfig;

    fn name(&self) -> &'static str {
        "display_message"
    }

    fn display_name(&self, config: &Self::Config) -> String {
        config.title.clone()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        // critical ignora el umbral de nivel: el mensaje siempre llega
        session.student().critical(&config.text);
        Ok(config.result == TestStatus::Passed)
    }
}
