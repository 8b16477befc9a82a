use std::fs;
use std::path::PathBuf;

use rubric_core::report::Results;
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::types::{SubmissionMetadata, KEY_RESULTS, KEY_SUBMISSION_METADATA};

/// Mensaje del día: elige una línea de un YAML y la pone como `output`
/// global del reporte. La elección es determinista por entrega, sembrada
/// con el timestamp de creación.
#[derive(Debug, Clone)]
pub struct Motd;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotdConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub halt_on_fail: bool,
}

impl StepConfig for MotdConfig {
    fn fields() -> &'static [&'static str] {
        &["path", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl TypedStep for Motd {
    type Config = MotdConfig;

    fn name(&self) -> &'static str {
        "gradescope.motd"
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let raw = fs::read_to_string(&config.path)?;
        let messages: Vec<String> = serde_yaml::from_str(&raw)?;
        if messages.is_empty() {
            return Err(StepError::Other(format!(
                "message list at {} is empty",
                config.path.display()
            )));
        }

        let metadata: SubmissionMetadata = session.fetch(KEY_SUBMISSION_METADATA)?;
        let index = metadata.created_at.timestamp().rem_euclid(messages.len() as i64) as usize;

        let mut results: Results = session.fetch(KEY_RESULTS)?;
        results.output = Some(messages[index].clone());
        session.put(KEY_RESULTS, &results)?;

        Ok(true)
    }
}
