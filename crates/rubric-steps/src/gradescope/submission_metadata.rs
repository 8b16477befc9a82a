use std::fs;
use std::path::PathBuf;

use rubric_core::report::Results;
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::types::{SubmissionMetadata, KEY_RESULTS, KEY_SUBMISSION_METADATA};

/// Lee el `submission_metadata.json` de la plataforma y siembra el
/// blackboard: la metadata parseada y un `Results` vacío. Debe correr antes
/// que cualquier step que consuma uno u otro.
#[derive(Debug, Clone)]
pub struct ReadSubMetadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubMetadataConfig {
    #[serde(default = "default_metadata_path")]
    pub submission_metadata_path: PathBuf,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("/autograder/submission_metadata.json")
}

impl StepConfig for SubMetadataConfig {
    fn fields() -> &'static [&'static str] {
        &["submission_metadata_path", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl TypedStep for ReadSubMetadata {
    type Config = SubMetadataConfig;

    fn name(&self) -> &'static str {
        "gradescope.sub_info"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "Submission Metadata".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let raw = fs::read_to_string(&config.submission_metadata_path)?;
        let metadata: SubmissionMetadata = serde_json::from_str(&raw)?;

        let pretty = serde_json::to_string_pretty(&metadata)?;
        session.private().trace(format!("Submission metadata:\n{pretty}"));

        session.put(KEY_SUBMISSION_METADATA, &metadata)?;
        session.put(KEY_RESULTS, &Results::default())?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_core::Level;
    use std::io::Write;

    #[test]
    fn seeds_metadata_and_empty_results() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{
                "id": 9,
                "created_at": "2024-03-10T12:00:00Z",
                "assignment": {{"due_date": "2024-03-11T00:00:00Z", "title": "Lab 1"}},
                "users": []
            }}"#
        )
        .expect("write");

        let mut session = Session::standard(false, Level::Critical);
        let config = SubMetadataConfig {
            submission_metadata_path: file.path().to_path_buf(),
            halt_on_fail: true,
        };
        assert!(ReadSubMetadata.run(&mut session, &config).expect("run"));

        let meta: SubmissionMetadata = session.fetch(KEY_SUBMISSION_METADATA).expect("metadata");
        assert_eq!(meta.id, 9);
        assert_eq!(meta.assignment.title, "Lab 1");

        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert!(results.score.is_none());
        assert!(results.tests.is_empty());
    }

    #[test]
    fn missing_file_is_a_step_error() {
        let mut session = Session::standard(false, Level::Critical);
        let config = SubMetadataConfig {
            submission_metadata_path: PathBuf::from("/nonexistent/submission_metadata.json"),
            halt_on_fail: true,
        };
        assert!(ReadSubMetadata.run(&mut session, &config).is_err());
    }

    #[test]
    fn path_defaults_to_the_platform_location() {
        let config: SubMetadataConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(
            config.submission_metadata_path,
            PathBuf::from("/autograder/submission_metadata.json")
        );
    }
}
