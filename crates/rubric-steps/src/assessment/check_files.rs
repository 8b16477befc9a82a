use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::{AssessmentPieces, FailedPiece, Piece, KEY_PIECES};

/// Verifica que cada pieza tenga todos sus archivos de alumno en la
/// entrega; las piezas incompletas quedan marcadas como caídas y no se
/// evalúan. Las rutas de las piezas vivas se dejan ya ancladas a sus
/// raíces.
#[derive(Debug, Clone)]
pub struct CheckFiles;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckFilesConfig {
    pub grader_root: PathBuf,
    pub submission_root: PathBuf,
    pub pieces: BTreeMap<String, Piece>,
    #[serde(default)]
    pub halt_on_fail: bool,
}

impl StepConfig for CheckFilesConfig {
    fn fields() -> &'static [&'static str] {
        &["grader_root", "submission_root", "pieces", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }

    /// Un archivo marcado como del alumno no puede existir del lado del
    /// grader: taparía la entrega real.
    fn validate(&self) -> Result<(), String> {
        let mut bad_files: BTreeSet<String> = BTreeSet::new();
        for piece in self.pieces.values() {
            for file in &piece.student_files {
                let grader_file = self.grader_root.join(file);
                if grader_file.is_file() {
                    bad_files.insert(grader_file.display().to_string());
                }
            }
        }
        if !bad_files.is_empty() {
            let listing: Vec<String> = bad_files.into_iter().collect();
            return Err(format!(
                "Files marked for student submission found in grader:\n{}",
                listing.join("\n")
            ));
        }
        Ok(())
    }
}

impl TypedStep for CheckFiles {
    type Config = CheckFilesConfig;

    fn name(&self) -> &'static str {
        "assessment.check_files"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "File Checking".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let mut pieces = AssessmentPieces::default();

        for (name, piece) in &config.pieces {
            let missing: Vec<PathBuf> = piece
                .student_files
                .iter()
                .filter(|f| !config.submission_root.join(f).is_file())
                .cloned()
                .collect();

            if missing.is_empty() {
                let rooted = Piece {
                    student_files: piece
                        .student_files
                        .iter()
                        .map(|f| config.submission_root.join(f))
                        .collect(),
                    assessment_files: piece
                        .assessment_files
                        .iter()
                        .map(|f| config.grader_root.join(f))
                        .collect(),
                };
                pieces.live_pieces.insert(name.clone(), rooted);
            } else {
                pieces
                    .failed_pieces
                    .insert(name.clone(), FailedPiece { reason: "missing required files".to_string() });
                session
                    .both()
                    .error(format!("Missing required files for assessment {name}:"));
                for file in missing {
                    session.both().error(format!("- {}", file.display()));
                }
            }
        }

        let all_live = pieces.live_pieces.len() == config.pieces.len();
        session.put(KEY_PIECES, &pieces)?;
        Ok(all_live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_core::{Level, StepLog};
    use std::fs;

    fn piece(student: &[&str], grader: &[&str]) -> Piece {
        Piece {
            student_files: student.iter().map(PathBuf::from).collect(),
            assessment_files: grader.iter().map(PathBuf::from).collect(),
        }
    }

    fn config(grader: &std::path::Path, submission: &std::path::Path) -> CheckFilesConfig {
        CheckFilesConfig {
            grader_root: grader.to_path_buf(),
            submission_root: submission.to_path_buf(),
            pieces: [
                ("intro".to_string(), piece(&["Intro.txt"], &["IntroTest.txt"])),
                ("extra".to_string(), piece(&["Extra.txt"], &[])),
            ]
            .into_iter()
            .collect(),
            halt_on_fail: false,
        }
    }

    #[test]
    fn complete_submission_keeps_every_piece_live() {
        let grader = tempfile::tempdir().expect("grader");
        let submission = tempfile::tempdir().expect("submission");
        fs::write(submission.path().join("Intro.txt"), "x").expect("write");
        fs::write(submission.path().join("Extra.txt"), "x").expect("write");

        let mut session = Session::standard(false, Level::Critical);
        let cfg = config(grader.path(), submission.path());
        assert!(CheckFiles.run(&mut session, &cfg).expect("run"));

        let pieces: AssessmentPieces = session.fetch(KEY_PIECES).expect("pieces");
        assert_eq!(pieces.live_pieces.len(), 2);
        assert!(pieces.failed_pieces.is_empty());
        // Las rutas vivas vuelven ancladas a la raíz de la entrega.
        let intro = &pieces.live_pieces["intro"];
        assert!(intro.student_files.contains(&submission.path().join("Intro.txt")));
    }

    #[test]
    fn missing_files_fail_their_piece_but_not_the_rest() {
        let grader = tempfile::tempdir().expect("grader");
        let submission = tempfile::tempdir().expect("submission");
        fs::write(submission.path().join("Intro.txt"), "x").expect("write");

        let mut session = Session::standard(false, Level::Critical);
        session.step_logs.push(StepLog::new("assessment.check_files", "File Checking"));
        let cfg = config(grader.path(), submission.path());
        assert!(!CheckFiles.run(&mut session, &cfg).expect("run"));

        let pieces: AssessmentPieces = session.fetch(KEY_PIECES).expect("pieces");
        assert_eq!(pieces.live_pieces.len(), 1);
        assert_eq!(pieces.failed_pieces["extra"].reason, "missing required files");
        let narrative = session.step_logs[0].log_chunks.concat();
        assert!(narrative.contains("Missing required files for assessment extra:"));
        assert!(narrative.contains("Extra.txt"));
    }

    #[test]
    fn student_files_in_the_grader_are_rejected_at_validation() {
        let grader = tempfile::tempdir().expect("grader");
        let submission = tempfile::tempdir().expect("submission");
        fs::write(grader.path().join("Intro.txt"), "shadow").expect("write");

        let cfg = config(grader.path(), submission.path());
        let err = cfg.validate().expect_err("must reject");
        assert!(err.contains("found in grader"));
        assert!(err.contains("Intro.txt"));
    }
}
