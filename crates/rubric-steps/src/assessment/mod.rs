//! Steps de evaluación por piezas: una entrega se divide en piezas con
//! archivos del alumno y archivos del grader, cada una con su sub-score,
//! y el puntaje final se arma reponderando esas piezas.

mod check_files;
mod final_score;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use rubric_core::report::TestResult;
use serde::{Deserialize, Serialize};

pub use check_files::{CheckFiles, CheckFilesConfig};
pub use final_score::{FinalScore, FinalScoreConfig};

/// Clave de sesión: particionado de piezas vivas y caídas.
pub const KEY_PIECES: &str = "assessment_pieces";
/// Clave de sesión: resultados crudos por pieza, a reponderar al final.
pub const KEY_TEST_RESULTS: &str = "assessment_test_results";

/// Una pieza evaluable: qué archivos aporta el alumno y cuáles el grader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    pub student_files: BTreeSet<PathBuf>,
    pub assessment_files: BTreeSet<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedPiece {
    pub reason: String,
}

/// Particionado que `check_files` deja en la sesión para los steps que
/// evalúan: sólo las piezas vivas se corren.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentPieces {
    #[serde(default)]
    pub live_pieces: BTreeMap<String, Piece>,
    #[serde(default)]
    pub failed_pieces: BTreeMap<String, FailedPiece>,
}

/// Resultados crudos de una pieza, en la escala propia del evaluador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceResults {
    pub score: f64,
    pub max_score: f64,
    pub tests: Vec<TestResult>,
}
