//! Modelo del reporte final y su agregación.
//!
//! El formato de salida es el JSON de resultados del autograder: un score
//! global, una lista ordenada de tests y entradas opcionales de leaderboard.
//! Las reglas de agregación viven acá para que el step que escribe el archivo
//! quede como una cáscara de IO.

pub mod weighted;

use serde::{Deserialize, Serialize};

use crate::logging::StepLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestVisibility {
    Hidden,
    AfterDueDate,
    AfterPublished,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<LeaderboardOrder>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<TestVisibility>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Results {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<TestVisibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_visibility: Option<TestVisibility>,
    pub tests: Vec<TestResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl Results {
    /// Un reporte es válido si trae score global, o si todos los tests (al
    /// menos uno) traen el suyo. Política ante inválido: degradar con score 0
    /// y warning privado, nunca fallar (decisión documentada en DESIGN.md).
    pub fn score_is_valid(&self) -> bool {
        self.score.is_some() || (!self.tests.is_empty() && self.tests.iter().all(|t| t.score.is_some()))
    }
}

/// Redondeo a `digits` decimales. Se aplica inmediatamente antes de
/// serializar, nunca antes de la aritmética interna.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Pliega los `StepLog` con salida no vacía en tests sintéticos. El llamador
/// los antepone a los tests reales.
pub fn fold_step_logs(step_logs: &[StepLog], digits: i32) -> Vec<TestResult> {
    step_logs
        .iter()
        .filter(|log| !log.log_chunks.is_empty())
        .map(|log| TestResult {
            name: Some(log.display_name.clone()),
            output: Some(log.log_chunks.concat().trim().to_string()),
            score: log.score.map(|s| round_to(s, digits)),
            // max 0 si hay score no nulo: las penalizaciones aparecen como
            // "-x / 0" en el reporte
            max_score: match log.score {
                Some(s) if s != 0.0 => Some(0.0),
                _ => None,
            },
            status: Some(if log.success { TestStatus::Passed } else { TestStatus::Failed }),
            ..Default::default()
        })
        .collect()
}
