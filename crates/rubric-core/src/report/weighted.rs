//! Reescalado ponderado de sub-scores.
//!
//! Cada pieza aporta `fracción × (peso / peso_total) × max_points`; la suma
//! se amplifica por un factor opcional y se recorta a `max_points`. Las
//! penalizaciones con nombre se restan después del recorte, nunca antes.

use std::collections::BTreeMap;

use super::TestResult;

/// Par (score, max_score) de una pieza ya ponderada.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceScore {
    pub score: f64,
    pub max_score: f64,
}

/// Distribuye `max_points` entre piezas según sus pesos.
///
/// `subscores` trae la fracción cruda `score/max_score` de cada pieza; las
/// piezas sin peso declarado reciben asignación cero.
pub fn weight_allocations(
    subscores: &BTreeMap<String, f64>,
    scoring: &BTreeMap<String, f64>,
    max_points: f64,
) -> BTreeMap<String, PieceScore> {
    let total_weight: f64 = scoring.values().sum();
    subscores
        .iter()
        .map(|(piece, fraction)| {
            let weight = scoring.get(piece).copied().unwrap_or(0.0);
            let max_subscore = if total_weight > 0.0 {
                weight / total_weight * max_points
            } else {
                0.0
            };
            (piece.clone(), PieceScore { score: fraction * max_subscore, max_score: max_subscore })
        })
        .collect()
}

/// Suma ponderada, amplificada y recortada a `max_points`.
pub fn scaled_total(allocations: &BTreeMap<String, PieceScore>, scale_factor: f64, max_points: f64) -> f64 {
    let total: f64 = allocations.values().map(|s| s.score).sum();
    (total * scale_factor).min(max_points)
}

/// Reescala los tests de una pieza por la razón asignación final / máximo
/// original. Scores ausentes o nulos quedan en 0.
pub fn rescale_tests(tests: &mut [TestResult], ratio: f64) {
    for test in tests.iter_mut() {
        test.score = Some(match test.score {
            Some(s) if s != 0.0 => ratio * s,
            _ => 0.0,
        });
        test.max_score = Some(match test.max_score {
            Some(m) if m != 0.0 => ratio * m,
            _ => 0.0,
        });
    }
}

/// Orden estable por clave `number`, cayendo a `_nombre` cuando falta.
pub fn sort_by_number(tests: &mut [TestResult]) {
    tests.sort_by_key(|t| {
        t.number
            .clone()
            .unwrap_or_else(|| format!("_{}", t.name.clone().unwrap_or_default()))
    });
}
