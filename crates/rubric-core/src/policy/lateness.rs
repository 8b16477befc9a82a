//! Decaimiento por entrega tardía.
//!
//! La tardanza se mide en segundos contra la fecha límite efectiva; el
//! período de gracia se descuenta antes de buscar la penalización. La tabla
//! `score_decay` es una función escalonada: gana el umbral más grande que no
//! excede la tardanza con gracia. Un score de exactamente cero nunca decae.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Segundos de tardanza cruda; nunca negativo.
pub fn lateness_seconds(created_at: DateTime<Utc>, due_date: DateTime<Utc>) -> i64 {
    (created_at - due_date).num_seconds().max(0)
}

/// Tardanza restante después del período de gracia.
pub fn graced_lateness(lateness: i64, grace_period: i64) -> i64 {
    (lateness - grace_period).max(0)
}

/// Fracción de penalización para la tardanza dada: el valor en el umbral más
/// grande `<= lateness`. Por debajo de todo umbral la penalización es total
/// (1.0): una tabla vacía equivale a perder el puntaje.
pub fn decay_penalty(score_decay: &BTreeMap<u64, f64>, graced: i64) -> f64 {
    let mut penalty = 1.0;
    for (threshold, fraction) in score_decay.iter() {
        if graced >= *threshold as i64 {
            penalty = *fraction;
        }
    }
    penalty
}

/// Aplica la penalización con piso configurable. Los scores no positivos se
/// devuelven intactos.
pub fn apply_decay(score: f64, penalty: f64, min_score: f64) -> f64 {
    if score <= 0.0 {
        score
    } else {
        (score * (1.0 - penalty)).max(min_score)
    }
}
