//! Limitación de velocidad por tokens sobre ventanas temporales.
//!
//! Cada reenvío consume un token contra la ventana activa: la última (por
//! tiempo de inicio) cuyo `start_time` precede al envío actual. Antes de
//! cualquier ventana configurada existe una implícita desde el epoch con
//! capacidad 1 y recarga cero. Un envío previo ocupa token si su score supera
//! el umbral ignorable, ocurrió después del inicio de la ventana activa y su
//! edad relativa al envío actual cae en `[0, recharge_time)`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Window {
    /// Las extensiones mueven la fecha límite, así que las ventanas usan
    /// tiempo absoluto, no offsets contra el due date.
    #[serde(default = "epoch")]
    pub start_time: DateTime<Utc>,
    pub max_tokens: u32,
    /// Segundos hasta que un token consumido vuelve a estar disponible.
    pub recharge_time: i64,
    #[serde(default = "default_true")]
    pub reset_tokens: bool,
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

fn default_true() -> bool {
    true
}

/// Ventana implícita previa a todas: un envío disponible, sin recarga.
fn implicit_window() -> Window {
    Window {
        start_time: epoch(),
        max_tokens: 1,
        recharge_time: 0,
        reset_tokens: true,
    }
}

/// Los inicios de ventana deben ser estrictamente crecientes.
pub fn validate_windows(windows: &[Window]) -> Result<(), String> {
    for pair in windows.windows(2) {
        if pair[1].start_time <= pair[0].start_time {
            return Err("window start times not strictly increasing".to_string());
        }
    }
    Ok(())
}

/// Un envío previo relevante: (momento, score).
pub type PriorSubmission = (DateTime<Utc>, f64);

/// Resultado del conteo de tokens para el envío actual.
#[derive(Debug, Clone)]
pub struct TokenAccounting {
    /// Índice de la ventana activa dentro de la lista extendida (0 es la
    /// implícita).
    pub active_index: usize,
    /// Puede ser negativo: el envío actual ya está contado.
    pub tokens_available: i64,
    /// Momentos que ocupan token, en orden de entrada, incluyendo el actual.
    pub occupying: Vec<DateTime<Utc>>,
    /// Primer momento en que un token se libera.
    pub recharge_at: DateTime<Utc>,
}

/// Lista extendida: la ventana implícita seguida de las configuradas.
pub fn extended_windows(configured: &[Window]) -> Vec<Window> {
    let mut all = Vec::with_capacity(configured.len() + 1);
    all.push(implicit_window());
    all.extend(configured.iter().cloned());
    all
}

/// Cuenta tokens para el envío en `now` contra `windows` (lista extendida).
pub fn account(
    windows: &[Window],
    now: DateTime<Utc>,
    prior: &[PriorSubmission],
    ignore_scores_below: f64,
    extra_tokens: i64,
) -> TokenAccounting {
    let (active_index, active) = windows
        .iter()
        .enumerate()
        .filter(|(_, w)| w.start_time < now)
        .last()
        .unwrap_or((0, &windows[0]));
    let recharge = Duration::seconds(active.recharge_time);

    let mut occupying: Vec<DateTime<Utc>> = prior
        .iter()
        .filter(|(time, score)| {
            let age = now - *time;
            *score > ignore_scores_below
                && *time > active.start_time
                && age >= Duration::zero()
                && age < recharge
        })
        .map(|(time, _)| *time)
        .collect();
    occupying.push(now);

    let tokens_available = active.max_tokens as i64 + extra_tokens - occupying.len() as i64;
    let recharge_at = occupying[0] + recharge;

    TokenAccounting {
        active_index,
        tokens_available,
        occupying,
        recharge_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hours: i64) -> DateTime<Utc> {
        epoch() + Duration::hours(hours + 1)
    }

    fn window(start_hours: i64, max_tokens: u32, recharge_secs: i64) -> Window {
        Window {
            start_time: at(start_hours),
            max_tokens,
            recharge_time: recharge_secs,
            reset_tokens: true,
        }
    }

    #[test]
    fn start_times_must_strictly_increase() {
        assert!(validate_windows(&[window(0, 2, 3600), window(5, 3, 3600)]).is_ok());
        assert!(validate_windows(&[window(5, 2, 3600), window(5, 3, 3600)]).is_err());
        assert!(validate_windows(&[window(5, 2, 3600), window(1, 3, 3600)]).is_err());
        assert!(validate_windows(&[]).is_ok());
    }

    #[test]
    fn three_submissions_against_two_tokens_go_negative() {
        // ventana única: max_tokens=2, recarga 86400s; dos envíos previos
        // calificables dentro de la recarga + el actual = 3 ocupantes
        let windows = extended_windows(&[window(0, 2, 86_400)]);
        let now = at(30);
        let prior = vec![(at(10), 50.0), (at(20), 60.0)];
        let acct = account(&windows, now, &prior, 0.0, 0);
        assert_eq!(acct.active_index, 1);
        assert_eq!(acct.occupying.len(), 3);
        assert_eq!(acct.tokens_available, -1);
        assert_eq!(acct.recharge_at, at(10) + Duration::seconds(86_400));
    }

    #[test]
    fn low_scores_do_not_occupy_tokens() {
        let windows = extended_windows(&[window(0, 2, 86_400)]);
        let now = at(30);
        let prior = vec![(at(10), 0.0), (at(20), 60.0)];
        let acct = account(&windows, now, &prior, 0.0, 0);
        assert_eq!(acct.occupying.len(), 2);
        assert_eq!(acct.tokens_available, 0);
    }

    #[test]
    fn submissions_older_than_the_recharge_time_do_not_count() {
        let windows = extended_windows(&[window(0, 2, 3600)]);
        let now = at(30);
        let prior = vec![(at(10), 50.0), (now - Duration::minutes(30), 60.0)];
        let acct = account(&windows, now, &prior, 0.0, 0);
        assert_eq!(acct.occupying.len(), 2, "only the recent one plus the current");
        assert_eq!(acct.tokens_available, 0);
    }

    #[test]
    fn extra_tokens_extend_the_budget() {
        let windows = extended_windows(&[window(0, 1, 86_400)]);
        let now = at(30);
        let prior = vec![(at(20), 60.0)];
        let without = account(&windows, now, &prior, 0.0, 0);
        assert_eq!(without.tokens_available, -1);
        let with = account(&windows, now, &prior, 0.0, 2);
        assert_eq!(with.tokens_available, 1);
    }

    #[test]
    fn active_window_is_the_last_one_started() {
        let windows = extended_windows(&[window(0, 2, 3600), window(10, 5, 7200)]);
        let acct = account(&windows, at(15), &[], 0.0, 0);
        assert_eq!(acct.active_index, 2);
        let acct = account(&windows, at(5), &[], 0.0, 0);
        assert_eq!(acct.active_index, 1);
    }

    #[test]
    fn before_any_configured_window_the_implicit_one_applies() {
        let windows = extended_windows(&[window(48, 4, 3600)]);
        let acct = account(&windows, at(1), &[], 0.0, 0);
        assert_eq!(acct.active_index, 0);
        // capacidad 1, el envío actual la consume entera
        assert_eq!(acct.tokens_available, 0);
    }

    #[test]
    fn submissions_before_the_active_window_start_are_ignored() {
        let windows = extended_windows(&[window(10, 2, 86_400)]);
        let now = at(20);
        let prior = vec![(at(5), 90.0), (at(15), 90.0)];
        let acct = account(&windows, now, &prior, 0.0, 0);
        assert_eq!(acct.occupying.len(), 2, "pre-window submission does not occupy");
    }
}
