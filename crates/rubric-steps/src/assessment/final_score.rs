use std::collections::BTreeMap;

use rubric_core::report::weighted::{rescale_tests, scaled_total, sort_by_number, weight_allocations};
use rubric_core::report::{Results, TestResult};
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::{PieceResults, KEY_TEST_RESULTS};
use crate::gradescope::KEY_RESULTS;

/// Arma el score final a partir de los resultados por pieza.
///
/// Cada pieza aporta su fracción reponderada por `scoring`; la suma se
/// amplifica por `scale_factor` y se recorta a `max_points`. Las
/// penalizaciones por step fallido se restan después del recorte y
/// aparecen en el reporte como tests negativos.
#[derive(Debug, Clone)]
pub struct FinalScore;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalScoreConfig {
    pub max_points: f64,
    /// Peso relativo de cada pieza. Piezas sin peso no aportan.
    pub scoring: BTreeMap<String, f64>,
    #[serde(default = "default_scale")]
    pub scale_factor: f64,
    /// Nombre de step a fracción del total descontada si ese step falló.
    #[serde(default)]
    pub penalties: BTreeMap<String, f64>,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl StepConfig for FinalScoreConfig {
    fn fields() -> &'static [&'static str] {
        &["max_points", "scoring", "scale_factor", "penalties", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }
}

impl TypedStep for FinalScore {
    type Config = FinalScoreConfig;

    fn name(&self) -> &'static str {
        "assessment.final_score"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "Final Score".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let mut results: Results = session.fetch(KEY_RESULTS)?;
        let test_results: BTreeMap<String, PieceResults> =
            session.fetch_opt(KEY_TEST_RESULTS)?.unwrap_or_default();

        let subscores: BTreeMap<String, f64> = test_results
            .iter()
            .map(|(piece, res)| {
                let fraction = if res.max_score > 0.0 { res.score / res.max_score } else { 0.0 };
                (piece.clone(), fraction)
            })
            .collect();
        let allocations = weight_allocations(&subscores, &config.scoring, config.max_points);

        if config.scale_factor > 1.0 {
            session.student().info(format!(
                "Your final score was multiplied by {:.2} since this assignment doesn't require\n\
                 total perfection for full credit. Your score may not exceed the max.",
                config.scale_factor
            ));
        }

        let total_score = scaled_total(&allocations, config.scale_factor, config.max_points);

        let mut total_penalty = 0.0;
        for step_log in session.step_logs.iter_mut() {
            if step_log.success {
                continue;
            }
            if let Some(fraction) = config.penalties.get(&step_log.name) {
                let penalty = fraction * total_score;
                step_log.score = Some(-penalty);
                total_penalty += penalty;
            }
        }

        let final_score = total_score - total_penalty;
        session.private().info(format!(
            "Final score post-scaling: {final_score:.3} / {:.3}",
            config.max_points
        ));
        results.score = Some(final_score);

        let mut rescaled: Vec<TestResult> = Vec::new();
        for (piece, mut piece_results) in test_results {
            let ratio = match allocations.get(&piece) {
                Some(alloc) if piece_results.max_score > 0.0 => {
                    alloc.max_score / piece_results.max_score
                }
                _ => 0.0,
            };
            rescale_tests(&mut piece_results.tests, ratio);
            rescaled.extend(piece_results.tests);
        }
        sort_by_number(&mut rescaled);
        results.tests.extend(rescaled);

        session.put(KEY_RESULTS, &results)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rubric_core::report::TestStatus;
    use rubric_core::{Level, StepLog};

    fn piece(score: f64, max_score: f64, tests: &[(&str, &str, f64, f64)]) -> PieceResults {
        PieceResults {
            score,
            max_score,
            tests: tests
                .iter()
                .map(|(name, number, score, max)| TestResult {
                    name: Some(name.to_string()),
                    number: Some(number.to_string()),
                    score: Some(*score),
                    max_score: Some(*max),
                    status: Some(TestStatus::Passed),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn seeded_session(pieces: BTreeMap<String, PieceResults>) -> Session {
        let mut session = Session::standard(false, Level::Critical);
        session.put(KEY_RESULTS, &Results::default()).expect("results");
        session.put(KEY_TEST_RESULTS, &pieces).expect("pieces");
        session
    }

    fn config(max_points: f64, scale: f64) -> FinalScoreConfig {
        FinalScoreConfig {
            max_points,
            scoring: [("a".to_string(), 3.0), ("b".to_string(), 1.0)].into_iter().collect(),
            scale_factor: scale,
            penalties: BTreeMap::new(),
            halt_on_fail: false,
        }
    }

    #[test]
    fn weights_scale_and_clamp_compose() {
        // a: 50/100 con peso 3, b: 100/100 con peso 1, sobre 100 puntos:
        // 0.5*75 + 1.0*25 = 62.5, luego x1.2 = 75.0
        let pieces = [
            ("a".to_string(), piece(50.0, 100.0, &[("t1", "1.1", 50.0, 100.0)])),
            ("b".to_string(), piece(100.0, 100.0, &[("t2", "2.1", 100.0, 100.0)])),
        ]
        .into_iter()
        .collect();
        let mut session = seeded_session(pieces);
        assert!(FinalScore.run(&mut session, &config(100.0, 1.2)).expect("run"));

        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert_eq!(results.score, Some(75.0));
        // Los tests vuelven reescalados a su asignación y ordenados por número.
        assert_eq!(results.tests[0].number.as_deref(), Some("1.1"));
        assert_eq!(results.tests[0].max_score, Some(75.0));
        assert_eq!(results.tests[0].score, Some(37.5));
        assert_eq!(results.tests[1].max_score, Some(25.0));
    }

    #[test]
    fn scaled_total_never_exceeds_max_points() {
        let pieces = [
            ("a".to_string(), piece(100.0, 100.0, &[])),
            ("b".to_string(), piece(100.0, 100.0, &[])),
        ]
        .into_iter()
        .collect();
        let mut session = seeded_session(pieces);
        assert!(FinalScore.run(&mut session, &config(100.0, 2.0)).expect("run"));
        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert_eq!(results.score, Some(100.0));
    }

    #[test]
    fn failed_step_penalties_come_off_after_the_clamp() {
        let pieces = [("a".to_string(), piece(100.0, 100.0, &[]))].into_iter().collect();
        let mut session = seeded_session(pieces);

        let mut failed = StepLog::new("style.check", "Style Check");
        failed.success = false;
        session.step_logs.push(failed);

        let mut cfg = config(100.0, 1.0);
        cfg.scoring = [("a".to_string(), 1.0)].into_iter().collect();
        cfg.penalties = [("style.check".to_string(), 0.1)].into_iter().collect();
        assert!(FinalScore.run(&mut session, &cfg).expect("run"));

        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert_eq!(results.score, Some(90.0));
        assert_eq!(session.step_logs[0].score, Some(-10.0));
    }

    #[test]
    fn succeeding_steps_are_not_penalized() {
        let pieces = [("a".to_string(), piece(100.0, 100.0, &[]))].into_iter().collect();
        let mut session = seeded_session(pieces);

        let mut passed = StepLog::new("style.check", "Style Check");
        passed.success = true;
        session.step_logs.push(passed);

        let mut cfg = config(100.0, 1.0);
        cfg.scoring = [("a".to_string(), 1.0)].into_iter().collect();
        cfg.penalties = [("style.check".to_string(), 0.1)].into_iter().collect();
        assert!(FinalScore.run(&mut session, &cfg).expect("run"));

        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert_eq!(results.score, Some(100.0));
        assert_eq!(session.step_logs[0].score, Some(0.0));
    }

    #[test]
    fn missing_piece_results_still_produce_a_score() {
        let mut session = Session::standard(false, Level::Critical);
        session.put(KEY_RESULTS, &Results::default()).expect("results");
        assert!(FinalScore.run(&mut session, &config(100.0, 1.0)).expect("run"));
        let results: Results = session.fetch(KEY_RESULTS).expect("results");
        assert_eq!(results.score, Some(0.0));
    }
}
