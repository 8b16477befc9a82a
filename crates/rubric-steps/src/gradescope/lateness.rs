use std::collections::BTreeMap;

use rubric_core::policy::{apply_decay, decay_penalty, graced_lateness};
use rubric_core::report::Results;
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::types::{SubmissionMetadata, KEY_RESULTS, KEY_SUBMISSION_METADATA};

/// Evalúa el atraso de la entrega contra su fecha efectiva.
///
/// Dos modos excluyentes: con `halt_on_fail` el step rechaza entregas
/// tardías; con `score_decay` las acepta aplicando la penalización del
/// umbral alcanzado sobre el score ya acumulado.
#[derive(Debug, Clone)]
pub struct Lateness;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatenessConfig {
    /// Segundos de gracia descontados antes de cualquier penalización.
    #[serde(default)]
    pub grace_period: u64,
    /// Umbral de atraso (segundos, ya descontada la gracia) a fracción
    /// penalizada. Aplica el mayor umbral alcanzado.
    #[serde(default)]
    pub score_decay: BTreeMap<u64, f64>,
    #[serde(default)]
    pub min_lateness_score: f64,
    #[serde(default)]
    pub halt_on_fail: bool,
}

impl StepConfig for LatenessConfig {
    fn fields() -> &'static [&'static str] {
        &["grace_period", "score_decay", "min_lateness_score", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }

    fn validate(&self) -> Result<(), String> {
        if self.halt_on_fail && !self.score_decay.is_empty() {
            return Err("`halt_on_fail` and `score_decay` cannot both be set".to_string());
        }
        Ok(())
    }
}

impl TypedStep for Lateness {
    type Config = LatenessConfig;

    fn name(&self) -> &'static str {
        "gradescope.lateness"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "Lateness".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let metadata: SubmissionMetadata = session.fetch(KEY_SUBMISSION_METADATA)?;
        let mut results: Results = session.fetch(KEY_RESULTS)?;

        let lateness = metadata.lateness_seconds();
        let graced = graced_lateness(lateness, config.grace_period as i64);

        session
            .private()
            .debug(format!("Original due date: {}", metadata.assignment.due_date));
        session
            .private()
            .debug(format!("Due for student:   {}", metadata.effective_due_date()));
        session.private().debug(format!("Submitted: {}", metadata.created_at));

        if lateness == 0 {
            return Ok(true);
        }

        session
            .both()
            .info(format!("Your submission is {:.2} hours late.", lateness as f64 / 3600.0));
        if graced == 0 {
            session
                .both()
                .info("This is within the grace period for late submissions on this assignment.");
            return Ok(true);
        }

        if config.halt_on_fail {
            session
                .student()
                .info("The autograder for this assignment will not run on a late submission.");
            return Ok(false);
        }

        let penalty = decay_penalty(&config.score_decay, graced);

        match results.score {
            Some(score) => {
                session
                    .both()
                    .info(format!("Your score on this assignment was {score:.3}."));
                if score > 0.0 {
                    let decayed = apply_decay(score, penalty, config.min_lateness_score);
                    results.score = Some(decayed);
                    session.both().info(format!(
                        "After applying a lateness penalty of {:.2}%, your final score is {:.3}.",
                        penalty * 100.0,
                        decayed
                    ));
                } else {
                    session.both().info("Scores of 0 do not have lateness applied.");
                }
            }
            None => {
                session
                    .private()
                    .error("Cannot apply a lateness penalty without an overall score.");
            }
        }

        session.put(KEY_RESULTS, &results)?;
        Ok(false)
    }
}
