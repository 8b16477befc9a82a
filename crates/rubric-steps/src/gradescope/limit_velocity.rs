use rubric_core::policy::{account, extended_windows, validate_windows, PriorSubmission, Window};
use rubric_core::{Session, StepConfig, StepError, TypedStep};
use serde::{Deserialize, Serialize};

use super::types::{SubmissionMetadata, KEY_EXTRA_TOKENS, KEY_SUBMISSION_METADATA};

/// Limita la frecuencia de reenvíos con un sistema de tokens por ventana.
///
/// Falla cuando el envío actual deja el saldo en negativo; con
/// `halt_on_fail` eso corta la corrida completa. Todos los horarios se
/// muestran en UTC.
#[derive(Debug, Clone)]
pub struct LimitVelocity;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitVelocityConfig {
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Envíos con score igual o menor no consumen token.
    #[serde(default)]
    pub ignore_scores_below: f64,
    pub windows: Vec<Window>,
    #[serde(default)]
    pub halt_on_fail: bool,
}

fn default_time_format() -> String {
    "%a %B %d %Y, %H:%M:%S %Z".to_string()
}

impl StepConfig for LimitVelocityConfig {
    fn fields() -> &'static [&'static str] {
        &["time_format", "ignore_scores_below", "windows", "halt_on_fail"]
    }

    fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }

    fn validate(&self) -> Result<(), String> {
        validate_windows(&self.windows)
    }
}

impl TypedStep for LimitVelocity {
    type Config = LimitVelocityConfig;

    fn name(&self) -> &'static str {
        "gradescope.limit_velocity"
    }

    fn display_name(&self, _config: &Self::Config) -> String {
        "Limit Velocity".to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
        let metadata: SubmissionMetadata = session.fetch(KEY_SUBMISSION_METADATA)?;
        let prior: Vec<PriorSubmission> = metadata
            .previous_submissions
            .iter()
            .map(|sub| (sub.submission_time, sub.score.unwrap_or(0.0)))
            .collect();
        let extra_tokens: i64 = session.fetch_opt(KEY_EXTRA_TOKENS)?.unwrap_or(0);
        session.private().trace(format!("Extra tokens: {extra_tokens}"));

        let windows = extended_windows(&config.windows);
        let accounting = account(
            &windows,
            metadata.created_at,
            &prior,
            config.ignore_scores_below,
            extra_tokens,
        );
        let active = &windows[accounting.active_index];

        session.student().info(
            "This assignment uses velocity limiting based on a token system. Tokens are assignment-specific.",
        );
        session.student().info(format!(
            "The current limiting scheme for this assignment is a maximum of {}, each recharging after {} seconds.",
            active.max_tokens, active.recharge_time
        ));
        session.student().info("");

        let allowed = accounting.tokens_available >= 0;
        if allowed {
            session.student().info(format!(
                "After this submission, you will have {} tokens remaining.",
                accounting.tokens_available
            ));
        } else {
            session
                .student()
                .error("You are out of tokens, so the autograder will not run until your next recharge.");
            session.private().error("Velocity limited, stopping the run here.");
        }

        session.student().info("");
        session.student().info("Tokens are currently consumed by:");
        for (i, time) in accounting.occupying.iter().rev().enumerate() {
            let mut line = format!("* Submission at {}", time.format(&config.time_format));
            if i == 0 {
                line.push_str(" [current]");
            }
            session.student().info(line);
        }

        session.student().info("");
        session.student().info(format!(
            "Submissions with scores {} or lower do not consume tokens.",
            config.ignore_scores_below
        ));
        session.student().info(format!(
            "This assignment's tokens recharge every {} seconds.",
            active.recharge_time
        ));

        if let Some(next) = windows.get(accounting.active_index + 1) {
            session.student().info(format!(
                "At {}, the velocity limiting will change to a maximum of {}, each recharging after {} seconds.",
                next.start_time.format(&config.time_format),
                next.max_tokens,
                next.recharge_time
            ));
            if next.start_time < accounting.recharge_at && next.reset_tokens {
                session
                    .student()
                    .info("When the velocity limiting changes, your tokens will be completely refreshed.");
                return Ok(allowed);
            }
        }
        session.student().info(format!(
            "Your next recharge will occur at {}.",
            accounting.recharge_at.format(&config.time_format)
        ));

        Ok(allowed)
    }
}
