//! Políticas numéricas y temporales consumidas por steps concretos.
//!
//! Son funciones puras sobre tipos serde: deterministas, sin IO, testeables
//! aisladas del pipeline.

pub mod lateness;
pub mod velocity;

pub use lateness::{apply_decay, decay_penalty, graced_lateness, lateness_seconds};
pub use velocity::{account, extended_windows, validate_windows, PriorSubmission, TokenAccounting, Window};
