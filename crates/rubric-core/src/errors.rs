//! Errores del core.
//!
//! Dos familias separadas a propósito:
//! - `ConfigError`: fatal en tiempo de carga; aborta antes de ejecutar
//!   cualquier step.
//! - `StepError`: fallo inesperado dentro de `run` de un step. El executor lo
//!   captura en la frontera del plan (ver `executor`); indica un defecto del
//!   grader, no una calificación fallida.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("step `{entry}` not formatted properly (expected a bare name or a single-key mapping)")]
    MalformedPlanEntry { entry: String },
    #[error("step `{name}` not found; available steps: {available:?}")]
    UnknownStep { name: String, available: Vec<String> },
    #[error("invalid config for step `{step}`: {message}")]
    Validation { step: String, message: String },
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse `{path}`: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Error inesperado dentro de un step. Un `Ok(false)` es un fallo de
/// calificación normal; un `Err` es un defecto y detiene el plan actual.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing context entry `{key}` (did the producer step run?)")]
    MissingData { key: String },
    #[error("{0}")]
    Other(String),
}
