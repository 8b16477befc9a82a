//! rubric-core: núcleo del pipeline de calificación.
//!
//! Motor secuencial que corre una lista ordenada de steps de calificación
//! sobre una entrega, con configuración en capas, logging de doble audiencia
//! (estudiante / operador) y agregación de puntajes hacia un reporte JSON.

pub mod config;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod plan;
pub mod policy;
pub mod registry;
pub mod report;
pub mod session;
pub mod step;

pub use config::{load_global_config, load_run_config, resolve_plan, GlobalConfig, PlanEntrySpec, RunConfigFile};
pub use engine::Engine;
pub use errors::{ConfigError, StepError};
pub use executor::{Executor, PlanOutcome, PlanReport, RunReport};
pub use logging::{Level, LogChannel, LogSink, StepLog, Visibility};
pub use plan::{Plan, PlanEntry};
pub use registry::StepRegistry;
pub use report::{LeaderboardEntry, Results, TestResult, TestStatus, TestVisibility};
pub use session::{LogHandle, Session};
pub use step::{RunnableStep, StepAdapter, StepConfig, StepDefinition, StepStatus, TypedStep};
