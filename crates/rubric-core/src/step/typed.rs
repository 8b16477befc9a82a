//! Interfaz de alto nivel para implementar steps con configuración tipada.
//!
//! Implementadores escriben `run` con su config concreta; `StepAdapter`
//! convierte eso a la interfaz neutral `StepDefinition` que consumen el
//! registry y el resolver.

use serde_json::Value;

use super::definition::{RunnableStep, StepConfig, StepDefinition};
use crate::errors::{ConfigError, StepError};
use crate::plan::PlanEntry;
use crate::session::Session;

/// Step con configuración tipada. Sin estado entre invocaciones; se registra
/// por valor (de ahí `Clone`).
pub trait TypedStep: Send + Sync + Clone + 'static {
    type Config: StepConfig + Send + Sync + 'static;

    /// Nombre único del step.
    fn name(&self) -> &'static str;

    /// Nombre visible en los logs de estudiante. Por defecto, el nombre.
    fn display_name(&self, _config: &Self::Config) -> String {
        self.name().to_string()
    }

    fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError>;
}

/// Adaptador de `TypedStep` a la interfaz neutral.
pub struct StepAdapter<T: TypedStep>(pub T);

impl<T: TypedStep> StepAdapter<T> {
    pub fn boxed(step: T) -> Box<dyn StepDefinition> {
        Box::new(StepAdapter(step))
    }
}

struct BoundStep<T: TypedStep> {
    step: T,
    config: T::Config,
}

impl<T: TypedStep> RunnableStep for BoundStep<T> {
    fn run(&self, session: &mut Session) -> Result<bool, StepError> {
        self.step.run(session, &self.config)
    }
}

impl<T: TypedStep> StepDefinition for StepAdapter<T> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn fields(&self) -> &'static [&'static str] {
        T::Config::fields()
    }

    fn prepare(&self, resolved: Value) -> Result<PlanEntry, ConfigError> {
        let config: T::Config = serde_json::from_value(resolved.clone()).map_err(|e| ConfigError::Validation {
            step: self.name().to_string(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| ConfigError::Validation {
            step: self.name().to_string(),
            message,
        })?;
        let display_name = self.0.display_name(&config);
        let halt_on_fail = config.halt_on_fail();
        Ok(PlanEntry::new(
            self.name(),
            display_name,
            halt_on_fail,
            resolved,
            Box::new(BoundStep { step: self.0.clone(), config }),
        ))
    }
}
