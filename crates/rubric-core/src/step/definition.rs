//! Interfaz neutral de step usada por el registry y el resolver.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{ConfigError, StepError};
use crate::plan::PlanEntry;
use crate::session::Session;

/// Configuración tipada de un step.
///
/// `fields()` es el esquema explícito que el resolver consulta para decidir
/// si un parámetro compartido aplica a este step. Toda config incluye
/// `halt_on_fail` (default false).
pub trait StepConfig: DeserializeOwned + Serialize {
    /// Nombres de campo declarados, incluyendo `halt_on_fail`.
    fn fields() -> &'static [&'static str];

    fn halt_on_fail(&self) -> bool;

    /// Validación entre campos, posterior a la deserialización.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Definición registrable: valida un config resuelto y lo ata a su step.
pub trait StepDefinition: Send + Sync {
    /// Nombre único y estable dentro del registry.
    fn name(&self) -> &'static str;

    /// Esquema de campos del config de este step.
    fn fields(&self) -> &'static [&'static str];

    /// Deserializa y valida `resolved`, produciendo la entrada de plan.
    fn prepare(&self, resolved: Value) -> Result<PlanEntry, ConfigError>;
}

impl std::fmt::Debug for dyn StepDefinition + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Step ya atado a su config, listo para ejecutar. Inmutable.
pub trait RunnableStep: Send + Sync {
    fn run(&self, session: &mut Session) -> Result<bool, StepError>;
}
