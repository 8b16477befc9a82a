//! Contrato de los steps.
//!
//! Un step es una unidad de calificación sin estado, identificada por un
//! nombre único, con configuración tipada y resultado booleano. Este módulo
//! define:
//! - `StepConfig`: configuración tipada con esquema declarado de campos.
//! - `TypedStep`: interfaz de alto nivel con config concreta.
//! - `StepDefinition`: interfaz neutral usada por registry y resolver.
//! - `StepStatus`: máquina de estados observada por el executor.

pub mod definition;
pub mod status;
pub mod typed;

pub use definition::{RunnableStep, StepConfig, StepDefinition};
pub use status::StepStatus;
pub use typed::{StepAdapter, TypedStep};
