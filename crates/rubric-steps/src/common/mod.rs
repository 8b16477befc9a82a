//! Steps genéricos, independientes de la plataforma de entrega.

mod display_message;
mod run_command;

pub use display_message::{DisplayMessage, DisplayMessageConfig};
pub use run_command::{RunCommand, RunCommandConfig};
