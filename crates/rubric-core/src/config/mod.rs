//! Configuración en capas.
//!
//! Dos archivos YAML: el de la corrida (`shared_parameters` + planes) y el
//! global opcional (`shared_parameters` + `global_settings` por step). El
//! resolver (`resolver.rs`) los fusiona en un `Plan` validado.

pub mod resolver;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ConfigError;

pub use resolver::resolve_plan;

/// Entrada cruda de un plan: un nombre pelado o un mapping de una sola clave
/// `{nombre: {campo: valor}}`. Cualquier otra forma es fatal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlanEntrySpec {
    Name(String),
    WithOverrides(Map<String, Value>),
}

/// Archivo de configuración de la corrida.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfigFile {
    #[serde(default)]
    pub shared_parameters: Map<String, Value>,
    #[serde(default)]
    pub execution_plan: Vec<PlanEntrySpec>,
    #[serde(default)]
    pub teardown_plan: Vec<PlanEntrySpec>,
}

/// Archivo de configuración global (opcional).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default)]
    pub shared_parameters: Map<String, Value>,
    /// Overrides por nombre de step, debajo de los locales en precedencia.
    #[serde(default)]
    pub global_settings: HashMap<String, Map<String, Value>>,
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_run_config(path: &Path) -> Result<RunConfigFile, ConfigError> {
    read_yaml(path)
}

/// Global ausente equivale a un global vacío.
pub fn load_global_config(path: Option<&Path>) -> Result<GlobalConfig, ConfigError> {
    match path {
        Some(p) => read_yaml(p),
        None => Ok(GlobalConfig::default()),
    }
}
