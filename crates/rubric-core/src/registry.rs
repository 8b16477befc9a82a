//! Registry de definiciones de step, indexado por nombre.

use indexmap::IndexMap;

use crate::errors::ConfigError;
use crate::step::StepDefinition;

/// Mapa nombre -> definición. Los built-ins se registran siempre; las
/// definiciones externas se agregan después. Registrar dos veces el mismo
/// nombre no es un error: la última gana (mecanismo deliberado de override).
pub struct StepRegistry {
    defs: IndexMap<&'static str, Box<dyn StepDefinition>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self { defs: IndexMap::new() }
    }

    pub fn register(&mut self, defs: Vec<Box<dyn StepDefinition>>) {
        for def in defs {
            // IndexMap::insert reemplaza el valor conservando la posición.
            self.defs.insert(def.name(), def);
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&dyn StepDefinition, ConfigError> {
        self.defs
            .get(name)
            .map(|d| d.as_ref())
            .ok_or_else(|| ConfigError::UnknownStep {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Nombres registrados en orden de registro.
    pub fn names(&self) -> Vec<String> {
        self.defs.keys().map(|k| k.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}
