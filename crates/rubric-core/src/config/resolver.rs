//! Resolución determinista de planes.
//!
//! Precedencia por entrada, de mayor a menor:
//! 1. override local de la entrada del plan
//! 2. `global_settings[nombre_del_step]`
//! 3. `shared_parameters`, solo si la clave es un campo declarado del config
//!    del step y ninguna capa superior ya la aporta
//!
//! Campos ausentes de las tres capas caen a los defaults del tipo de config;
//! un campo requerido sin default es un fallo de validación. Resolver dos
//! veces la misma entrada produce JSON resuelto byte-idéntico.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{GlobalConfig, PlanEntrySpec, RunConfigFile};
use crate::errors::ConfigError;
use crate::plan::{Plan, PlanEntry};
use crate::registry::StepRegistry;

pub fn resolve_plan(
    registry: &StepRegistry,
    run: &RunConfigFile,
    global: &GlobalConfig,
) -> Result<Plan, ConfigError> {
    // Los shared de la corrida pisan los globales, clave por clave.
    let mut shared = global.shared_parameters.clone();
    for (k, v) in run.shared_parameters.iter() {
        shared.insert(k.clone(), v.clone());
    }

    let execution = resolve_entries(registry, &run.execution_plan, &shared, &global.global_settings)?;
    let teardown = resolve_entries(registry, &run.teardown_plan, &shared, &global.global_settings)?;
    Ok(Plan { execution, teardown })
}

fn resolve_entries(
    registry: &StepRegistry,
    specs: &[PlanEntrySpec],
    shared: &Map<String, Value>,
    settings: &HashMap<String, Map<String, Value>>,
) -> Result<Vec<PlanEntry>, ConfigError> {
    let mut entries = Vec::with_capacity(specs.len());
    for spec in specs {
        let (name, overrides) = split_spec(spec)?;

        let def = registry.lookup(&name)?;

        let mut merged = settings.get(&name).cloned().unwrap_or_default();
        for (k, v) in overrides {
            merged.insert(k, v);
        }
        for (k, v) in shared.iter() {
            if def.fields().contains(&k.as_str()) && !merged.contains_key(k) {
                merged.insert(k.clone(), v.clone());
            }
        }

        entries.push(def.prepare(Value::Object(merged))?);
    }
    Ok(entries)
}

/// Separa una entrada cruda en (nombre, overrides locales).
fn split_spec(spec: &PlanEntrySpec) -> Result<(String, Map<String, Value>), ConfigError> {
    match spec {
        PlanEntrySpec::Name(name) => Ok((name.clone(), Map::new())),
        PlanEntrySpec::WithOverrides(mapping) => {
            if mapping.len() != 1 {
                return Err(malformed(spec));
            }
            let (name, overrides) = mapping
                .iter()
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
                .ok_or_else(|| malformed(spec))?;
            match overrides {
                Value::Object(map) => Ok((name, map)),
                // `- nombre:` sin campos en YAML llega como null.
                Value::Null => Ok((name, Map::new())),
                _ => Err(malformed(spec)),
            }
        }
    }
}

fn malformed(spec: &PlanEntrySpec) -> ConfigError {
    let entry = match spec {
        PlanEntrySpec::Name(n) => n.clone(),
        PlanEntrySpec::WithOverrides(m) => serde_json::to_string(m).unwrap_or_else(|_| "<unprintable>".to_string()),
    };
    ConfigError::MalformedPlanEntry { entry }
}
