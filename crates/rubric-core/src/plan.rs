//! Plan resuelto: steps atados a su configuración, en orden de inserción.
//!
//! Un plan nunca se reordena ni deduplica; nombres repetidos dentro de un
//! plan son legales (dos entradas del mismo step con configs distintas).

use serde_json::{json, Value};

use crate::errors::StepError;
use crate::session::Session;
use crate::step::RunnableStep;

/// Una entrada del plan: step + config ya validados. Inmutable.
pub struct PlanEntry {
    name: String,
    display_name: String,
    halt_on_fail: bool,
    /// Config resuelto (post-merge, pre-defaults de tipo). Se conserva para
    /// el dry-run y para verificar resolución idempotente.
    resolved: Value,
    runner: Box<dyn RunnableStep>,
}

impl PlanEntry {
    pub(crate) fn new(
        name: &str,
        display_name: String,
        halt_on_fail: bool,
        resolved: Value,
        runner: Box<dyn RunnableStep>,
    ) -> Self {
        Self {
            name: name.to_string(),
            display_name,
            halt_on_fail,
            resolved,
            runner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn halt_on_fail(&self) -> bool {
        self.halt_on_fail
    }

    pub fn resolved_config(&self) -> &Value {
        &self.resolved
    }

    pub fn run(&self, session: &mut Session) -> Result<bool, StepError> {
        self.runner.run(session)
    }
}

impl std::fmt::Debug for PlanEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanEntry")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("halt_on_fail", &self.halt_on_fail)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// Dos secuencias por corrida: ejecución y teardown.
#[derive(Debug)]
pub struct Plan {
    pub execution: Vec<PlanEntry>,
    pub teardown: Vec<PlanEntry>,
}

impl Plan {
    /// Descripción JSON del plan (para `--dry-run`).
    pub fn describe(&self) -> Value {
        fn entries(plan: &[PlanEntry]) -> Value {
            Value::Array(
                plan.iter()
                    .map(|e| {
                        json!({
                            "name": e.name(),
                            "display_name": e.display_name(),
                            "halt_on_fail": e.halt_on_fail(),
                            "config": e.resolved_config(),
                        })
                    })
                    .collect(),
            )
        }
        json!({
            "execution_plan": entries(&self.execution),
            "teardown_plan": entries(&self.teardown),
        })
    }
}
