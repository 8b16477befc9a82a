//! Fachada del motor: configs + registry -> plan resuelto -> corrida.

use std::path::Path;

use crate::config::{load_global_config, load_run_config, resolve_plan, GlobalConfig, RunConfigFile};
use crate::errors::ConfigError;
use crate::executor::{Executor, RunReport};
use crate::logging::Level;
use crate::plan::Plan;
use crate::registry::StepRegistry;
use crate::session::Session;

pub struct Engine {
    plan: Plan,
    session: Session,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Resuelve el plan contra el registry. Cualquier `ConfigError` acá es
    /// fatal: ningún step se ejecuta.
    pub fn new(
        registry: &StepRegistry,
        run: &RunConfigFile,
        global: &GlobalConfig,
        session: Session,
    ) -> Result<Self, ConfigError> {
        let plan = resolve_plan(registry, run, global)?;
        Ok(Self { plan, session })
    }

    /// Carga los YAML y arma el engine con el canal de log estándar.
    pub fn from_paths(
        registry: &StepRegistry,
        config_path: &Path,
        global_config_path: Option<&Path>,
        colorize: bool,
        log_level: Level,
    ) -> Result<Self, ConfigError> {
        let run = load_run_config(config_path)?;
        let global = load_global_config(global_config_path)?;
        Self::new(registry, &run, &global, Session::standard(colorize, log_level))
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Ejecuta el plan de ejecución y después, siempre, el de teardown.
    pub fn run(&mut self) -> RunReport {
        let run_id = self.session.run_id;
        self.session.private().debug(format!("Starting grading run {run_id}"));
        Executor::run(&self.plan, &mut self.session)
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}
