//! Ejecución ordenada de planes.
//!
//! Recorre cada plan en orden estricto, un step a la vez. El fallo simple de
//! un step (devuelve `false` sin `halt_on_fail`) se registra y el plan sigue;
//! con `halt_on_fail` el resto del plan se salta. Un `Err` del step es un
//! defecto: se loguea como condición distinta y también detiene el plan. Los
//! dos planes corren bajo fronteras independientes: el teardown siempre corre,
//! termine como termine la ejecución.

use crate::plan::{Plan, PlanEntry};
use crate::session::Session;
use crate::step::StepStatus;

/// Cómo terminó un plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Completed,
    /// Un step con `halt_on_fail` falló en `index`.
    Halted { index: usize },
    /// Un step devolvió `Err` en `index` (defecto del grader).
    Faulted { index: usize },
}

/// Resultado de un plan: desenlace + estado final por entrada.
#[derive(Debug)]
pub struct PlanReport {
    pub outcome: PlanOutcome,
    pub statuses: Vec<StepStatus>,
}

impl PlanReport {
    pub fn completed(&self) -> bool {
        self.outcome == PlanOutcome::Completed
    }
}

/// Resultado de la corrida completa.
#[derive(Debug)]
pub struct RunReport {
    pub execution: PlanReport,
    pub teardown: PlanReport,
}

pub struct Executor;

impl Executor {
    /// Corre ambos planes en secuencia, cada uno bajo su propia frontera.
    pub fn run(plan: &Plan, session: &mut Session) -> RunReport {
        let execution = Self::run_plan(&plan.execution, session);
        let teardown = Self::run_plan(&plan.teardown, session);
        RunReport { execution, teardown }
    }

    pub fn run_plan(entries: &[PlanEntry], session: &mut Session) -> PlanReport {
        let mut statuses = vec![StepStatus::Pending; entries.len()];

        for (index, entry) in entries.iter().enumerate() {
            statuses[index] = StepStatus::Running;
            session.begin_step(entry.name(), entry.display_name());
            session.private().trace(format!("Starting {}", entry.name()));
            if let Ok(cfg) = serde_json::to_string_pretty(entry.resolved_config()) {
                session.private().trace(format!("Using config:\n{cfg}"));
            }

            match entry.run(session) {
                Ok(true) => {
                    session.mark_step_success();
                    statuses[index] = StepStatus::Succeeded;
                }
                Ok(false) => {
                    statuses[index] = StepStatus::Failed;
                    if entry.halt_on_fail() {
                        session
                            .private()
                            .error(format!("Step {} failed and halts on failure.", entry.name()));
                        skip_rest(&mut statuses, index + 1);
                        session.end_plan();
                        return PlanReport { outcome: PlanOutcome::Halted { index }, statuses };
                    }
                }
                Err(error) => {
                    statuses[index] = StepStatus::Failed;
                    session
                        .private()
                        .critical(format!("Step {} raised an unexpected error: {error}", entry.name()));
                    skip_rest(&mut statuses, index + 1);
                    session.end_plan();
                    return PlanReport { outcome: PlanOutcome::Faulted { index }, statuses };
                }
            }

            session.private().trace(format!("Finished {}", entry.name()));
        }

        session.end_plan();
        PlanReport { outcome: PlanOutcome::Completed, statuses }
    }
}

fn skip_rest(statuses: &mut [StepStatus], from: usize) {
    for status in statuses.iter_mut().skip(from) {
        *status = StepStatus::Skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StepError;
    use crate::logging::LogChannel;
    use crate::step::{StepAdapter, StepConfig, StepDefinition, TypedStep};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct VerdictConfig {
        #[serde(default)]
        halt_on_fail: bool,
        #[serde(default)]
        verdict: bool,
        #[serde(default)]
        fault: bool,
    }

    impl StepConfig for VerdictConfig {
        fn fields() -> &'static [&'static str] {
            &["halt_on_fail", "verdict", "fault"]
        }
        fn halt_on_fail(&self) -> bool {
            self.halt_on_fail
        }
    }

    #[derive(Clone)]
    struct Verdict;

    impl TypedStep for Verdict {
        type Config = VerdictConfig;
        fn name(&self) -> &'static str {
            "verdict"
        }
        fn run(&self, session: &mut Session, config: &Self::Config) -> Result<bool, StepError> {
            session.student().info("ran");
            if config.fault {
                return Err(StepError::Other("boom".to_string()));
            }
            Ok(config.verdict)
        }
    }

    fn entry(verdict: bool, halt_on_fail: bool, fault: bool) -> crate::plan::PlanEntry {
        StepAdapter(Verdict)
            .prepare(serde_json::json!({
                "halt_on_fail": halt_on_fail,
                "verdict": verdict,
                "fault": fault,
            }))
            .expect("prepare")
    }

    fn session() -> Session {
        Session::new(LogChannel::new())
    }

    #[test]
    fn plain_failure_does_not_stop_siblings() {
        let entries = vec![entry(false, false, false), entry(true, false, false)];
        let mut session = session();
        let report = Executor::run_plan(&entries, &mut session);
        assert!(report.completed());
        assert_eq!(report.statuses, vec![StepStatus::Failed, StepStatus::Succeeded]);
        assert!(!session.step_logs[0].success);
        assert!(session.step_logs[1].success);
    }

    #[test]
    fn halt_on_fail_skips_the_rest_of_the_plan() {
        let entries = vec![entry(true, false, false), entry(false, true, false), entry(true, false, false)];
        let mut session = session();
        let report = Executor::run_plan(&entries, &mut session);
        assert_eq!(report.outcome, PlanOutcome::Halted { index: 1 });
        assert_eq!(
            report.statuses,
            vec![StepStatus::Succeeded, StepStatus::Failed, StepStatus::Skipped]
        );
        // el step salteado nunca abrió su StepLog
        assert_eq!(session.step_logs.len(), 2);
    }

    #[test]
    fn step_error_is_a_fault_and_stops_the_plan() {
        let entries = vec![entry(true, false, true), entry(true, false, false)];
        let mut session = session();
        let report = Executor::run_plan(&entries, &mut session);
        assert_eq!(report.outcome, PlanOutcome::Faulted { index: 0 });
        assert_eq!(report.statuses, vec![StepStatus::Failed, StepStatus::Skipped]);
    }

    #[test]
    fn teardown_runs_even_when_execution_halts() {
        let plan = Plan {
            execution: vec![entry(false, true, false), entry(true, false, false)],
            teardown: vec![entry(true, false, false)],
        };
        let mut session = session();
        let report = Executor::run(&plan, &mut session);
        assert_eq!(report.execution.outcome, PlanOutcome::Halted { index: 0 });
        assert!(report.teardown.completed());
        // un StepLog por step efectivamente iniciado: 1 de ejecución + 1 de teardown
        assert_eq!(session.step_logs.len(), 2);
        assert!(session.step_logs[1].success);
    }

    #[test]
    fn teardown_runs_after_an_execution_fault() {
        let plan = Plan {
            execution: vec![entry(true, false, true)],
            teardown: vec![entry(true, false, false)],
        };
        let mut session = session();
        let report = Executor::run(&plan, &mut session);
        assert_eq!(report.execution.outcome, PlanOutcome::Faulted { index: 0 });
        assert!(report.teardown.completed());
    }
}
