/// Estado de un step durante la ejecución de un plan.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Running`
/// - `Running` -> `Succeeded`
/// - `Running` -> `Failed`
/// - `Pending` -> `Skipped` (el plan se detuvo antes de llegar)
///
/// Los estados terminales no se re-entran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Succeeded | StepStatus::Failed | StepStatus::Skipped)
    }
}
