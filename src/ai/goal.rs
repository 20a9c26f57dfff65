//! Tagged result type system calls return instead of raising (`spec.md`
//! §7 "Propagation policy").

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Delegated,
    Completed,
    InProgress,
    Failed { reason: String },
}

impl ActionOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActionOutcome::Failed { reason: reason.into() }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionOutcome::Completed | ActionOutcome::Failed { .. })
    }
}
