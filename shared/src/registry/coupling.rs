use crate::{Priority, ProcId};

/// Assertion that process `proc` holds another replica of an object at `priority`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coupling {
    proc: ProcId,
    priority: Priority,
}

impl Coupling {
    pub(crate) fn new(proc: ProcId, priority: Priority) -> Self {
        Self { proc, priority }
    }

    pub fn proc(&self) -> ProcId {
        self.proc
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }
}
