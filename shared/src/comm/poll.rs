use log::error;

use crate::comm::error::CommError;

/// Counts completion polls of one operation against a fixed retry budget
pub(crate) struct PollBudget {
    operation: &'static str,
    limit: u64,
    used: u64,
}

impl PollBudget {
    pub fn new(operation: &'static str, limit: u64) -> Self {
        Self {
            operation,
            limit,
            used: 0,
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    /// Accounts for one more polling round with `pending` incomplete requests
    pub fn tick(&mut self, pending: usize) -> Result<(), CommError> {
        self.used += 1;
        if self.used > self.limit {
            error!(
                "{}: giving up with {} pending messages after {} polls",
                self.operation, pending, self.limit
            );
            return Err(CommError::PollBudgetExceeded {
                operation: self.operation,
                pending,
                retries: self.limit,
            });
        }
        std::hint::spin_loop();
        Ok(())
    }
}
