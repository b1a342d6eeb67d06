use thiserror::Error;

use crate::{DddType, Priority};

/// Errors that can occur while configuring a priority merge policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrioMergeError {
    /// Priority outside of `0..MAX_PRIO`
    #[error("Invalid priority {priority} in merge definition (valid range: 0-{max})")]
    InvalidPriority { priority: Priority, max: Priority },

    /// Merge policy requested for a type that was never declared
    #[error("Cannot define priority merge for undeclared {ddd_type}")]
    UnknownType { ddd_type: DddType },
}
