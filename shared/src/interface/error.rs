use thiserror::Error;

use crate::{interface::definition::InterfaceId, DddType, Priority, MAX_INTERFACES};

/// Errors that can occur while defining or looking up interfaces
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    /// Interface table is full
    #[error("Cannot define interface: at most {} interfaces may be defined", MAX_INTERFACES)]
    TooManyInterfaces,

    /// Id does not refer to a defined interface
    #[error("Unknown interface {id}")]
    UnknownInterface { id: InterfaceId },

    /// Interface refers to a type that was never declared
    #[error("Cannot define interface over undeclared {ddd_type}")]
    UnknownType { ddd_type: DddType },

    /// Priority outside of `0..MAX_PRIO`
    #[error("Invalid priority {priority} in interface definition (valid range: 0-{max})")]
    InvalidPriority { priority: Priority, max: Priority },

    /// Interface defined over no type at all
    #[error("Cannot define interface with an empty type set")]
    EmptyTypeSet,
}
