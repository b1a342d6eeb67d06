use thiserror::Error;

use crate::{DddType, MAX_TYPES};

/// Errors that can occur while declaring distributed types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Type table is full
    #[error("Cannot declare type '{name}': at most {} types may be declared", MAX_TYPES)]
    TooManyTypes { name: String },

    /// A type's record must occupy at least one byte
    #[error("Cannot declare type '{name}' with a zero record size")]
    ZeroRecordSize { name: String },

    /// Operation on a type that was never declared
    #[error("Unknown {ddd_type}")]
    UnknownType { ddd_type: DddType },
}
