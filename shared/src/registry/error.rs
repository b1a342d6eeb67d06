use thiserror::Error;

use crate::{DddType, Gid, ObjectId, Priority, ProcId};

/// Errors that can occur during object and coupling registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Handle does not refer to a live object (never registered or already deregistered)
    #[error("Object {object} is not registered on this process")]
    UnknownObject { object: ObjectId },

    /// Object registered with a type that was never declared
    #[error("Cannot register object of undeclared {ddd_type}")]
    UnknownType { ddd_type: DddType },

    /// Priority outside of `0..MAX_PRIO`
    #[error("Invalid priority {priority} (valid range: 0-{max})")]
    InvalidPriority { priority: Priority, max: Priority },

    /// Remote process outside of the process group
    #[error("Invalid process {proc} for object {gid} (process group size: {size})")]
    InvalidProcess { gid: Gid, proc: ProcId, size: u32 },

    /// The per-process GID counter is exhausted
    #[error("GID overflow on process {rank}: counter reached its limit of {limit}")]
    GidOverflow { rank: ProcId, limit: u64 },

    /// An object with this GID already lives on this process
    #[error("Object {gid} is already registered on this process")]
    DuplicateGid { gid: Gid },

    /// Replica claims a GID of this process that was never handed out here
    #[error("Object {gid} carries rank {rank} but was never issued by this process")]
    UnissuedGid { gid: Gid, rank: ProcId },

    /// Coupling to modify or delete does not exist
    #[error("Object {gid} has no coupling with process {proc}")]
    CouplingNotFound { gid: Gid, proc: ProcId },

    /// Coupling an object with its own process
    #[error("Cannot couple object {gid} with its own process {proc}")]
    SelfCoupling { gid: Gid, proc: ProcId },
}
