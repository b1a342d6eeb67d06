use thiserror::Error;

use crate::comm::error::TransportError;

/// Errors that can occur while creating a `Ddd` context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DddError {
    /// Process ranks must fit into the process bits of a GID
    #[error("Process group of {size} processes is too large (maximum: {max})")]
    GroupTooLarge { size: u32, max: u64 },

    /// Counters past the GID layout would repeat earlier GIDs
    #[error("GID counter limit {limit} exceeds the {max} counters a GID can hold")]
    GidCounterLimit { limit: u64, max: u64 },

    /// Rank reported by the transport is outside of the group
    #[error("Transport reports rank {rank} in a group of {size} processes")]
    InvalidRank { rank: u32, size: u32 },

    /// Agreeing on the shared settings failed
    #[error("Context setup failed")]
    Setup(#[from] TransportError),
}
