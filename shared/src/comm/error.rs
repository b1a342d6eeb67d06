use thiserror::Error;

use crate::{
    comm::transport::ChannelKind, interface::error::InterfaceError, Gid, ProcId,
};

/// Errors reported by a `Transport` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Process outside of the process group
    #[error("Invalid process {proc} (process group size: {size})")]
    InvalidProcess { proc: ProcId, size: u32 },

    /// Channel was never opened or already closed
    #[error("Channel {kind:?} to process {proc} is not open")]
    ChannelClosed { proc: ProcId, kind: ChannelKind },

    /// Message could not be handed to the process
    #[error("Send to process {proc} failed: {reason}")]
    SendFailed { proc: ProcId, reason: String },

    /// Message could not be taken from the process
    #[error("Receive from process {proc} failed: {reason}")]
    RecvFailed { proc: ProcId, reason: String },

    /// Handle was not issued by this transport or was already completed
    #[error("Unknown transport handle {handle}")]
    UnknownHandle { handle: u64 },

    /// Collective operation (barrier, broadcast, reduce) failed
    #[error("Collective {operation} failed: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        reason: String,
    },
}

/// Errors that can occur while opening channels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Transport refused to open or poll a channel
    #[error("Connecting {kind:?} channel to process {proc} failed")]
    ConnectFailed {
        proc: ProcId,
        kind: ChannelKind,
        #[source]
        source: TransportError,
    },

    /// Transport refused to close a channel
    #[error("Closing {kind:?} channel to process {proc} failed")]
    CloseFailed {
        proc: ProcId,
        kind: ChannelKind,
        #[source]
        source: TransportError,
    },

    /// Batched connect did not finish within the retry budget
    #[error("{pending} {kind:?} channels still connecting after {retries} polls")]
    ConnectBudgetExceeded {
        kind: ChannelKind,
        pending: usize,
        retries: u64,
    },
}

/// Errors that can occur during interface communication and consistency checks.
///
/// These are transport-level failures: the processes of the group can no
/// longer be assumed to agree on what was exchanged, so the caller must not
/// continue as if the exchange happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommError {
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Completion polling exceeded its retry budget
    #[error("{operation}: {pending} messages still pending after {retries} polls")]
    PollBudgetExceeded {
        operation: &'static str,
        pending: usize,
        retries: u64,
    },

    /// A received buffer does not hold the expected number of records
    #[error("Payload from process {proc} has {actual} bytes, expected {expected}")]
    PayloadSizeMismatch {
        proc: ProcId,
        expected: usize,
        actual: usize,
    },

    /// Exchange with records of zero bytes
    #[error("Exchange item size must be at least one byte")]
    ZeroItemSize,

    /// Interface entry refers to an object that is no longer registered
    #[error("Interface entry for object {gid} is stale, rebuild the interface")]
    StaleEntry { gid: Gid },

    /// Diagnostic message could not be decoded
    #[error("Malformed message from process {proc}: {reason}")]
    MalformedMessage { proc: ProcId, reason: &'static str },
}
