use crate::{comm::error::TransportError, ProcId};

/// Purpose of a virtual channel. Messages of different kinds between the
/// same pair of processes never overtake or mix with each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Interface exchanges
    Interface,
    /// Consistency-check traffic
    Consistency,
}

/// Open virtual channel to one remote process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Channel {
    proc: ProcId,
    kind: ChannelKind,
    key: u64,
}

impl Channel {
    pub fn new(proc: ProcId, kind: ChannelKind, key: u64) -> Self {
        Self { proc, kind, key }
    }

    pub fn proc(&self) -> ProcId {
        self.proc
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Transport-specific identity of the channel
    pub fn key(&self) -> u64 {
        self.key
    }
}

/// Connect request posted but not yet known to be complete
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PendingConnect {
    proc: ProcId,
    kind: ChannelKind,
    key: u64,
}

impl PendingConnect {
    pub fn new(proc: ProcId, kind: ChannelKind, key: u64) -> Self {
        Self { proc, kind, key }
    }

    pub fn proc(&self) -> ProcId {
        self.proc
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn key(&self) -> u64 {
        self.key
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SendHandle(u64);

impl SendHandle {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecvHandle(u64);

impl RecvHandle {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    Max,
    Sum,
    Min,
}

impl ReduceOp {
    pub fn apply(&self, a: u64, b: u64) -> u64 {
        match self {
            ReduceOp::Max => a.max(b),
            ReduceOp::Sum => a.saturating_add(b),
            ReduceOp::Min => a.min(b),
        }
    }
}

/// Point-to-point messaging between the processes of one group.
///
/// Messages on one channel arrive in the order they were sent, and
/// receives posted on one channel complete in the order they were posted.
/// Every process calls collectives (`barrier`, `broadcast_u64`,
/// `reduce_u64`) in the same order.
pub trait Transport {
    fn rank(&self) -> ProcId;

    /// Number of processes in the group
    fn size(&self) -> u32;

    /// Starts connecting a channel of `kind` to `proc`
    fn open_channel(&mut self, proc: ProcId, kind: ChannelKind) -> Result<PendingConnect, TransportError>;

    /// Returns the channel once the connect request completed
    fn poll_connect(&mut self, pending: &PendingConnect) -> Result<Option<Channel>, TransportError>;

    fn close_channel(&mut self, channel: &Channel) -> Result<(), TransportError>;

    /// Sends `payload`, returning once the buffer may be reused
    fn send(&mut self, channel: &Channel, payload: &[u8]) -> Result<(), TransportError>;

    /// Receives the next message, blocking until it arrived
    fn recv(&mut self, channel: &Channel) -> Result<Vec<u8>, TransportError>;

    /// Posts a send of `payload` without waiting for completion
    fn isend(&mut self, channel: &Channel, payload: Vec<u8>) -> Result<SendHandle, TransportError>;

    /// Posts a receive of a message of up to `len` bytes
    fn irecv(&mut self, channel: &Channel, len: usize) -> Result<RecvHandle, TransportError>;

    /// Whether the send completed. A completed handle must not be polled again.
    fn poll_send(&mut self, handle: &SendHandle) -> Result<bool, TransportError>;

    /// The received message, once the receive completed. A completed handle
    /// must not be polled again.
    fn poll_recv(&mut self, handle: &RecvHandle) -> Result<Option<Vec<u8>>, TransportError>;

    fn barrier(&mut self) -> Result<(), TransportError>;

    /// Returns `root`'s `value` on every process
    fn broadcast_u64(&mut self, root: ProcId, value: u64) -> Result<u64, TransportError>;

    /// Combines `value` of every process with `op`, returning the result on every process
    fn reduce_u64(&mut self, op: ReduceOp, value: u64) -> Result<u64, TransportError>;
}
