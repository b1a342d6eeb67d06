use std::fmt;

/// Rank of a process within the process group
pub type ProcId = u32;
/// Ordinal ranking of one replica, resolved on conflict via merge policy
pub type Priority = u8;
/// Application-defined grouping key of an object, used to bucket interfaces
pub type Attr = u32;

/// Number of valid priorities, `0..MAX_PRIO`
pub const MAX_PRIO: Priority = 32;
/// Number of distributed types a process may declare
pub const MAX_TYPES: usize = 32;
/// Number of interfaces a process may define, the standard interface included
pub const MAX_INTERFACES: usize = 32;
/// Low-order bits of every `Gid` reserved for the rank of the creating process
pub const PROC_BITS_IN_GID: u32 = 24;
/// Number of distinct counters a process can put into its GIDs
pub const MAX_GID_COUNTER: u64 = 1 << (u64::BITS - PROC_BITS_IN_GID);

pub fn is_valid_priority(priority: Priority) -> bool {
    priority < MAX_PRIO
}

// Gid
/// Process-salted identifier of a distributed object, unique across the
/// whole process group and never reused.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct Gid(u64);

impl Gid {
    pub(crate) fn compose(counter: u64, rank: ProcId) -> Self {
        Self((counter << PROC_BITS_IN_GID) | (rank as u64 & ((1 << PROC_BITS_IN_GID) - 1)))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }

    /// Rank of the process that created the object
    pub fn origin(&self) -> ProcId {
        (self.0 & ((1 << PROC_BITS_IN_GID) - 1)) as ProcId
    }

    pub fn counter(&self) -> u64 {
        self.0 >> PROC_BITS_IN_GID
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

// DddType
/// Handle of a declared distributed type
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct DddType(u16);

impl DddType {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u16)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DddType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

// ObjectId
/// Stable handle of a locally registered object. The generation guards
/// against use of a handle after its object was deregistered.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct ObjectId {
    slot: u32,
    generation: u32,
}

impl ObjectId {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}.{}", self.slot, self.generation)
    }
}
