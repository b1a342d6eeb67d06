use std::ops::Range;

use crate::{
    interface::definition::{InterfaceDef, InterfaceId},
    Attr, Gid, ObjectId, Priority, ProcId,
};

/// Direction of one interface coupling, seen from the local process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IfDirection {
    /// local priority in A, remote priority in B
    AB,
    /// local priority in B, remote priority in A
    BA,
    /// both of the above
    ABA,
}

impl IfDirection {
    /// The same coupling as seen from the remote process
    pub fn mirror(self) -> Self {
        match self {
            IfDirection::AB => IfDirection::BA,
            IfDirection::BA => IfDirection::AB,
            IfDirection::ABA => IfDirection::ABA,
        }
    }

    /// Sort rank shared by both ends of a coupling: directions are ranked
    /// as the lower-ranked process sees them.
    pub(crate) fn canonical_rank(self, me: ProcId, remote: ProcId) -> u8 {
        let seen_from_lower = if me < remote { self } else { self.mirror() };
        match seen_from_lower {
            IfDirection::AB => 0,
            IfDirection::BA => 1,
            IfDirection::ABA => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IfDirection::AB => "AB",
            IfDirection::BA => "BA",
            IfDirection::ABA => "ABA",
        }
    }
}

/// Direction of a one-way exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// send AB and ABA items, receive BA and ABA items
    Forward,
    /// send BA and ABA items, receive AB and ABA items
    Backward,
}

/// Which items of an interface take part in one exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfSelection {
    All,
    Oneway(Direction),
    Attr(Attr),
}

impl IfSelection {
    pub(crate) fn sends(&self, entry: &IfEntry) -> bool {
        match self {
            IfSelection::All => true,
            IfSelection::Oneway(Direction::Forward) => entry.direction != IfDirection::BA,
            IfSelection::Oneway(Direction::Backward) => entry.direction != IfDirection::AB,
            IfSelection::Attr(attr) => entry.attr == *attr,
        }
    }

    pub(crate) fn receives(&self, entry: &IfEntry) -> bool {
        match self {
            IfSelection::All => true,
            IfSelection::Oneway(Direction::Forward) => entry.direction != IfDirection::AB,
            IfSelection::Oneway(Direction::Backward) => entry.direction != IfDirection::BA,
            IfSelection::Attr(attr) => entry.attr == *attr,
        }
    }
}

/// One coupling selected by an interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfEntry {
    pub(crate) object: ObjectId,
    pub(crate) gid: Gid,
    pub(crate) attr: Attr,
    pub(crate) local_priority: Priority,
    pub(crate) remote_priority: Priority,
    pub(crate) direction: IfDirection,
}

impl IfEntry {
    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    pub fn local_priority(&self) -> Priority {
        self.local_priority
    }

    pub fn remote_priority(&self) -> Priority {
        self.remote_priority
    }

    pub fn direction(&self) -> IfDirection {
        self.direction
    }
}

/// Entries of one attribute within a process bucket, as ranges into the
/// bucket's entry list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfAttrBucket {
    pub(crate) attr: Attr,
    pub(crate) ab: Range<usize>,
    pub(crate) ba: Range<usize>,
    pub(crate) aba: Range<usize>,
}

impl IfAttrBucket {
    pub(crate) fn new(attr: Attr) -> Self {
        Self {
            attr,
            ab: 0..0,
            ba: 0..0,
            aba: 0..0,
        }
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    pub fn range(&self, direction: IfDirection) -> Range<usize> {
        match direction {
            IfDirection::AB => self.ab.clone(),
            IfDirection::BA => self.ba.clone(),
            IfDirection::ABA => self.aba.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.ab.len() + self.ba.len() + self.aba.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry indices of this attribute in canonical order
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let mut ranges = [self.ab.clone(), self.ba.clone(), self.aba.clone()];
        ranges.sort_by_key(|range| range.start);
        ranges.into_iter().flatten()
    }
}

/// Interface entries shared with one remote process, in canonical order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfProcBucket {
    pub(crate) proc: ProcId,
    pub(crate) entries: Vec<IfEntry>,
    pub(crate) attrs: Vec<IfAttrBucket>,
    pub(crate) n_ab: usize,
    pub(crate) n_ba: usize,
    pub(crate) n_aba: usize,
}

impl IfProcBucket {
    pub fn proc(&self) -> ProcId {
        self.proc
    }

    pub fn entries(&self) -> &[IfEntry] {
        &self.entries
    }

    /// Attribute buckets, highest attribute first
    pub fn attrs(&self) -> &[IfAttrBucket] {
        &self.attrs
    }

    pub fn attr(&self, attr: Attr) -> Option<&IfAttrBucket> {
        self.attrs.iter().find(|bucket| bucket.attr == attr)
    }

    pub fn count(&self, direction: IfDirection) -> usize {
        match direction {
            IfDirection::AB => self.n_ab,
            IfDirection::BA => self.n_ba,
            IfDirection::ABA => self.n_aba,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sent to this process under `selection`, in canonical order
    pub fn outgoing<'a>(&'a self, selection: &'a IfSelection) -> Box<dyn Iterator<Item = &'a IfEntry> + 'a> {
        self.selected(selection, true)
    }

    /// Entries received from this process under `selection`, in canonical order
    pub fn incoming<'a>(&'a self, selection: &'a IfSelection) -> Box<dyn Iterator<Item = &'a IfEntry> + 'a> {
        self.selected(selection, false)
    }

    fn selected<'a>(
        &'a self,
        selection: &'a IfSelection,
        sending: bool,
    ) -> Box<dyn Iterator<Item = &'a IfEntry> + 'a> {
        if let IfSelection::Attr(attr) = selection {
            return match self.attr(*attr) {
                Some(bucket) => Box::new(bucket.indices().map(move |index| &self.entries[index])),
                None => Box::new(std::iter::empty()),
            };
        }
        Box::new(self.entries.iter().filter(move |entry| {
            if sending {
                selection.sends(entry)
            } else {
                selection.receives(entry)
            }
        }))
    }
}

/// A defined interface and its last built descriptor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub(crate) id: InterfaceId,
    pub(crate) def: InterfaceDef,
    pub(crate) procs: Vec<IfProcBucket>,
    pub(crate) built_revision: Option<u64>,
}

impl Interface {
    pub(crate) fn new(id: InterfaceId, def: InterfaceDef) -> Self {
        Self {
            id,
            def,
            procs: Vec::new(),
            built_revision: None,
        }
    }

    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn def(&self) -> &InterfaceDef {
        &self.def
    }

    /// Process buckets ordered by remote process
    pub fn procs(&self) -> &[IfProcBucket] {
        &self.procs
    }

    pub fn proc(&self, proc: ProcId) -> Option<&IfProcBucket> {
        self.procs
            .binary_search_by_key(&proc, |bucket| bucket.proc)
            .ok()
            .map(|index| &self.procs[index])
    }

    /// Total number of interface entries over all processes
    pub fn len(&self) -> usize {
        self.procs.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, direction: IfDirection) -> usize {
        self.procs.iter().map(|bucket| bucket.count(direction)).sum()
    }

    /// Registry revision the descriptor was built from
    pub fn built_revision(&self) -> Option<u64> {
        self.built_revision
    }

    pub(crate) fn memory_usage(&self) -> usize {
        std::mem::size_of::<Interface>()
            + self
                .procs
                .iter()
                .map(|bucket| {
                    std::mem::size_of::<IfProcBucket>()
                        + bucket.entries.capacity() * std::mem::size_of::<IfEntry>()
                        + bucket.attrs.capacity() * std::mem::size_of::<IfAttrBucket>()
                })
                .sum::<usize>()
    }
}
