use crate::{Attr, DddType, Gid, Priority};

/// Registry-owned header of one local replica
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    gid: Gid,
    ddd_type: DddType,
    priority: Priority,
    attr: Attr,
    table_index: usize,
}

impl ObjectHeader {
    pub(crate) fn new(gid: Gid, ddd_type: DddType, priority: Priority, attr: Attr) -> Self {
        Self {
            gid,
            ddd_type,
            priority,
            attr,
            table_index: usize::MAX,
        }
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }

    pub fn ddd_type(&self) -> DddType {
        self.ddd_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn attr(&self) -> Attr {
        self.attr
    }

    /// Position in the object table. Positions below the table's coupled
    /// count belong to objects with at least one coupling.
    pub fn table_index(&self) -> usize {
        self.table_index
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub(crate) fn set_table_index(&mut self, table_index: usize) {
        self.table_index = table_index;
    }
}
