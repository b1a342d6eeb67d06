use log::warn;

use crate::{
    registry::{coupling::Coupling, object_header::ObjectHeader},
    ObjectId,
};

pub struct ObjectRecord {
    pub(crate) header: ObjectHeader,
    pub(crate) couplings: Vec<Coupling>,
}

struct Slot {
    generation: u32,
    record: Option<ObjectRecord>,
}

/// Generational slot storage plus an ordered table whose front `n_cpls`
/// positions hold exactly the coupled objects. An object crosses the
/// coupled/uncoupled boundary by a single swap with the boundary element.
pub struct ObjectTable {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    // front: coupled, back: uncoupled
    order: Vec<ObjectId>,
    n_cpls: usize,
    capacity: usize,
    growth_events: usize,
}

impl ObjectTable {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            order: Vec::with_capacity(capacity),
            n_cpls: 0,
            capacity,
            growth_events: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn n_cpls(&self) -> usize {
        self.n_cpls
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn growth_events(&self) -> usize {
        self.growth_events
    }

    pub fn get(&self, id: &ObjectId) -> Option<&ObjectRecord> {
        let slot = self.slots.get(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.record.as_ref()
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut ObjectRecord> {
        let slot = self.slots.get_mut(id.slot())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.record.as_mut()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Appends a new, uncoupled object at the back of the table
    pub fn insert(&mut self, mut header: ObjectHeader) -> ObjectId {
        if self.order.len() >= self.capacity {
            self.grow();
        }

        let table_index = self.order.len();
        header.set_table_index(table_index);
        let record = ObjectRecord {
            header,
            couplings: Vec::new(),
        };

        let id = if let Some(slot_index) = self.free_slots.pop() {
            let slot = &mut self.slots[slot_index as usize];
            slot.record = Some(record);
            ObjectId::new(slot_index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                record: Some(record),
            });
            ObjectId::new((self.slots.len() - 1) as u32, 0)
        };

        self.order.push(id);
        id
    }

    /// Removes an uncoupled object; the last table element moves into its position
    pub fn remove(&mut self, id: &ObjectId) -> Option<ObjectRecord> {
        let position = self.get(id)?.header.table_index();
        if position < self.n_cpls {
            panic!("Cannot remove object {} from the coupled region, demote it first", id);
        }

        let last = self.order.len() - 1;
        self.swap_positions(position, last);
        self.order.pop();

        let slot = &mut self.slots[id.slot()];
        let record = slot.record.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.slot() as u32);
        record
    }

    /// Moves an uncoupled object into the coupled prefix
    pub fn promote(&mut self, id: &ObjectId) {
        let Some(record) = self.get(id) else {
            panic!("Cannot promote unknown object {}", id);
        };
        let position = record.header.table_index();
        if position < self.n_cpls {
            panic!("Object {} is already in the coupled region", record.header.gid());
        }
        self.swap_positions(position, self.n_cpls);
        self.n_cpls += 1;
    }

    /// Moves a coupled object out of the coupled prefix
    pub fn demote(&mut self, id: &ObjectId) {
        let Some(record) = self.get(id) else {
            panic!("Cannot demote unknown object {}", id);
        };
        let position = record.header.table_index();
        if position >= self.n_cpls {
            panic!("Object {} is not in the coupled region", record.header.gid());
        }
        self.n_cpls -= 1;
        self.swap_positions(position, self.n_cpls);
    }

    /// Object handles in table order
    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn coupled(&self) -> impl Iterator<Item = (ObjectId, &ObjectRecord)> {
        self.order[..self.n_cpls].iter().filter_map(move |id| {
            self.get(id).map(|record| (*id, record))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ObjectRecord)> {
        self.order
            .iter()
            .filter_map(move |id| self.get(id).map(|record| (*id, record)))
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.order.swap(a, b);
        let (id_a, id_b) = (self.order[a], self.order[b]);
        if let Some(record) = self.get_mut(&id_a) {
            record.header.set_table_index(a);
        }
        if let Some(record) = self.get_mut(&id_b) {
            record.header.set_table_index(b);
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * 2;
        warn!(
            "object table full ({} entries), growing to {}",
            self.capacity, new_capacity
        );
        self.order.reserve_exact(new_capacity - self.order.len());
        self.slots
            .reserve(new_capacity.saturating_sub(self.slots.len()));
        self.capacity = new_capacity;
        self.growth_events += 1;
    }
}
