pub mod coupling;
pub mod display;
pub mod error;
pub mod gid_generator;
pub mod object_header;
pub mod object_table;

use std::collections::HashMap;

use log::{trace, warn};

use crate::{
    config::{DddConfig, Options},
    is_valid_priority,
    type_registry::TypeRegistry,
    Attr, DddType, Gid, ObjectId, Priority, ProcId, MAX_PRIO,
};

use self::{
    coupling::Coupling, error::RegistryError, gid_generator::GidGenerator,
    object_header::ObjectHeader, object_table::ObjectTable,
};

/// Per-process table of local replicas and their couplings.
///
/// No operation communicates; couplings reflect facts already agreed on by
/// the processes involved. Every mutation that can change an interface bumps
/// `revision()`.
pub struct ObjectRegistry {
    rank: ProcId,
    size: u32,
    options: Options,
    gids: GidGenerator,
    table: ObjectTable,
    gid_index: HashMap<Gid, ObjectId>,
    n_couplings: usize,
    // coupling count at which the next growth is reported; the couplings
    // themselves live in per-object lists
    coupling_threshold: usize,
    coupling_growth_events: usize,
    freelist: Vec<Vec<Coupling>>,
    revision: u64,
}

impl ObjectRegistry {
    pub fn new(rank: ProcId, size: u32, config: &DddConfig) -> Self {
        Self {
            rank,
            size,
            options: config.options,
            gids: GidGenerator::new(rank, config.gid_counter_limit),
            table: ObjectTable::new(config.initial_object_capacity),
            gid_index: HashMap::new(),
            n_couplings: 0,
            coupling_threshold: config.initial_coupling_capacity.max(1),
            coupling_growth_events: 0,
            freelist: Vec::new(),
            revision: 0,
        }
    }

    pub fn rank(&self) -> ProcId {
        self.rank
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
        if !options.use_freelist {
            self.freelist.clear();
        }
    }

    // Object lifecycle

    /// Registers a new local object under a fresh GID
    pub fn register(
        &mut self,
        types: &TypeRegistry,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
    ) -> Result<ObjectId, RegistryError> {
        Self::validate(types, ddd_type, priority)?;
        let gid = self.gids.generate()?;
        self.insert(ObjectHeader::new(gid, ddd_type, priority, attr))
    }

    /// Registers a new local object whose application record has `record_size` bytes
    pub fn register_sized(
        &mut self,
        types: &TypeRegistry,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
        record_size: usize,
    ) -> Result<ObjectId, RegistryError> {
        let declared = types
            .get(ddd_type)
            .map_err(|_| RegistryError::UnknownType { ddd_type })?
            .record_size();
        let id = self.register(types, ddd_type, priority, attr)?;

        let gid = self.header_of(&id).gid();
        if record_size < declared && self.options.warn_small_size {
            warn!(
                "object {} of {} registered with {} bytes, smaller than declared size {}",
                gid, ddd_type, record_size, declared
            );
        } else if record_size != declared && self.options.warn_var_size_object {
            warn!(
                "object {} of {} registered with {} bytes, declared size is {}",
                gid, ddd_type, record_size, declared
            );
        }
        Ok(id)
    }

    /// Registers a local replica of an object whose GID was agreed on elsewhere.
    /// A GID salted with this process's rank must already have been issued here.
    pub fn register_replica(
        &mut self,
        types: &TypeRegistry,
        gid: Gid,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
    ) -> Result<ObjectId, RegistryError> {
        Self::validate(types, ddd_type, priority)?;
        if gid.origin() == self.rank && gid.counter() >= self.gids.issued() {
            return Err(RegistryError::UnissuedGid {
                gid,
                rank: self.rank,
            });
        }
        self.insert(ObjectHeader::new(gid, ddd_type, priority, attr))
    }

    /// Disposes all couplings of the object and removes it from the table
    pub fn deregister(&mut self, id: &ObjectId) -> Result<ObjectHeader, RegistryError> {
        let record = self
            .table
            .get_mut(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let couplings = std::mem::take(&mut record.couplings);

        if !couplings.is_empty() {
            self.n_couplings -= couplings.len();
            self.table.demote(id);
            self.revision += 1;
            self.recycle(couplings);
        }

        let Some(record) = self.table.remove(id) else {
            panic!("Object {} vanished during deregistration", id);
        };
        self.gid_index.remove(&record.header.gid());
        trace!("deregistered object {}", record.header.gid());
        Ok(record.header)
    }

    /// Changes the local priority, returning the previous one
    pub fn set_priority(
        &mut self,
        id: &ObjectId,
        priority: Priority,
    ) -> Result<Priority, RegistryError> {
        if !is_valid_priority(priority) {
            return Err(RegistryError::InvalidPriority {
                priority,
                max: MAX_PRIO - 1,
            });
        }
        let record = self
            .table
            .get_mut(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let old = record.header.priority();
        if old == priority {
            return Ok(old);
        }
        record.header.set_priority(priority);

        if !record.couplings.is_empty() {
            if self.options.warn_priority_change {
                warn!(
                    "priority of coupled object {} changed from {} to {} without informing its {} remote copies",
                    record.header.gid(),
                    old,
                    priority,
                    record.couplings.len()
                );
            }
            self.revision += 1;
        }
        Ok(old)
    }

    // Couplings

    /// Records that `proc` holds a replica at `priority`, creating or
    /// updating the coupling.
    ///
    /// # Panics
    ///
    /// Panics if `proc` is this process.
    pub fn add_coupling(
        &mut self,
        id: &ObjectId,
        proc: ProcId,
        priority: Priority,
    ) -> Result<Coupling, RegistryError> {
        if !is_valid_priority(priority) {
            return Err(RegistryError::InvalidPriority {
                priority,
                max: MAX_PRIO - 1,
            });
        }
        let record = self
            .table
            .get_mut(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let gid = record.header.gid();
        if proc == self.rank {
            panic!("{}", RegistryError::SelfCoupling { gid, proc });
        }
        if proc >= self.size {
            return Err(RegistryError::InvalidProcess {
                gid,
                proc,
                size: self.size,
            });
        }

        if let Some(coupling) = record.couplings.iter_mut().find(|c| c.proc() == proc) {
            if coupling.priority() != priority {
                trace!(
                    "coupling {} -> {} priority {} -> {}",
                    gid,
                    proc,
                    coupling.priority(),
                    priority
                );
                coupling.set_priority(priority);
                self.revision += 1;
            }
            return Ok(*coupling);
        }

        let first = record.couplings.is_empty();
        if first && record.couplings.capacity() == 0 {
            if let Some(list) = self.freelist.pop() {
                record.couplings = list;
            }
        }
        let coupling = Coupling::new(proc, priority);
        record.couplings.push(coupling);

        if self.n_couplings >= self.coupling_threshold {
            let new_threshold = self.coupling_threshold * 2;
            warn!(
                "coupling count reached {}, next report at {}",
                self.coupling_threshold, new_threshold
            );
            self.coupling_threshold = new_threshold;
            self.coupling_growth_events += 1;
        }
        self.n_couplings += 1;

        if first {
            self.table.promote(id);
        }
        self.revision += 1;
        trace!("added coupling {} -> {} at priority {}", gid, proc, priority);
        Ok(coupling)
    }

    /// Updates the priority of an existing coupling
    pub fn try_mod_coupling(
        &mut self,
        id: &ObjectId,
        proc: ProcId,
        priority: Priority,
    ) -> Result<(), RegistryError> {
        if !is_valid_priority(priority) {
            return Err(RegistryError::InvalidPriority {
                priority,
                max: MAX_PRIO - 1,
            });
        }
        let record = self
            .table
            .get_mut(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let gid = record.header.gid();
        let coupling = record
            .couplings
            .iter_mut()
            .find(|c| c.proc() == proc)
            .ok_or(RegistryError::CouplingNotFound { gid, proc })?;
        if coupling.priority() != priority {
            coupling.set_priority(priority);
            self.revision += 1;
        }
        Ok(())
    }

    /// Updates the priority of an existing coupling.
    ///
    /// # Panics
    ///
    /// Panics if the object or the coupling does not exist.
    pub fn mod_coupling(&mut self, id: &ObjectId, proc: ProcId, priority: Priority) {
        if let Err(error) = self.try_mod_coupling(id, proc, priority) {
            panic!("mod_coupling failed: {}", error);
        }
    }

    /// Removes the coupling with `proc`, demoting the object out of the
    /// coupled region when it was the last one
    pub fn try_del_coupling(
        &mut self,
        id: &ObjectId,
        proc: ProcId,
    ) -> Result<Coupling, RegistryError> {
        let record = self
            .table
            .get_mut(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let gid = record.header.gid();
        let position = record
            .couplings
            .iter()
            .position(|c| c.proc() == proc)
            .ok_or(RegistryError::CouplingNotFound { gid, proc })?;
        let removed = record.couplings.remove(position);
        let now_empty = record.couplings.is_empty();
        let emptied = if now_empty {
            Some(std::mem::take(&mut record.couplings))
        } else {
            None
        };

        self.n_couplings -= 1;
        if let Some(list) = emptied {
            self.table.demote(id);
            self.recycle(list);
        }
        self.revision += 1;
        trace!("removed coupling {} -> {}", gid, proc);
        Ok(removed)
    }

    /// Removes the coupling with `proc`.
    ///
    /// # Panics
    ///
    /// Panics if the object or the coupling does not exist.
    pub fn del_coupling(&mut self, id: &ObjectId, proc: ProcId) -> Coupling {
        match self.try_del_coupling(id, proc) {
            Ok(coupling) => coupling,
            Err(error) => panic!("del_coupling failed: {}", error),
        }
    }

    // Queries

    pub fn header(&self, id: &ObjectId) -> Result<&ObjectHeader, RegistryError> {
        self.table
            .get(id)
            .map(|record| &record.header)
            .ok_or(RegistryError::UnknownObject { object: *id })
    }

    pub fn couplings(&self, id: &ObjectId) -> Result<&[Coupling], RegistryError> {
        self.table
            .get(id)
            .map(|record| record.couplings.as_slice())
            .ok_or(RegistryError::UnknownObject { object: *id })
    }

    /// All replicas of the object as `(process, priority)`, the local one first
    pub fn replica_list(&self, id: &ObjectId) -> Result<Vec<(ProcId, Priority)>, RegistryError> {
        let record = self
            .table
            .get(id)
            .ok_or(RegistryError::UnknownObject { object: *id })?;
        let mut list = Vec::with_capacity(record.couplings.len() + 1);
        list.push((self.rank, record.header.priority()));
        list.extend(record.couplings.iter().map(|c| (c.proc(), c.priority())));
        Ok(list)
    }

    pub fn coupling_count(&self, id: &ObjectId) -> usize {
        self.table
            .get(id)
            .map(|record| record.couplings.len())
            .unwrap_or(0)
    }

    pub fn has_coupling(&self, id: &ObjectId) -> bool {
        self.coupling_count(id) > 0
    }

    pub fn coupling_priority(&self, id: &ObjectId, proc: ProcId) -> Option<Priority> {
        self.table
            .get(id)?
            .couplings
            .iter()
            .find(|c| c.proc() == proc)
            .map(|c| c.priority())
    }

    pub fn table_index(&self, id: &ObjectId) -> Option<usize> {
        self.table.get(id).map(|record| record.header.table_index())
    }

    pub fn find_by_gid(&self, gid: &Gid) -> Option<ObjectId> {
        self.gid_index.get(gid).copied()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.table.contains(id)
    }

    pub fn object_count(&self) -> usize {
        self.table.len()
    }

    /// Number of objects with at least one coupling, the length of the coupled prefix
    pub fn coupled_count(&self) -> usize {
        self.table.n_cpls()
    }

    pub fn total_couplings(&self) -> usize {
        self.n_couplings
    }

    pub fn object_capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Coupling count that triggers the next growth report. Accounting only:
    /// no coupling storage is reserved up front.
    pub fn coupling_threshold(&self) -> usize {
        self.coupling_threshold
    }

    /// Number of geometric growths of the object table and of the coupling
    /// threshold so far
    pub fn growth_events(&self) -> usize {
        self.table.growth_events() + self.coupling_growth_events
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &ObjectHeader, &[Coupling])> {
        self.table
            .iter()
            .map(|(id, record)| (id, &record.header, record.couplings.as_slice()))
    }

    /// Coupled objects in table order
    pub fn coupled_objects(&self) -> impl Iterator<Item = (ObjectId, &ObjectHeader, &[Coupling])> {
        self.table
            .coupled()
            .map(|(id, record)| (id, &record.header, record.couplings.as_slice()))
    }

    /// Bytes held by object headers and by allocated coupling lists, the
    /// free list included
    pub fn memory_usage(&self) -> (usize, usize) {
        let objects = self.table.capacity()
            * (std::mem::size_of::<ObjectHeader>() + std::mem::size_of::<ObjectId>());
        let allocated: usize = self
            .table
            .iter()
            .map(|(_, record)| record.couplings.capacity())
            .chain(self.freelist.iter().map(|list| list.capacity()))
            .sum();
        (objects, allocated * std::mem::size_of::<Coupling>())
    }

    fn validate(
        types: &TypeRegistry,
        ddd_type: DddType,
        priority: Priority,
    ) -> Result<(), RegistryError> {
        if !types.contains(ddd_type) {
            return Err(RegistryError::UnknownType { ddd_type });
        }
        if !is_valid_priority(priority) {
            return Err(RegistryError::InvalidPriority {
                priority,
                max: MAX_PRIO - 1,
            });
        }
        Ok(())
    }

    fn insert(&mut self, header: ObjectHeader) -> Result<ObjectId, RegistryError> {
        let gid = header.gid();
        if self.gid_index.contains_key(&gid) {
            return Err(RegistryError::DuplicateGid { gid });
        }
        let id = self.table.insert(header);
        self.gid_index.insert(gid, id);
        trace!("registered object {} as {}", gid, id);
        Ok(id)
    }

    fn header_of(&self, id: &ObjectId) -> &ObjectHeader {
        match self.table.get(id) {
            Some(record) => &record.header,
            None => panic!("Object {} does not exist in the object table", id),
        }
    }

    fn recycle(&mut self, mut list: Vec<Coupling>) {
        if !self.options.use_freelist || list.capacity() == 0 {
            return;
        }
        if self.freelist.len() < self.table.capacity() {
            list.clear();
            self.freelist.push(list);
        }
    }
}
