pub mod error;
pub mod footprint;

use log::{debug, info, warn};

use crate::{
    comm::{
        channel_registry::ChannelRegistry,
        error::{ChannelError, CommError, TransportError},
        exchange::{ExchangeEngine, ExchangeHandler, ExchangeStats, FnHandler, IfItem},
        transport::{ReduceOp, Transport},
    },
    config::{DddConfig, DddOption},
    consistency::ConsistencyChecker,
    interface::{
        definition::InterfaceId,
        descriptor::{Direction, IfSelection, Interface},
        display::InterfaceDisplay,
        error::InterfaceError,
        InterfaceRegistry,
    },
    priority::{
        error::PrioMergeError,
        merge::{PrioMergeMode, PrioMergeResult},
    },
    registry::{
        coupling::Coupling, display::RegistryDisplay, error::RegistryError,
        object_header::ObjectHeader, ObjectRegistry,
    },
    type_registry::{error::TypeError, type_desc::TypeDesc, TypeRegistry},
    Attr, DddType, Gid, ObjectId, Priority, ProcId, MAX_GID_COUNTER, PROC_BITS_IN_GID,
};

use self::{
    error::DddError,
    footprint::{GlobalFootprint, MemoryFootprint},
};

/// One process's view of the distributed object set: declared types, local
/// objects with their couplings, interfaces over them, and the channels to
/// the other processes of the group.
///
/// Every process of the group creates its context with a transport of the
/// same group, and calls the collective operations (`exchange*`, `oneway*`,
/// `check_*`, `global_memory_footprint`) in the same order.
pub struct Ddd<T: Transport> {
    config: DddConfig,
    transport: T,
    types: TypeRegistry,
    objects: ObjectRegistry,
    interfaces: InterfaceRegistry,
    channels: ChannelRegistry,
    engine: ExchangeEngine,
}

impl<T: Transport> Ddd<T> {
    /// Creates a context. Collective: rank 0's retry budget is adopted by
    /// every process.
    pub fn new(mut transport: T, config: DddConfig) -> Result<Self, DddError> {
        let rank = transport.rank();
        let size = transport.size();
        let max_size = 1u64 << PROC_BITS_IN_GID;
        if size as u64 > max_size {
            return Err(DddError::GroupTooLarge {
                size,
                max: max_size,
            });
        }
        if rank >= size {
            return Err(DddError::InvalidRank { rank, size });
        }
        if config.gid_counter_limit > MAX_GID_COUNTER {
            return Err(DddError::GidCounterLimit {
                limit: config.gid_counter_limit,
                max: MAX_GID_COUNTER,
            });
        }

        let max_poll_retries = transport.broadcast_u64(0, config.max_poll_retries)?;
        if max_poll_retries != config.max_poll_retries {
            debug!(
                "process {} adopts retry budget {} of process 0 (configured: {})",
                rank, max_poll_retries, config.max_poll_retries
            );
        }

        let objects = ObjectRegistry::new(rank, size, &config);
        let mut interfaces = InterfaceRegistry::new();
        interfaces.rebuild_all(&objects);

        info!("ddd context on process {} of {}", rank, size);
        Ok(Self {
            config,
            transport,
            types: TypeRegistry::new(),
            objects,
            interfaces,
            channels: ChannelRegistry::new(),
            engine: ExchangeEngine::new(max_poll_retries),
        })
    }

    pub fn rank(&self) -> ProcId {
        self.transport.rank()
    }

    pub fn size(&self) -> u32 {
        self.transport.size()
    }

    pub fn config(&self) -> &DddConfig {
        &self.config
    }

    /// Retry budget agreed on by the group
    pub fn max_poll_retries(&self) -> u64 {
        self.engine.max_poll_retries()
    }

    pub fn option(&self, option: DddOption) -> bool {
        self.config.options.get(option)
    }

    pub fn set_option(&mut self, option: DddOption, value: bool) {
        self.config.options.set(option, value);
        self.objects.set_options(self.config.options);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // Types

    pub fn declare_type(&mut self, name: &str, record_size: usize) -> Result<DddType, TypeError> {
        self.types.declare(name, record_size)
    }

    pub fn type_info(&self, ddd_type: DddType) -> Result<&TypeDesc, TypeError> {
        self.types.get(ddd_type)
    }

    pub fn set_prio_merge_mode(
        &mut self,
        ddd_type: DddType,
        mode: PrioMergeMode,
    ) -> Result<(), PrioMergeError> {
        self.types.set_prio_merge_mode(ddd_type, mode)
    }

    pub fn define_prio_merge(
        &mut self,
        ddd_type: DddType,
        p1: Priority,
        p2: Priority,
        result: Priority,
    ) -> Result<(), PrioMergeError> {
        self.types.define_prio_merge(ddd_type, p1, p2, result)
    }

    pub fn prio_merge(
        &self,
        ddd_type: DddType,
        p1: Priority,
        p2: Priority,
    ) -> (Priority, PrioMergeResult) {
        self.types.prio_merge(ddd_type, p1, p2)
    }

    // Objects and couplings

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn register(
        &mut self,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
    ) -> Result<ObjectId, RegistryError> {
        self.objects.register(&self.types, ddd_type, priority, attr)
    }

    pub fn register_sized(
        &mut self,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
        record_size: usize,
    ) -> Result<ObjectId, RegistryError> {
        self.objects
            .register_sized(&self.types, ddd_type, priority, attr, record_size)
    }

    /// Registers a local replica of an object first registered on another process
    pub fn register_replica(
        &mut self,
        gid: Gid,
        ddd_type: DddType,
        priority: Priority,
        attr: Attr,
    ) -> Result<ObjectId, RegistryError> {
        self.objects
            .register_replica(&self.types, gid, ddd_type, priority, attr)
    }

    pub fn deregister(&mut self, id: &ObjectId) -> Result<ObjectHeader, RegistryError> {
        self.objects.deregister(id)
    }

    pub fn set_priority(&mut self, id: &ObjectId, priority: Priority) -> Result<Priority, RegistryError> {
        self.objects.set_priority(id, priority)
    }

    /// See [`ObjectRegistry::add_coupling`]
    pub fn add_coupling(
        &mut self,
        id: &ObjectId,
        proc: ProcId,
        priority: Priority,
    ) -> Result<Coupling, RegistryError> {
        self.objects.add_coupling(id, proc, priority)
    }

    pub fn try_mod_coupling(
        &mut self,
        id: &ObjectId,
        proc: ProcId,
        priority: Priority,
    ) -> Result<(), RegistryError> {
        self.objects.try_mod_coupling(id, proc, priority)
    }

    pub fn mod_coupling(&mut self, id: &ObjectId, proc: ProcId, priority: Priority) {
        self.objects.mod_coupling(id, proc, priority)
    }

    pub fn try_del_coupling(&mut self, id: &ObjectId, proc: ProcId) -> Result<Coupling, RegistryError> {
        self.objects.try_del_coupling(id, proc)
    }

    pub fn del_coupling(&mut self, id: &ObjectId, proc: ProcId) -> Coupling {
        self.objects.del_coupling(id, proc)
    }

    // Interfaces

    pub fn define_interface(
        &mut self,
        types: &[DddType],
        a: &[Priority],
        b: &[Priority],
    ) -> Result<InterfaceId, InterfaceError> {
        let id = self
            .interfaces
            .define(&self.types, &self.objects, types, a, b)?;
        debug!("defined {} \"{}\"", id, self.interfaces.get(id)?.def().name());
        Ok(id)
    }

    pub fn set_interface_name(&mut self, id: InterfaceId, name: &str) -> Result<(), InterfaceError> {
        self.interfaces.set_name(id, name)
    }

    /// The interface as last built, which may predate recent coupling changes
    pub fn interface(&self, id: InterfaceId) -> Result<&Interface, InterfaceError> {
        self.interfaces.get(id)
    }

    pub fn is_interface_stale(&self, id: InterfaceId) -> Result<bool, InterfaceError> {
        self.interfaces.is_stale(id, &self.objects)
    }

    pub fn rebuild_interface(&mut self, id: InterfaceId) -> Result<(), InterfaceError> {
        self.interfaces.rebuild(id, &self.objects)
    }

    pub fn rebuild_all(&mut self) {
        self.interfaces.rebuild_all(&self.objects);
    }

    // Communication

    /// Exchanges one record of `item_size` bytes per interface member in
    /// both directions (AB, BA and ABA items alike).
    pub fn exchange<G, S>(
        &mut self,
        id: InterfaceId,
        item_size: usize,
        gather: G,
        scatter: S,
    ) -> Result<ExchangeStats, CommError>
    where
        G: FnMut(&ObjectHeader, &mut [u8]),
        S: FnMut(&ObjectHeader, &[u8]),
    {
        let mut handler = FnHandler::new(gather, scatter);
        self.run_exchange(id, IfSelection::All, item_size, &mut handler)
    }

    /// `exchange` with callbacks that also see the remote process and priority
    pub fn exchange_x<H: ExchangeHandler>(
        &mut self,
        id: InterfaceId,
        item_size: usize,
        handler: &mut H,
    ) -> Result<ExchangeStats, CommError> {
        self.run_exchange(id, IfSelection::All, item_size, handler)
    }

    /// Sends along one direction of the interface only: `Forward` sends AB
    /// and ABA items and receives BA and ABA items, `Backward` the reverse.
    pub fn oneway<G, S>(
        &mut self,
        id: InterfaceId,
        direction: Direction,
        item_size: usize,
        gather: G,
        scatter: S,
    ) -> Result<ExchangeStats, CommError>
    where
        G: FnMut(&ObjectHeader, &mut [u8]),
        S: FnMut(&ObjectHeader, &[u8]),
    {
        let mut handler = FnHandler::new(gather, scatter);
        self.run_exchange(id, IfSelection::Oneway(direction), item_size, &mut handler)
    }

    pub fn oneway_x<H: ExchangeHandler>(
        &mut self,
        id: InterfaceId,
        direction: Direction,
        item_size: usize,
        handler: &mut H,
    ) -> Result<ExchangeStats, CommError> {
        self.run_exchange(id, IfSelection::Oneway(direction), item_size, handler)
    }

    /// `exchange` restricted to the members with attribute `attr`
    pub fn exchange_attr<G, S>(
        &mut self,
        id: InterfaceId,
        attr: Attr,
        item_size: usize,
        gather: G,
        scatter: S,
    ) -> Result<ExchangeStats, CommError>
    where
        G: FnMut(&ObjectHeader, &mut [u8]),
        S: FnMut(&ObjectHeader, &[u8]),
    {
        let mut handler = FnHandler::new(gather, scatter);
        self.run_exchange(id, IfSelection::Attr(attr), item_size, &mut handler)
    }

    /// Calls `callback` for every interface member, in canonical order.
    /// An object coupled with several processes is visited once per process.
    pub fn execute_local<F>(&mut self, id: InterfaceId, mut callback: F) -> Result<usize, CommError>
    where
        F: FnMut(&ObjectHeader),
    {
        self.execute_local_x(id, |item| callback(item.header))
    }

    pub fn execute_local_x<F>(&mut self, id: InterfaceId, callback: F) -> Result<usize, CommError>
    where
        F: FnMut(&IfItem<'_>),
    {
        self.refresh(id)?;
        let interface = self.interfaces.get(id)?;
        ExchangeEngine::execute_local(&self.objects, interface, IfSelection::All, callback)
    }

    fn run_exchange<H: ExchangeHandler>(
        &mut self,
        id: InterfaceId,
        selection: IfSelection,
        item_size: usize,
        handler: &mut H,
    ) -> Result<ExchangeStats, CommError> {
        self.refresh(id)?;
        let interface = self.interfaces.get(id)?;
        self.engine.exchange(
            &mut self.transport,
            &mut self.channels,
            &self.objects,
            interface,
            selection,
            item_size,
            handler,
        )
    }

    /// Brings the interface up to date before use, unless rebuilding is
    /// left to explicit calls
    fn refresh(&mut self, id: InterfaceId) -> Result<(), InterfaceError> {
        if !self.interfaces.is_stale(id, &self.objects)? {
            return Ok(());
        }
        if self.config.options.create_interfaces_explicitly {
            warn!(
                "{} is used although couplings changed since its last rebuild",
                id
            );
            Ok(())
        } else {
            self.interfaces.rebuild(id, &self.objects)
        }
    }

    fn refresh_all(&mut self) -> Result<(), InterfaceError> {
        let ids: Vec<InterfaceId> = self.interfaces.iter().map(|i| i.id()).collect();
        for id in ids {
            self.refresh(id)?;
        }
        Ok(())
    }

    // Diagnostics

    /// Dump of the interface as last built, also logged with `info!`
    pub fn display_interface(&self, id: InterfaceId) -> Result<InterfaceDisplay<'_>, InterfaceError> {
        let display = InterfaceDisplay::new(self.interfaces.get(id)?);
        info!("{}", display);
        Ok(display)
    }

    /// Dump of every interface, also logged with `info!`
    pub fn display_all_interfaces(&self) -> String {
        let dump: String = self
            .interfaces
            .iter()
            .map(|interface| InterfaceDisplay::new(interface).to_string())
            .collect();
        info!("interfaces of process {}:\n{}", self.rank(), dump);
        dump
    }

    pub fn display_couplings(&self) -> RegistryDisplay<'_> {
        RegistryDisplay::new(&self.objects)
    }

    /// Compares interface item counts with every other process. Collective;
    /// returns the number of disagreements found on all processes.
    pub fn check_interfaces(&mut self) -> Result<usize, CommError> {
        self.refresh_all()?;
        let checker = self.checker();
        let mismatches =
            checker.check_interfaces(&mut self.transport, &mut self.channels, &self.interfaces)?;
        if mismatches > 0 {
            warn!("interface check found {} disagreements", mismatches);
        }
        Ok(mismatches)
    }

    /// Verifies every coupling against the process it names. Collective;
    /// returns the number of errors found on all processes.
    pub fn check_couplings(&mut self) -> Result<usize, CommError> {
        let checker = self.checker();
        let errors =
            checker.check_couplings(&mut self.transport, &mut self.channels, &self.objects)?;
        if errors > 0 {
            warn!("coupling check found {} errors", errors);
        }
        Ok(errors)
    }

    pub fn memory_footprint(&self) -> MemoryFootprint {
        let (objects, couplings) = self.objects.memory_usage();
        MemoryFootprint {
            objects,
            couplings,
            interfaces: self.interfaces.memory_usage(),
        }
    }

    /// Collective
    pub fn global_memory_footprint(&mut self) -> Result<GlobalFootprint, TransportError> {
        let local = self.memory_footprint();
        let footprint = GlobalFootprint {
            sum: local.reduce(&mut self.transport, ReduceOp::Sum)?,
            max: local.reduce(&mut self.transport, ReduceOp::Max)?,
        };
        info!("memory footprint of the group:\n{}", footprint);
        Ok(footprint)
    }

    fn checker(&self) -> ConsistencyChecker {
        ConsistencyChecker::new(
            self.engine.max_poll_retries(),
            self.config.options.quiet_consistency_check,
        )
    }

    /// Closes every channel opened so far. Channels are reopened on demand.
    pub fn close_channels(&mut self) -> Result<(), ChannelError> {
        self.channels.close_all(&mut self.transport)
    }

    /// Closes every channel and hands back the transport
    pub fn shutdown(mut self) -> Result<T, ChannelError> {
        self.close_channels()?;
        debug!("ddd context on process {} shut down", self.rank());
        Ok(self.transport)
    }
}
