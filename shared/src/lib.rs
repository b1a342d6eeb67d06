//! # DDD Shared
//! Registry of distributed object replicas and the couplings between them,
//! with interface-driven bulk communication between the processes of a group.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod config;
mod consistency;
mod context;
mod types;

pub mod comm;
pub mod interface;
pub mod priority;
pub mod registry;
pub mod type_registry;

pub use comm::{
    channel_registry::ChannelRegistry,
    error::{ChannelError, CommError, TransportError},
    exchange::{ExchangeEngine, ExchangeHandler, ExchangeStats, FnHandler, IfItem},
    transport::{Channel, ChannelKind, PendingConnect, RecvHandle, ReduceOp, SendHandle, Transport},
};
pub use config::{DddConfig, DddOption, Options};
pub use consistency::ConsistencyChecker;
pub use context::{
    error::DddError,
    footprint::{GlobalFootprint, MemoryFootprint},
    Ddd,
};
pub use interface::{
    definition::{InterfaceDef, InterfaceId, Selection},
    descriptor::{
        Direction, IfAttrBucket, IfDirection, IfEntry, IfProcBucket, IfSelection, Interface,
    },
    display::InterfaceDisplay,
    error::InterfaceError,
    InterfaceRegistry,
};
pub use priority::{
    error::PrioMergeError,
    merge::{PrioMergeMode, PrioMergePolicy, PrioMergeResult},
};
pub use registry::{
    coupling::Coupling, display::RegistryDisplay, error::RegistryError,
    gid_generator::GidGenerator, object_header::ObjectHeader, ObjectRegistry,
};
pub use type_registry::{error::TypeError, type_desc::TypeDesc, TypeRegistry};
pub use types::{
    is_valid_priority, Attr, DddType, Gid, ObjectId, Priority, ProcId, MAX_GID_COUNTER,
    MAX_INTERFACES, MAX_PRIO, MAX_TYPES, PROC_BITS_IN_GID,
};
