pub mod channel_registry;
pub mod error;
pub mod exchange;
pub mod poll;
pub mod transport;
