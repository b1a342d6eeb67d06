pub mod error;
pub mod merge;
