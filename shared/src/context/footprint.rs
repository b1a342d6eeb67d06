use std::fmt;

use crate::comm::transport::{ReduceOp, Transport};
use crate::comm::error::TransportError;

/// Bytes held by the tables of one context
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryFootprint {
    pub objects: usize,
    pub couplings: usize,
    pub interfaces: usize,
}

impl MemoryFootprint {
    pub fn total(&self) -> usize {
        self.objects + self.couplings + self.interfaces
    }

    pub(crate) fn reduce<T: Transport>(
        &self,
        transport: &mut T,
        op: ReduceOp,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            objects: transport.reduce_u64(op, self.objects as u64)? as usize,
            couplings: transport.reduce_u64(op, self.couplings as u64)? as usize,
            interfaces: transport.reduce_u64(op, self.interfaces as u64)? as usize,
        })
    }
}

impl fmt::Display for MemoryFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "objects {} B, couplings {} B, interfaces {} B, total {} B",
            self.objects,
            self.couplings,
            self.interfaces,
            self.total()
        )
    }
}

/// Footprint summed over and maximized across all processes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalFootprint {
    pub sum: MemoryFootprint,
    pub max: MemoryFootprint,
}

impl fmt::Display for GlobalFootprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sum: {}", self.sum)?;
        write!(f, "max: {}", self.max)
    }
}
