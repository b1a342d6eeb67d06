use crate::{registry::error::RegistryError, Gid, ProcId, MAX_GID_COUNTER};

/// Hands out GIDs built from a monotonically increasing counter salted with
/// the rank of this process. Counters are never recycled.
///
/// The limit never exceeds `MAX_GID_COUNTER`: larger counters would lose
/// their high bits and repeat earlier GIDs.
pub struct GidGenerator {
    rank: ProcId,
    next_counter: u64,
    limit: u64,
}

impl GidGenerator {
    pub fn new(rank: ProcId, limit: u64) -> Self {
        Self {
            rank,
            next_counter: 0,
            limit: limit.min(MAX_GID_COUNTER),
        }
    }

    pub fn generate(&mut self) -> Result<Gid, RegistryError> {
        if self.next_counter >= self.limit {
            return Err(RegistryError::GidOverflow {
                rank: self.rank,
                limit: self.limit,
            });
        }
        let gid = Gid::compose(self.next_counter, self.rank);
        self.next_counter += 1;
        Ok(gid)
    }

    pub fn issued(&self) -> u64 {
        self.next_counter
    }
}
