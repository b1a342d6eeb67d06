use std::collections::BTreeMap;

use crate::{is_valid_priority, priority::error::PrioMergeError, Priority, MAX_PRIO};

/// Default rule used when no explicit override matches a priority pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrioMergeMode {
    Maximum,
    Minimum,
}

/// Which of the two merged priorities prevailed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrioMergeResult {
    First,
    Second,
    /// Tie, or an override produced a third priority
    Unknown,
    Error,
}

/// Per-type conflict resolver. Overrides are keyed by `(max, min)` so that
/// the pair is symmetric in its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrioMergePolicy {
    mode: PrioMergeMode,
    overrides: BTreeMap<(Priority, Priority), Priority>,
}

impl PrioMergePolicy {
    pub fn new(mode: PrioMergeMode) -> Self {
        Self {
            mode,
            overrides: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> PrioMergeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PrioMergeMode) {
        self.mode = mode;
    }

    pub fn overrides(&self) -> impl Iterator<Item = (Priority, Priority, Priority)> + '_ {
        self.overrides.iter().map(|(&(high, low), &result)| (high, low, result))
    }

    /// Defines the outcome of merging `p1` with `p2`, in either order
    pub fn define(
        &mut self,
        p1: Priority,
        p2: Priority,
        result: Priority,
    ) -> Result<(), PrioMergeError> {
        for priority in [p1, p2, result] {
            if !is_valid_priority(priority) {
                return Err(PrioMergeError::InvalidPriority {
                    priority,
                    max: MAX_PRIO - 1,
                });
            }
        }
        self.overrides.insert(Self::key(p1, p2), result);
        Ok(())
    }

    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    pub fn merge(&self, p1: Priority, p2: Priority) -> (Priority, PrioMergeResult) {
        if !is_valid_priority(p1) || !is_valid_priority(p2) {
            return (p1, PrioMergeResult::Error);
        }

        let result = match self.overrides.get(&Self::key(p1, p2)) {
            Some(result) => *result,
            None => match self.mode {
                PrioMergeMode::Maximum => p1.max(p2),
                PrioMergeMode::Minimum => p1.min(p2),
            },
        };

        let outcome = match (result == p1, result == p2) {
            (true, false) => PrioMergeResult::First,
            (false, true) => PrioMergeResult::Second,
            _ => PrioMergeResult::Unknown,
        };

        (result, outcome)
    }

    fn key(p1: Priority, p2: Priority) -> (Priority, Priority) {
        (p1.max(p2), p1.min(p2))
    }
}

impl Default for PrioMergePolicy {
    fn default() -> Self {
        Self::new(PrioMergeMode::Maximum)
    }
}
