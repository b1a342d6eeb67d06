use crate::priority::merge::PrioMergePolicy;

/// Declaration of one distributed type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDesc {
    name: String,
    record_size: usize,
    merge_policy: PrioMergePolicy,
}

impl TypeDesc {
    pub(crate) fn new(name: &str, record_size: usize) -> Self {
        Self {
            name: name.to_string(),
            record_size,
            merge_policy: PrioMergePolicy::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte size of one record of this type, as packed by the application
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn merge_policy(&self) -> &PrioMergePolicy {
        &self.merge_policy
    }

    pub(crate) fn merge_policy_mut(&mut self) -> &mut PrioMergePolicy {
        &mut self.merge_policy
    }
}
