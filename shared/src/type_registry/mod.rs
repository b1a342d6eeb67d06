pub mod error;
pub mod type_desc;

use log::debug;

use crate::{
    priority::{
        error::PrioMergeError,
        merge::{PrioMergeMode, PrioMergeResult},
    },
    DddType, Priority, MAX_TYPES,
};

use self::{error::TypeError, type_desc::TypeDesc};

/// Table of distributed types declared by the application
pub struct TypeRegistry {
    types: Vec<TypeDesc>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    pub fn declare(&mut self, name: &str, record_size: usize) -> Result<DddType, TypeError> {
        if self.types.len() >= MAX_TYPES {
            return Err(TypeError::TooManyTypes {
                name: name.to_string(),
            });
        }
        if record_size == 0 {
            return Err(TypeError::ZeroRecordSize {
                name: name.to_string(),
            });
        }

        let ddd_type = DddType::new(self.types.len());
        self.types.push(TypeDesc::new(name, record_size));
        debug!("declared {} '{}' with record size {}", ddd_type, name, record_size);
        Ok(ddd_type)
    }

    pub fn get(&self, ddd_type: DddType) -> Result<&TypeDesc, TypeError> {
        self.types
            .get(ddd_type.index())
            .ok_or(TypeError::UnknownType { ddd_type })
    }

    pub fn contains(&self, ddd_type: DddType) -> bool {
        ddd_type.index() < self.types.len()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DddType, &TypeDesc)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, desc)| (DddType::new(index), desc))
    }

    pub fn set_prio_merge_mode(
        &mut self,
        ddd_type: DddType,
        mode: PrioMergeMode,
    ) -> Result<(), PrioMergeError> {
        let desc = self
            .types
            .get_mut(ddd_type.index())
            .ok_or(PrioMergeError::UnknownType { ddd_type })?;
        desc.merge_policy_mut().set_mode(mode);
        Ok(())
    }

    pub fn define_prio_merge(
        &mut self,
        ddd_type: DddType,
        p1: Priority,
        p2: Priority,
        result: Priority,
    ) -> Result<(), PrioMergeError> {
        let desc = self
            .types
            .get_mut(ddd_type.index())
            .ok_or(PrioMergeError::UnknownType { ddd_type })?;
        desc.merge_policy_mut().define(p1, p2, result)
    }

    /// Resolves two conflicting replica priorities of `ddd_type`
    pub fn prio_merge(
        &self,
        ddd_type: DddType,
        p1: Priority,
        p2: Priority,
    ) -> (Priority, PrioMergeResult) {
        match self.types.get(ddd_type.index()) {
            Some(desc) => desc.merge_policy().merge(p1, p2),
            None => (p1, PrioMergeResult::Error),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
