pub mod builder;
pub mod definition;
pub mod descriptor;
pub mod display;
pub mod error;

use log::debug;

use crate::{
    is_valid_priority, registry::ObjectRegistry, type_registry::TypeRegistry, DddType, Priority,
    MAX_INTERFACES, MAX_PRIO,
};

use self::{
    definition::{InterfaceDef, InterfaceId},
    descriptor::Interface,
    error::InterfaceError,
};

/// All interfaces defined on this process. Interface 0 is the standard
/// interface and always exists.
pub struct InterfaceRegistry {
    interfaces: Vec<Interface>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self {
            interfaces: vec![Interface::new(InterfaceId::STANDARD, InterfaceDef::standard())],
        }
    }

    /// Defines an interface over `types` with priority sets `a` and `b`, and builds it
    pub fn define(
        &mut self,
        types: &TypeRegistry,
        objects: &ObjectRegistry,
        type_list: &[DddType],
        a: &[Priority],
        b: &[Priority],
    ) -> Result<InterfaceId, InterfaceError> {
        if self.interfaces.len() >= MAX_INTERFACES {
            return Err(InterfaceError::TooManyInterfaces);
        }
        if type_list.is_empty() {
            return Err(InterfaceError::EmptyTypeSet);
        }
        if let Some(ddd_type) = type_list.iter().find(|t| !types.contains(**t)) {
            return Err(InterfaceError::UnknownType {
                ddd_type: *ddd_type,
            });
        }
        if let Some(priority) = a.iter().chain(b.iter()).find(|p| !is_valid_priority(**p)) {
            return Err(InterfaceError::InvalidPriority {
                priority: *priority,
                max: MAX_PRIO - 1,
            });
        }

        let id = InterfaceId::new(self.interfaces.len());
        self.interfaces
            .push(Interface::new(id, InterfaceDef::new(type_list, a, b)));
        self.rebuild(id, objects)?;
        Ok(id)
    }

    pub fn set_name(&mut self, id: InterfaceId, name: &str) -> Result<(), InterfaceError> {
        let interface = self
            .interfaces
            .get_mut(id.index())
            .ok_or(InterfaceError::UnknownInterface { id })?;
        interface.def.name = name.to_string();
        Ok(())
    }

    pub fn get(&self, id: InterfaceId) -> Result<&Interface, InterfaceError> {
        self.interfaces
            .get(id.index())
            .ok_or(InterfaceError::UnknownInterface { id })
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    /// Whether couplings changed since the interface was last built
    pub fn is_stale(&self, id: InterfaceId, objects: &ObjectRegistry) -> Result<bool, InterfaceError> {
        Ok(self.get(id)?.built_revision != Some(objects.revision()))
    }

    pub fn rebuild(&mut self, id: InterfaceId, objects: &ObjectRegistry) -> Result<(), InterfaceError> {
        let interface = self
            .interfaces
            .get_mut(id.index())
            .ok_or(InterfaceError::UnknownInterface { id })?;
        interface.procs = builder::build(&interface.def, objects);
        interface.built_revision = Some(objects.revision());
        debug!(
            "rebuilt {} \"{}\": {} items over {} processes",
            id,
            interface.def.name,
            interface.len(),
            interface.procs.len()
        );
        Ok(())
    }

    /// Rebuilds every interface, the standard one included
    pub fn rebuild_all(&mut self, objects: &ObjectRegistry) {
        for index in 0..self.interfaces.len() {
            let id = InterfaceId::new(index);
            if let Err(error) = self.rebuild(id, objects) {
                panic!("Interface {} vanished during rebuild: {}", id, error);
            }
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.interfaces.iter().map(|i| i.memory_usage()).sum()
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
