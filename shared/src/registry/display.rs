use std::fmt;

use crate::registry::ObjectRegistry;

/// Dump of the object table in table order, coupled objects first
pub struct RegistryDisplay<'a> {
    objects: &'a ObjectRegistry,
}

impl<'a> RegistryDisplay<'a> {
    pub fn new(objects: &'a ObjectRegistry) -> Self {
        Self { objects }
    }
}

impl fmt::Display for RegistryDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objects = self.objects;
        writeln!(
            f,
            "| process {}: {} objects, {} coupled, {} couplings",
            objects.rank(),
            objects.object_count(),
            objects.coupled_count(),
            objects.total_couplings()
        )?;
        for (id, header, couplings) in objects.objects() {
            write!(
                f,
                "| {:>6} gid {} {} prio {} attr {}",
                header.table_index(),
                header.gid(),
                header.ddd_type(),
                header.priority(),
                header.attr()
            )?;
            if !couplings.is_empty() {
                write!(f, " cpl")?;
                for coupling in couplings {
                    write!(f, " {}/{}", coupling.proc(), coupling.priority())?;
                }
            }
            writeln!(f, " ({})", id)?;
        }
        Ok(())
    }
}
