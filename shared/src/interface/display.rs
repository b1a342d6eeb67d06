use std::fmt;

use crate::interface::descriptor::{IfDirection, Interface};

/// Human-readable dump of an interface descriptor
pub struct InterfaceDisplay<'a> {
    interface: &'a Interface,
    verbose: bool,
}

impl<'a> InterfaceDisplay<'a> {
    pub fn new(interface: &'a Interface) -> Self {
        Self {
            interface,
            verbose: false,
        }
    }

    /// Also list every entry
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl fmt::Display for InterfaceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interface = self.interface;
        let def = interface.def();
        writeln!(
            f,
            "| {} \"{}\": types {}, A {}, B {}, {} items",
            interface.id(),
            def.name(),
            def.types(),
            def.a(),
            def.b(),
            interface.len()
        )?;
        for bucket in interface.procs() {
            writeln!(
                f,
                "|   proc {:>4}: {:>6} items (AB {}, BA {}, ABA {})",
                bucket.proc(),
                bucket.len(),
                bucket.count(IfDirection::AB),
                bucket.count(IfDirection::BA),
                bucket.count(IfDirection::ABA)
            )?;
            for attr in bucket.attrs() {
                writeln!(
                    f,
                    "|     attr {:>6}: AB {:?} BA {:?} ABA {:?}",
                    attr.attr(),
                    attr.range(IfDirection::AB),
                    attr.range(IfDirection::BA),
                    attr.range(IfDirection::ABA)
                )?;
            }
            if self.verbose {
                for entry in bucket.entries() {
                    writeln!(
                        f,
                        "|       gid {} {:<3} attr {} prio {} -> {}",
                        entry.gid(),
                        entry.direction().as_str(),
                        entry.attr(),
                        entry.local_priority(),
                        entry.remote_priority()
                    )?;
                }
            }
        }
        Ok(())
    }
}
