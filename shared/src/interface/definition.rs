use std::{collections::BTreeSet, fmt};

use crate::{DddType, Priority};

/// Index of an interface. Interface 0 is the standard interface spanning
/// all types and priorities.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct InterfaceId(u8);

impl InterfaceId {
    pub const STANDARD: InterfaceId = InterfaceId(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index as u8)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if#{}", self.0)
    }
}

/// Either every value, or an explicit set of them
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Selection<T> {
    pub fn contains(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(value),
        }
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "{{*}}"),
            Selection::Only(set) => {
                write!(f, "{{")?;
                for (index, value) in set.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// What an interface selects from the coupling set: objects of `types`
/// whose (local, remote) priorities land in (A, B) and/or (B, A)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceDef {
    pub(crate) name: String,
    pub(crate) types: Selection<DddType>,
    pub(crate) a: Selection<Priority>,
    pub(crate) b: Selection<Priority>,
}

impl InterfaceDef {
    pub(crate) fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            types: Selection::All,
            a: Selection::All,
            b: Selection::All,
        }
    }

    pub(crate) fn new(types: &[DddType], a: &[Priority], b: &[Priority]) -> Self {
        let types: BTreeSet<DddType> = types.iter().copied().collect();
        let name = types
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            name,
            types: Selection::Only(types),
            a: Selection::Only(a.iter().copied().collect()),
            b: Selection::Only(b.iter().copied().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &Selection<DddType> {
        &self.types
    }

    pub fn a(&self) -> &Selection<Priority> {
        &self.a
    }

    pub fn b(&self) -> &Selection<Priority> {
        &self.b
    }
}
