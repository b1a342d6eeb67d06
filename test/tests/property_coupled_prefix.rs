/// PROPERTY-BASED TESTS: coupled prefix invariants
///
/// Random sequences of registry mutations must keep:
/// 1. coupled objects exactly in front of the table
/// 2. at most one coupling per (object, process), holding the latest priority
/// 3. interface rebuilds reproducible on an unchanged table

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use ddd_shared::{
    DddConfig, InterfaceRegistry, ObjectId, ObjectRegistry, Priority, ProcId, RegistryError,
    TypeRegistry,
};
use ddd_test::assert_coupled_prefix;

const SIZE: u32 = 6;

#[derive(Clone, Debug)]
enum Op {
    Register { priority: Priority, attr: u32 },
    AddCoupling { object: usize, proc: ProcId, priority: Priority },
    DelCoupling { object: usize, proc: ProcId },
    Deregister { object: usize },
    SetPriority { object: usize, priority: Priority },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 0u32..3).prop_map(|(priority, attr)| Op::Register { priority, attr }),
        (any::<usize>(), 1..SIZE, 0u8..4).prop_map(|(object, proc, priority)| {
            Op::AddCoupling { object, proc, priority }
        }),
        (any::<usize>(), 1..SIZE).prop_map(|(object, proc)| Op::DelCoupling { object, proc }),
        any::<usize>().prop_map(|object| Op::Deregister { object }),
        (any::<usize>(), 0u8..4).prop_map(|(object, priority)| Op::SetPriority { object, priority }),
    ]
}

proptest! {
    #[test]
    fn prop_mutations_keep_coupled_prefix(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let mut types = TypeRegistry::new();
        let node = types.declare("node", 4).unwrap();
        let config = DddConfig {
            initial_object_capacity: 2,
            initial_coupling_capacity: 2,
            ..DddConfig::default()
        };
        let mut objects = ObjectRegistry::new(0, SIZE, &config);
        let mut live: Vec<ObjectId> = Vec::new();
        let mut model: HashMap<ObjectId, BTreeMap<ProcId, Priority>> = HashMap::new();

        for op in ops {
            match op {
                Op::Register { priority, attr } => {
                    let id = objects.register(&types, node, priority, attr).unwrap();
                    live.push(id);
                    model.insert(id, BTreeMap::new());
                }
                Op::AddCoupling { object, proc, priority } => {
                    if live.is_empty() { continue; }
                    let id = live[object % live.len()];
                    objects.add_coupling(&id, proc, priority).unwrap();
                    model.get_mut(&id).unwrap().insert(proc, priority);
                }
                Op::DelCoupling { object, proc } => {
                    if live.is_empty() { continue; }
                    let id = live[object % live.len()];
                    let expected = model.get_mut(&id).unwrap().remove(&proc);
                    match objects.try_del_coupling(&id, proc) {
                        Ok(coupling) => prop_assert_eq!(Some(coupling.priority()), expected),
                        Err(RegistryError::CouplingNotFound { proc: missing, .. }) => {
                            prop_assert_eq!(missing, proc);
                            prop_assert!(expected.is_none());
                        }
                        Err(other) => prop_assert!(false, "unexpected error {}", other),
                    }
                }
                Op::Deregister { object } => {
                    if live.is_empty() { continue; }
                    let id = live.swap_remove(object % live.len());
                    objects.deregister(&id).unwrap();
                    model.remove(&id);
                    prop_assert!(!objects.contains(&id));
                }
                Op::SetPriority { object, priority } => {
                    if live.is_empty() { continue; }
                    let id = live[object % live.len()];
                    objects.set_priority(&id, priority).unwrap();
                    prop_assert_eq!(objects.header(&id).unwrap().priority(), priority);
                }
            }
            assert_coupled_prefix(&objects);
        }

        prop_assert_eq!(objects.object_count(), live.len());
        for id in &live {
            let couplings: BTreeMap<ProcId, Priority> = objects
                .couplings(id)
                .unwrap()
                .iter()
                .map(|c| (c.proc(), c.priority()))
                .collect();
            prop_assert_eq!(&couplings, &model[id]);
        }

        let mut interfaces = InterfaceRegistry::new();
        interfaces.define(&types, &objects, &[node], &[0, 1], &[2, 3]).unwrap();
        interfaces.rebuild_all(&objects);
        let first: Vec<_> = interfaces.iter().cloned().collect();
        interfaces.rebuild_all(&objects);
        let second: Vec<_> = interfaces.iter().cloned().collect();
        prop_assert_eq!(first, second);
    }
}
