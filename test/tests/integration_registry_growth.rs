/// Integration tests for table growth and the coupled prefix under load

use ddd_shared::{DddConfig, DddOption, ObjectId, ObjectRegistry, RegistryError, TypeRegistry};
use ddd_test::assert_coupled_prefix;

fn setup(size: u32, capacity: usize) -> (TypeRegistry, ObjectRegistry, ddd_shared::DddType) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut types = TypeRegistry::new();
    let node = types.declare("node", 8).unwrap();
    let config = DddConfig {
        initial_object_capacity: capacity,
        initial_coupling_capacity: capacity,
        ..DddConfig::default()
    };
    (types, ObjectRegistry::new(0, size, &config), node)
}

#[test]
fn three_hundred_couplings_grow_the_tables() {
    let (types, mut objects, node) = setup(4, 16);
    let ids: Vec<ObjectId> = (0..100)
        .map(|attr| objects.register(&types, node, 0, attr).unwrap())
        .collect();
    for (index, id) in ids.iter().enumerate() {
        for proc in 1..4 {
            objects
                .add_coupling(id, proc, ((index as u32 + proc) % 5) as u8)
                .unwrap();
        }
    }

    assert!(objects.growth_events() >= 1);
    assert!(objects.coupling_threshold() >= 300);
    assert!(objects.object_capacity() >= 100);
    assert_eq!(objects.total_couplings(), 300);
    assert_eq!(objects.coupled_count(), 100);
    for (index, id) in ids.iter().enumerate() {
        for proc in 1..4 {
            assert_eq!(
                objects.coupling_priority(id, proc),
                Some(((index as u32 + proc) % 5) as u8)
            );
        }
    }
    assert_coupled_prefix(&objects);
}

#[test]
fn removing_only_coupling_shrinks_prefix_by_one() {
    let (types, mut objects, node) = setup(3, 4);
    let ids: Vec<ObjectId> = (0..10)
        .map(|attr| objects.register(&types, node, 0, attr).unwrap())
        .collect();
    for id in ids.iter().step_by(2) {
        objects.add_coupling(id, 1, 0).unwrap();
    }
    objects.add_coupling(&ids[4], 2, 0).unwrap();
    assert_eq!(objects.coupled_count(), 5);

    objects.del_coupling(&ids[2], 1);
    assert_eq!(objects.coupled_count(), 4);
    assert_coupled_prefix(&objects);

    // one of two couplings: stays coupled
    objects.del_coupling(&ids[4], 1);
    assert_eq!(objects.coupled_count(), 4);
    assert!(objects.has_coupling(&ids[4]));
    assert_coupled_prefix(&objects);
}

#[test]
fn deregistered_handles_go_stale() {
    let (types, mut objects, node) = setup(2, 4);
    let first = objects.register(&types, node, 0, 0).unwrap();
    objects.add_coupling(&first, 1, 0).unwrap();
    let gid = objects.header(&first).unwrap().gid();
    objects.deregister(&first).unwrap();

    // the slot is reused by the next object, the old handle stays invalid
    let second = objects.register(&types, node, 0, 0).unwrap();
    assert_ne!(first, second);
    assert_eq!(
        objects.header(&first),
        Err(RegistryError::UnknownObject { object: first })
    );
    assert_eq!(objects.find_by_gid(&gid), None);
    assert_eq!(objects.coupled_count(), 0);
    assert_coupled_prefix(&objects);
}

#[test]
fn freelist_can_be_switched_off() {
    let (types, mut objects, node) = setup(2, 4);
    let mut options = DddConfig::default().options;
    options.set(DddOption::UseFreelist, false);
    objects.set_options(options);

    let id = objects.register(&types, node, 0, 0).unwrap();
    objects.add_coupling(&id, 1, 0).unwrap();
    let (_, with_couplings) = objects.memory_usage();
    assert!(with_couplings > 0);
    objects.del_coupling(&id, 1);
    let (_, after) = objects.memory_usage();
    assert_eq!(after, 0);
    assert_coupled_prefix(&objects);
}

#[test]
fn freelist_keeps_emptied_lists_accounted() {
    let (types, mut objects, node) = setup(2, 4);
    let id = objects.register(&types, node, 0, 0).unwrap();
    objects.add_coupling(&id, 1, 0).unwrap();
    let (_, with_couplings) = objects.memory_usage();
    objects.del_coupling(&id, 1);
    let (_, after) = objects.memory_usage();
    assert_eq!(with_couplings, after);
}
