/// Integration tests for the cross-process consistency checks

use ddd_shared::{DddConfig, DddOption, InterfaceId, ProcId};
use ddd_test::{register_shared, run_spmd, run_spmd_with};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn mirrored_couplings_pass_both_checks() {
    init();
    let results = run_spmd(3, |ddd| {
        let me = ddd.rank();
        let node = ddd.declare_type("node", 4).unwrap();
        for index in 0..20u32 {
            let id = register_shared(ddd, index % 3, node, (me + index) as u8 % 4, index);
            for other in (0..3).filter(|other| *other != me) {
                ddd.add_coupling(&id, other, (other + index) as u8 % 4).unwrap();
            }
        }
        ddd.define_interface(&[node], &[0, 1], &[2, 3]).unwrap();
        (ddd.check_couplings().unwrap(), ddd.check_interfaces().unwrap())
    });
    assert_eq!(results, vec![(0, 0); 3]);
}

#[test]
fn one_sided_coupling_is_found_on_both_ends() {
    init();
    let results = run_spmd(2, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let id = register_shared(ddd, 0, node, 1, 0);
        if ddd.rank() == 0 {
            ddd.add_coupling(&id, 1, 1).unwrap();
        }
        (ddd.check_couplings().unwrap(), ddd.check_interfaces().unwrap())
    });
    // process 1 misses the coupling back, process 0 never hears about its own;
    // the standard interface counts one ABA item on process 0 only
    assert_eq!(results, vec![(2, 2), (2, 2)]);
}

#[test]
fn coupling_to_missing_object_is_an_error() {
    init();
    let results = run_spmd(2, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let id = ddd.register(node, 1, 0).unwrap();
        if ddd.rank() == 0 {
            ddd.add_coupling(&id, 1, 1).unwrap();
        }
        ddd.check_couplings().unwrap()
    });
    assert_eq!(results, vec![2, 2]);
}

#[test]
fn stale_remote_priority_is_reported_by_both_processes() {
    init();
    let priority = |rank: ProcId| if rank == 0 { 2 } else { 3 };
    let results = run_spmd(2, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let me = ddd.rank();
        let other = 1 - me;
        let id = register_shared(ddd, 0, node, priority(me), 0);
        ddd.add_coupling(&id, other, priority(other)).unwrap();
        let consistent = ddd.check_couplings().unwrap();

        // process 1 changes its priority without telling process 0
        if me == 1 {
            ddd.set_priority(&id, 5).unwrap();
        }
        (consistent, ddd.check_couplings().unwrap())
    });
    assert_eq!(results, vec![(0, 2), (0, 2)]);
}

#[test]
fn quiet_check_still_counts() {
    init();
    let config = |_: ProcId| DddConfig::default().with_option(DddOption::QuietConsistencyCheck, true);
    let results = run_spmd_with(2, config, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let id = register_shared(ddd, 0, node, 1, 0);
        if ddd.rank() == 1 {
            ddd.add_coupling(&id, 0, 1).unwrap();
        }
        ddd.check_couplings().unwrap()
    });
    assert_eq!(results, vec![2, 2]);
}

#[test]
fn interface_check_without_couplings_is_clean() {
    init();
    let results = run_spmd(4, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        ddd.define_interface(&[node], &[0], &[1]).unwrap();
        assert_eq!(ddd.interface(InterfaceId::STANDARD).unwrap().len(), 0);
        ddd.check_interfaces().unwrap()
    });
    assert_eq!(results, vec![0; 4]);
}
