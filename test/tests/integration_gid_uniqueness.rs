/// Integration tests for GID assignment across a process group

use std::collections::HashSet;

use ddd_shared::{Ddd, DddConfig, DddError, Gid, ReduceOp, Transport, MAX_GID_COUNTER};
use ddd_test::{register_shared, run_spmd, LocalHub};

const PROCS: u32 = 4;
const PER_PROC: usize = 25;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn every_process_mints_distinct_gids() {
    init();
    let minted = run_spmd(PROCS, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let gids: Vec<Gid> = (0..PER_PROC)
            .map(|_| {
                let id = ddd.register(node, 0, 0).unwrap();
                ddd.objects().header(&id).unwrap().gid()
            })
            .collect();
        let total = ddd
            .transport_mut()
            .reduce_u64(ReduceOp::Sum, gids.len() as u64)
            .unwrap();
        assert_eq!(total, (PROCS as usize * PER_PROC) as u64);
        (ddd.rank(), gids)
    });

    let mut seen = HashSet::new();
    for (rank, gids) in &minted {
        for gid in gids {
            assert_eq!(gid.origin(), *rank);
            assert!(seen.insert(*gid), "gid {} minted twice", gid);
        }
    }
    assert_eq!(seen.len(), PROCS as usize * PER_PROC);
}

#[test]
fn replicas_share_gid_without_colliding_with_fresh_objects() {
    init();
    let results = run_spmd(PROCS, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let shared: Vec<Gid> = (0..PROCS)
            .map(|root| {
                let id = register_shared(ddd, root, node, 0, 0);
                ddd.objects().header(&id).unwrap().gid()
            })
            .collect();
        let own: Vec<Gid> = (0..5)
            .map(|_| {
                let id = ddd.register(node, 0, 0).unwrap();
                ddd.objects().header(&id).unwrap().gid()
            })
            .collect();
        for gid in shared.iter().chain(own.iter()) {
            assert!(ddd.objects().find_by_gid(gid).is_some());
        }
        assert_eq!(ddd.objects().object_count(), PROCS as usize + 5);
        (shared, own)
    });

    let (first_shared, _) = &results[0];
    for (rank, gid) in first_shared.iter().enumerate() {
        assert_eq!(gid.origin(), rank as u32);
    }
    let mut seen: HashSet<Gid> = first_shared.iter().copied().collect();
    for (shared, own) in &results {
        assert_eq!(shared, first_shared);
        for gid in own {
            assert!(seen.insert(*gid), "gid {} used twice", gid);
        }
    }
}

#[test]
fn context_rejects_counter_limit_past_gid_layout() {
    let config = DddConfig {
        gid_counter_limit: MAX_GID_COUNTER + 1,
        ..DddConfig::default()
    };
    let transport = LocalHub::new(1).transports().remove(0);
    assert_eq!(
        Ddd::new(transport, config).err(),
        Some(DddError::GidCounterLimit {
            limit: MAX_GID_COUNTER + 1,
            max: MAX_GID_COUNTER
        })
    );

    let config = DddConfig {
        gid_counter_limit: MAX_GID_COUNTER,
        ..DddConfig::default()
    };
    let transport = LocalHub::new(1).transports().remove(0);
    assert!(Ddd::new(transport, config).is_ok());
}
