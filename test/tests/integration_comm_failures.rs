/// Integration tests for communication failures: exhausted retry budgets
/// surface as errors instead of hanging the process.

use ddd_shared::{ChannelError, ChannelKind, CommError, DddConfig, InterfaceId, ProcId};
use ddd_test::{register_shared, run_spmd_with};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn small_budget(rank: ProcId) -> DddConfig {
    DddConfig {
        // only process 0's budget counts
        max_poll_retries: if rank == 0 { 1_000 } else { 7 },
        ..DddConfig::default()
    }
}

#[test]
fn retry_budget_of_process_zero_is_adopted() {
    init();
    let budgets = run_spmd_with(3, small_budget, |ddd| ddd.max_poll_retries());
    assert_eq!(budgets, vec![1_000; 3]);
}

#[test]
fn silent_peer_exhausts_poll_budget() {
    init();
    let results = run_spmd_with(2, small_budget, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let other = 1 - ddd.rank();
        let id = register_shared(ddd, 0, node, 1, 0);
        ddd.add_coupling(&id, other, 1).unwrap();
        if ddd.rank() == 0 {
            Some(ddd.exchange(InterfaceId::STANDARD, 4, |_, _| {}, |_, _| {}))
        } else {
            // never takes part in the exchange
            None
        }
    });

    match &results[0] {
        Some(Err(CommError::PollBudgetExceeded {
            operation,
            pending,
            retries,
        })) => {
            assert_eq!(*operation, "interface exchange");
            assert_eq!(*pending, 1);
            assert_eq!(*retries, 1_000);
        }
        other => panic!("expected an exhausted poll budget, got {:?}", other),
    }
    assert!(results[1].is_none());
}

#[test]
fn slow_connect_exhausts_connect_budget() {
    init();
    let results = run_spmd_with(2, small_budget, |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let other = 1 - ddd.rank();
        let id = register_shared(ddd, 0, node, 1, 0);
        ddd.add_coupling(&id, other, 1).unwrap();
        if ddd.rank() == 0 {
            ddd.transport_mut().set_connect_latency(10_000);
            Some(ddd.exchange(InterfaceId::STANDARD, 4, |_, _| {}, |_, _| {}))
        } else {
            None
        }
    });

    assert_eq!(
        results[0],
        Some(Err(CommError::Channel(ChannelError::ConnectBudgetExceeded {
            kind: ChannelKind::Interface,
            pending: 1,
            retries: 1_000,
        })))
    );
}

#[test]
fn closing_channels_releases_every_channel() {
    init();
    let open = run_spmd_with(3, |_| DddConfig::default(), |ddd| {
        let node = ddd.declare_type("node", 4).unwrap();
        let me = ddd.rank();
        let id = register_shared(ddd, 2, node, 0, 0);
        for other in (0..3).filter(|other| *other != me) {
            ddd.add_coupling(&id, other, 0).unwrap();
        }
        ddd.exchange(InterfaceId::STANDARD, 1, |_, _| {}, |_, _| {})
            .unwrap();
        ddd.check_couplings().unwrap();
        // one interface and one consistency channel per peer
        assert_eq!(ddd.transport().open_channels(), 4);
        ddd.close_channels().unwrap();
        ddd.transport().open_channels()
    });
    assert_eq!(open, vec![0; 3]);
}
