use std::{panic, thread};

use ddd_shared::{Ddd, DddConfig, DddType, Gid, ObjectId, Priority, ProcId, Transport};

use crate::local_transport::{LocalHub, LocalTransport};

/// Runs `body` once per process of a `size`-process group, each on its own
/// thread with its own context. Returns the results in rank order and
/// re-raises the first panic.
pub fn run_spmd<F, R>(size: u32, body: F) -> Vec<R>
where
    F: Fn(&mut Ddd<LocalTransport>) -> R + Sync,
    R: Send,
{
    run_spmd_with(size, |_| DddConfig::default(), body)
}

/// `run_spmd` with a per-rank configuration
pub fn run_spmd_with<C, F, R>(size: u32, config: C, body: F) -> Vec<R>
where
    C: Fn(ProcId) -> DddConfig + Sync,
    F: Fn(&mut Ddd<LocalTransport>) -> R + Sync,
    R: Send,
{
    let hub = LocalHub::new(size);
    let (config, body) = (&config, &body);
    thread::scope(|scope| {
        let handles: Vec<_> = hub
            .transports()
            .into_iter()
            .map(|transport| {
                scope.spawn(move || {
                    let rank = transport.rank();
                    let mut ddd = match Ddd::new(transport, config(rank)) {
                        Ok(ddd) => ddd,
                        Err(error) => panic!("context setup failed on process {}: {}", rank, error),
                    };
                    body(&mut ddd)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    })
}

/// Registers an object on `root` and a replica under the same GID on every
/// other process. Collective.
pub fn register_shared<T: Transport>(
    ddd: &mut Ddd<T>,
    root: ProcId,
    ddd_type: DddType,
    priority: Priority,
    attr: u32,
) -> ObjectId {
    if ddd.rank() == root {
        let id = ddd.register(ddd_type, priority, attr).unwrap();
        let gid = ddd.objects().header(&id).unwrap().gid();
        ddd.transport_mut().broadcast_u64(root, gid.to_u64()).unwrap();
        id
    } else {
        let gid = ddd.transport_mut().broadcast_u64(root, 0).unwrap();
        ddd.register_replica(Gid::from_u64(gid), ddd_type, priority, attr)
            .unwrap()
    }
}
