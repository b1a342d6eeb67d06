use log::{debug, trace};

use crate::{
    comm::{
        channel_registry::ChannelRegistry,
        error::CommError,
        poll::PollBudget,
        transport::{Channel, ChannelKind, RecvHandle, SendHandle, Transport},
    },
    interface::descriptor::{IfDirection, IfEntry, IfProcBucket, IfSelection, Interface},
    registry::{object_header::ObjectHeader, ObjectRegistry},
    Priority, ProcId,
};

/// One interface member as handed to exchange callbacks
pub struct IfItem<'a> {
    pub header: &'a ObjectHeader,
    /// Process holding the replica on the other end
    pub proc: ProcId,
    /// Priority of that replica
    pub remote_priority: Priority,
    pub direction: IfDirection,
}

/// Packs outgoing and unpacks incoming records of an exchange. Each method
/// is called once per item, in the interface's canonical order.
pub trait ExchangeHandler {
    fn gather(&mut self, item: &IfItem<'_>, buffer: &mut [u8]);
    fn scatter(&mut self, item: &IfItem<'_>, buffer: &[u8]);
}

/// Adapts a pair of plain per-object closures to `ExchangeHandler`
pub struct FnHandler<G, S> {
    gather: G,
    scatter: S,
}

impl<G, S> FnHandler<G, S>
where
    G: FnMut(&ObjectHeader, &mut [u8]),
    S: FnMut(&ObjectHeader, &[u8]),
{
    pub fn new(gather: G, scatter: S) -> Self {
        Self { gather, scatter }
    }
}

impl<G, S> ExchangeHandler for FnHandler<G, S>
where
    G: FnMut(&ObjectHeader, &mut [u8]),
    S: FnMut(&ObjectHeader, &[u8]),
{
    fn gather(&mut self, item: &IfItem<'_>, buffer: &mut [u8]) {
        (self.gather)(item.header, buffer)
    }

    fn scatter(&mut self, item: &IfItem<'_>, buffer: &[u8]) {
        (self.scatter)(item.header, buffer)
    }
}

/// Counters of one completed exchange
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    pub peers: usize,
    pub items_sent: usize,
    pub items_received: usize,
    pub polls: u64,
}

struct PeerState<'a> {
    bucket: &'a IfProcBucket,
    channel: Channel,
    n_recv: usize,
    recv: Option<RecvHandle>,
    send: Option<SendHandle>,
}

/// Drives bulk asynchronous exchanges over interfaces
pub struct ExchangeEngine {
    max_poll_retries: u64,
}

impl ExchangeEngine {
    pub fn new(max_poll_retries: u64) -> Self {
        Self { max_poll_retries }
    }

    pub fn max_poll_retries(&self) -> u64 {
        self.max_poll_retries
    }

    pub fn set_max_poll_retries(&mut self, max_poll_retries: u64) {
        self.max_poll_retries = max_poll_retries;
    }

    /// Exchanges the `selection` of `interface` with every remote process in it.
    ///
    /// Receives are posted before any send, so two processes sending to each
    /// other cannot both wait on their send first. The send buffer for a
    /// process holds `item_size` bytes per outgoing item, filled by `gather`
    /// in canonical order; incoming buffers are handed to `scatter` in the
    /// same order as soon as they arrive.
    #[allow(clippy::too_many_arguments)]
    pub fn exchange<T: Transport, H: ExchangeHandler>(
        &self,
        transport: &mut T,
        channels: &mut ChannelRegistry,
        objects: &ObjectRegistry,
        interface: &Interface,
        selection: IfSelection,
        item_size: usize,
        handler: &mut H,
    ) -> Result<ExchangeStats, CommError> {
        if item_size == 0 {
            return Err(CommError::ZeroItemSize);
        }

        let buckets: Vec<&IfProcBucket> = interface
            .procs()
            .iter()
            .filter(|bucket| {
                bucket.outgoing(&selection).next().is_some()
                    || bucket.incoming(&selection).next().is_some()
            })
            .collect();
        let procs: Vec<ProcId> = buckets.iter().map(|bucket| bucket.proc()).collect();
        channels.connect_all(transport, &procs, ChannelKind::Interface, self.max_poll_retries)?;

        let mut stats = ExchangeStats {
            peers: buckets.len(),
            ..ExchangeStats::default()
        };

        // post every receive before the first send
        let mut peers: Vec<PeerState> = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let Some(channel) = channels.channel(bucket.proc(), ChannelKind::Interface) else {
                panic!("Channel to process {} missing after batched connect", bucket.proc());
            };
            let n_recv = bucket.incoming(&selection).count();
            let recv = if n_recv > 0 {
                Some(transport.irecv(&channel, n_recv * item_size)?)
            } else {
                None
            };
            peers.push(PeerState {
                bucket,
                channel,
                n_recv,
                recv,
                send: None,
            });
        }

        for peer in &mut peers {
            let outgoing: Vec<&IfEntry> = peer.bucket.outgoing(&selection).collect();
            if outgoing.is_empty() {
                continue;
            }
            let mut buffer = vec![0u8; outgoing.len() * item_size];
            for (entry, chunk) in outgoing.iter().zip(buffer.chunks_exact_mut(item_size)) {
                let item = Self::item(objects, peer.bucket.proc(), entry)?;
                handler.gather(&item, chunk);
            }
            trace!(
                "{}: sending {} items to process {}",
                interface.id(),
                outgoing.len(),
                peer.bucket.proc()
            );
            stats.items_sent += outgoing.len();
            peer.send = Some(transport.isend(&peer.channel, buffer)?);
        }

        let mut budget = PollBudget::new("interface exchange", self.max_poll_retries);
        loop {
            let mut pending = 0;
            for peer in &mut peers {
                if let Some(handle) = peer.recv {
                    match transport.poll_recv(&handle)? {
                        Some(payload) => {
                            peer.recv = None;
                            Self::scatter(objects, peer, &selection, item_size, &payload, handler)?;
                            stats.items_received += peer.n_recv;
                        }
                        None => pending += 1,
                    }
                }
                if let Some(handle) = peer.send {
                    if transport.poll_send(&handle)? {
                        peer.send = None;
                    } else {
                        pending += 1;
                    }
                }
            }
            if pending == 0 {
                break;
            }
            budget.tick(pending)?;
        }
        stats.polls = budget.used();

        debug!(
            "{}: exchanged with {} processes, {} items out, {} items in",
            interface.id(),
            stats.peers,
            stats.items_sent,
            stats.items_received
        );
        Ok(stats)
    }

    /// Calls `callback` once per interface member, without communication
    pub fn execute_local<F>(
        objects: &ObjectRegistry,
        interface: &Interface,
        selection: IfSelection,
        mut callback: F,
    ) -> Result<usize, CommError>
    where
        F: FnMut(&IfItem<'_>),
    {
        let mut count = 0;
        for bucket in interface.procs() {
            for entry in bucket.outgoing(&selection) {
                let item = Self::item(objects, bucket.proc(), entry)?;
                callback(&item);
                count += 1;
            }
        }
        Ok(count)
    }

    fn scatter<H: ExchangeHandler>(
        objects: &ObjectRegistry,
        peer: &PeerState,
        selection: &IfSelection,
        item_size: usize,
        payload: &[u8],
        handler: &mut H,
    ) -> Result<(), CommError> {
        let expected = peer.n_recv * item_size;
        if payload.len() != expected {
            return Err(CommError::PayloadSizeMismatch {
                proc: peer.bucket.proc(),
                expected,
                actual: payload.len(),
            });
        }
        for (entry, chunk) in peer
            .bucket
            .incoming(selection)
            .zip(payload.chunks_exact(item_size))
        {
            let item = Self::item(objects, peer.bucket.proc(), entry)?;
            handler.scatter(&item, chunk);
        }
        Ok(())
    }

    fn item<'a>(
        objects: &'a ObjectRegistry,
        proc: ProcId,
        entry: &IfEntry,
    ) -> Result<IfItem<'a>, CommError> {
        let header = objects
            .header(&entry.object())
            .map_err(|_| CommError::StaleEntry { gid: entry.gid() })?;
        if header.gid() != entry.gid() {
            return Err(CommError::StaleEntry { gid: entry.gid() });
        }
        Ok(IfItem {
            header,
            proc,
            remote_priority: entry.remote_priority(),
            direction: entry.direction(),
        })
    }
}
