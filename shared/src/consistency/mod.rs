//! Diagnostic cross-validation of couplings and interfaces between processes.
//!
//! Findings are counted and logged, never repaired: agreement between
//! processes is established by the protocols that maintain the couplings.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{
    comm::{
        channel_registry::ChannelRegistry,
        error::CommError,
        poll::PollBudget,
        transport::{ChannelKind, RecvHandle, ReduceOp, Transport},
    },
    interface::{descriptor::IfDirection, InterfaceRegistry},
    registry::ObjectRegistry,
    Gid, ProcId,
};

const COUNT_BYTES: usize = 8;
// gid, sender priority, sender's view of the receiver's priority
const COUPLING_RECORD_BYTES: usize = 10;

pub struct ConsistencyChecker {
    max_poll_retries: u64,
    quiet: bool,
}

impl ConsistencyChecker {
    pub fn new(max_poll_retries: u64, quiet: bool) -> Self {
        Self {
            max_poll_retries,
            quiet,
        }
    }

    /// Compares, for every pair of processes and every interface, the number
    /// of AB, BA and ABA items each end holds toward the other. Returns the
    /// number of disagreements found on all processes.
    pub fn check_interfaces<T: Transport>(
        &self,
        transport: &mut T,
        channels: &mut ChannelRegistry,
        interfaces: &InterfaceRegistry,
    ) -> Result<usize, CommError> {
        let me = transport.rank();
        let others = Self::others(transport);
        channels.connect_all(transport, &others, ChannelKind::Consistency, self.max_poll_retries)?;

        let message_len = interfaces.len() * 3 * COUNT_BYTES;
        let mut receives: Vec<(ProcId, RecvHandle)> = Vec::with_capacity(others.len());
        for proc in &others {
            let channel = self.channel(channels, *proc);
            receives.push((*proc, transport.irecv(&channel, message_len)?));
        }

        for proc in &others {
            let mut payload = Vec::with_capacity(message_len);
            for interface in interfaces.iter() {
                for count in Self::counts(interface.proc(*proc)) {
                    payload.extend_from_slice(&(count as u64).to_le_bytes());
                }
            }
            let channel = self.channel(channels, *proc);
            transport.send(&channel, &payload)?;
        }

        let mut mismatches = 0;
        for (proc, payload) in self.wait_receives(transport, receives, "interface check")? {
            if payload.len() != message_len {
                return Err(CommError::PayloadSizeMismatch {
                    proc,
                    expected: message_len,
                    actual: payload.len(),
                });
            }
            let theirs = decode_counts(&payload);
            for (index, interface) in interfaces.iter().enumerate() {
                let [ab, ba, aba] = Self::counts(interface.proc(proc));
                let (their_ab, their_ba, their_aba) =
                    (theirs[index * 3], theirs[index * 3 + 1], theirs[index * 3 + 2]);
                let checks = [
                    ("AB", ab, "BA", their_ba),
                    ("BA", ba, "AB", their_ab),
                    ("ABA", aba, "ABA", their_aba),
                ];
                for (mine_name, mine, their_name, their) in checks {
                    if mine as u64 != their {
                        mismatches += 1;
                        if !self.quiet {
                            warn!(
                                "{}: process {} has {} {} items toward {}, which has {} {} items toward {}",
                                interface.id(),
                                me,
                                mine,
                                mine_name,
                                proc,
                                their,
                                their_name,
                                me
                            );
                        }
                    }
                }
            }
        }

        let total = transport.reduce_u64(ReduceOp::Sum, mismatches as u64)?;
        debug!(
            "interface check: {} local, {} global disagreements",
            mismatches, total
        );
        Ok(total as usize)
    }

    /// Checks that every coupling is mirrored by the remote process, with
    /// matching priorities on both ends. Returns the number of errors found
    /// on all processes.
    pub fn check_couplings<T: Transport>(
        &self,
        transport: &mut T,
        channels: &mut ChannelRegistry,
        objects: &ObjectRegistry,
    ) -> Result<usize, CommError> {
        let me = transport.rank();
        let others = Self::others(transport);
        channels.connect_all(transport, &others, ChannelKind::Consistency, self.max_poll_retries)?;

        // records toward each process
        let mut outgoing: HashMap<ProcId, Vec<u8>> = HashMap::new();
        for (_, header, couplings) in objects.coupled_objects() {
            for coupling in couplings {
                let record = outgoing.entry(coupling.proc()).or_default();
                record.extend_from_slice(&header.gid().to_u64().to_le_bytes());
                record.push(header.priority());
                record.push(coupling.priority());
            }
        }

        // announce record counts, then exchange the records
        let mut sends = Vec::with_capacity(others.len());
        for proc in &others {
            let count = outgoing.get(proc).map_or(0, |r| r.len() / COUPLING_RECORD_BYTES);
            let channel = self.channel(channels, *proc);
            sends.push(transport.isend(&channel, (count as u64).to_le_bytes().to_vec())?);
        }
        let mut incoming_counts: Vec<(ProcId, usize)> = Vec::with_capacity(others.len());
        for proc in &others {
            let channel = self.channel(channels, *proc);
            let payload = transport.recv(&channel)?;
            let count: [u8; COUNT_BYTES] =
                payload
                    .as_slice()
                    .try_into()
                    .map_err(|_| CommError::MalformedMessage {
                        proc: *proc,
                        reason: "record count is not 8 bytes",
                    })?;
            incoming_counts.push((*proc, u64::from_le_bytes(count) as usize));
        }
        let mut budget = PollBudget::new("coupling check announce", self.max_poll_retries);
        while !sends.is_empty() {
            let mut index = 0;
            while index < sends.len() {
                if transport.poll_send(&sends[index])? {
                    sends.swap_remove(index);
                } else {
                    index += 1;
                }
            }
            if !sends.is_empty() {
                budget.tick(sends.len())?;
            }
        }

        let mut receives = Vec::new();
        for (proc, count) in &incoming_counts {
            if *count > 0 {
                let channel = self.channel(channels, *proc);
                receives.push((*proc, transport.irecv(&channel, count * COUPLING_RECORD_BYTES)?));
            }
        }
        for proc in &others {
            if let Some(records) = outgoing.get(proc) {
                let channel = self.channel(channels, *proc);
                transport.send(&channel, records)?;
            }
        }

        let mut errors = 0;
        let mut seen: HashMap<ProcId, HashSet<Gid>> = HashMap::new();
        for (proc, payload) in self.wait_receives(transport, receives, "coupling check")? {
            if payload.len() % COUPLING_RECORD_BYTES != 0 {
                return Err(CommError::MalformedMessage {
                    proc,
                    reason: "coupling records are truncated",
                });
            }
            let seen_from = seen.entry(proc).or_default();
            for record in payload.chunks_exact(COUPLING_RECORD_BYTES) {
                let mut gid_bytes = [0u8; 8];
                gid_bytes.copy_from_slice(&record[..8]);
                let gid = Gid::from_u64(u64::from_le_bytes(gid_bytes));
                let (their_priority, my_priority_there) = (record[8], record[9]);
                seen_from.insert(gid);

                let Some(object) = objects.find_by_gid(&gid) else {
                    errors += 1;
                    self.report(format_args!(
                        "process {} couples object {} with {}, which does not hold it",
                        proc, gid, me
                    ));
                    continue;
                };
                match objects.coupling_priority(&object, proc) {
                    None => {
                        errors += 1;
                        self.report(format_args!(
                            "process {} couples object {} with {}, but not vice versa",
                            proc, gid, me
                        ));
                    }
                    Some(priority) if priority != their_priority => {
                        errors += 1;
                        self.report(format_args!(
                            "object {}: process {} has priority {}, coupling on {} says {}",
                            gid, proc, their_priority, me, priority
                        ));
                    }
                    Some(_) => {}
                }
                let header = objects.header(&object).map_err(|_| CommError::StaleEntry { gid })?;
                if header.priority() != my_priority_there {
                    errors += 1;
                    self.report(format_args!(
                        "object {}: process {} has priority {}, coupling on {} says {}",
                        gid,
                        me,
                        header.priority(),
                        proc,
                        my_priority_there
                    ));
                }
            }
        }

        let empty = HashSet::new();
        for (_, header, couplings) in objects.coupled_objects() {
            for coupling in couplings {
                let seen_from = seen.get(&coupling.proc()).unwrap_or(&empty);
                if !seen_from.contains(&header.gid()) {
                    errors += 1;
                    self.report(format_args!(
                        "process {} couples object {} with {}, but not vice versa",
                        me,
                        header.gid(),
                        coupling.proc()
                    ));
                }
            }
        }

        let total = transport.reduce_u64(ReduceOp::Sum, errors as u64)?;
        debug!("coupling check: {} local, {} global errors", errors, total);
        Ok(total as usize)
    }

    fn others<T: Transport>(transport: &T) -> Vec<ProcId> {
        let me = transport.rank();
        (0..transport.size()).filter(|proc| *proc != me).collect()
    }

    fn channel(
        &self,
        channels: &ChannelRegistry,
        proc: ProcId,
    ) -> crate::comm::transport::Channel {
        match channels.channel(proc, ChannelKind::Consistency) {
            Some(channel) => channel,
            None => panic!("Consistency channel to process {} missing after connect", proc),
        }
    }

    fn counts(bucket: Option<&crate::interface::descriptor::IfProcBucket>) -> [usize; 3] {
        match bucket {
            Some(bucket) => [
                bucket.count(IfDirection::AB),
                bucket.count(IfDirection::BA),
                bucket.count(IfDirection::ABA),
            ],
            None => [0, 0, 0],
        }
    }

    fn wait_receives<T: Transport>(
        &self,
        transport: &mut T,
        mut receives: Vec<(ProcId, RecvHandle)>,
        operation: &'static str,
    ) -> Result<Vec<(ProcId, Vec<u8>)>, CommError> {
        let mut completed = Vec::with_capacity(receives.len());
        let mut budget = PollBudget::new(operation, self.max_poll_retries);
        while !receives.is_empty() {
            let mut index = 0;
            while index < receives.len() {
                let (proc, handle) = receives[index];
                match transport.poll_recv(&handle)? {
                    Some(payload) => {
                        completed.push((proc, payload));
                        receives.swap_remove(index);
                    }
                    None => index += 1,
                }
            }
            if !receives.is_empty() {
                budget.tick(receives.len())?;
            }
        }
        completed.sort_by_key(|(proc, _)| *proc);
        Ok(completed)
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        if !self.quiet {
            warn!("consistency: {}", message);
        }
    }
}

fn decode_counts(payload: &[u8]) -> Vec<u64> {
    payload
        .chunks_exact(COUNT_BYTES)
        .map(|chunk| {
            let mut bytes = [0u8; COUNT_BYTES];
            bytes.copy_from_slice(chunk);
            u64::from_le_bytes(bytes)
        })
        .collect()
}
