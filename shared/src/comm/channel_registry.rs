use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    comm::{
        error::ChannelError,
        transport::{Channel, ChannelKind, PendingConnect, Transport},
    },
    ProcId,
};

/// One reusable channel per (remote process, channel kind), opened on demand
pub struct ChannelRegistry {
    channels: HashMap<(ProcId, ChannelKind), Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    pub fn channel(&self, proc: ProcId, kind: ChannelKind) -> Option<Channel> {
        self.channels.get(&(proc, kind)).copied()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns the open channel to `proc`, connecting it first if needed
    pub fn get_channel<T: Transport>(
        &mut self,
        transport: &mut T,
        proc: ProcId,
        kind: ChannelKind,
        max_polls: u64,
    ) -> Result<Channel, ChannelError> {
        if let Some(channel) = self.channel(proc, kind) {
            return Ok(channel);
        }
        self.connect_all(transport, &[proc], kind, max_polls)?;
        match self.channel(proc, kind) {
            Some(channel) => Ok(channel),
            None => panic!("Channel to process {} missing right after connect", proc),
        }
    }

    /// Connects every missing channel of `kind` to `procs`: all connect
    /// requests are posted first, then polled together until complete.
    pub fn connect_all<T: Transport>(
        &mut self,
        transport: &mut T,
        procs: &[ProcId],
        kind: ChannelKind,
        max_polls: u64,
    ) -> Result<(), ChannelError> {
        let mut pending: Vec<PendingConnect> = Vec::new();
        for proc in procs {
            if self.channels.contains_key(&(*proc, kind)) {
                continue;
            }
            let request = transport
                .open_channel(*proc, kind)
                .map_err(|source| ChannelError::ConnectFailed {
                    proc: *proc,
                    kind,
                    source,
                })?;
            pending.push(request);
        }
        if pending.is_empty() {
            return Ok(());
        }
        debug!("connecting {} {:?} channels", pending.len(), kind);

        let mut polls = 0;
        loop {
            let mut index = 0;
            while index < pending.len() {
                let request = pending[index];
                let connected = transport.poll_connect(&request).map_err(|source| {
                    ChannelError::ConnectFailed {
                        proc: request.proc(),
                        kind,
                        source,
                    }
                })?;
                match connected {
                    Some(channel) => {
                        self.channels.insert((request.proc(), kind), channel);
                        pending.swap_remove(index);
                    }
                    None => index += 1,
                }
            }
            if pending.is_empty() {
                return Ok(());
            }

            polls += 1;
            if polls > max_polls {
                warn!(
                    "{} {:?} channels still connecting after {} polls",
                    pending.len(),
                    kind,
                    max_polls
                );
                return Err(ChannelError::ConnectBudgetExceeded {
                    kind,
                    pending: pending.len(),
                    retries: max_polls,
                });
            }
            std::hint::spin_loop();
        }
    }

    /// Closes every open channel
    pub fn close_all<T: Transport>(&mut self, transport: &mut T) -> Result<(), ChannelError> {
        let mut channels: Vec<Channel> = self.channels.drain().map(|(_, channel)| channel).collect();
        channels.sort_by_key(|channel| (channel.proc(), channel.kind()));
        for channel in channels {
            transport
                .close_channel(&channel)
                .map_err(|source| ChannelError::CloseFailed {
                    proc: channel.proc(),
                    kind: channel.kind(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
