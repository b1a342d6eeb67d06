/// Integration tests for ChannelRegistry over the in-memory transport

use ddd_shared::{ChannelError, ChannelKind, ChannelRegistry, Transport, TransportError};
use ddd_test::LocalHub;

#[test]
fn get_channel_reuses_open_channel() {
    let hub = LocalHub::new(3);
    let mut transport = hub.transports().remove(0);
    let mut channels = ChannelRegistry::new();

    let first = channels
        .get_channel(&mut transport, 2, ChannelKind::Interface, 10)
        .unwrap();
    let again = channels
        .get_channel(&mut transport, 2, ChannelKind::Interface, 10)
        .unwrap();
    assert_eq!(first, again);
    assert_eq!(first.proc(), 2);
    assert_eq!(channels.len(), 1);
    assert_eq!(transport.open_channels(), 1);

    // another kind to the same process is a separate channel
    let consistency = channels
        .get_channel(&mut transport, 2, ChannelKind::Consistency, 10)
        .unwrap();
    assert_ne!(first, consistency);
    assert_eq!(channels.len(), 2);
}

#[test]
fn connect_all_polls_every_request_together() {
    let hub = LocalHub::new(4);
    let mut transport = hub.transports().remove(0);
    transport.set_connect_latency(5);
    let mut channels = ChannelRegistry::new();

    // each request needs 5 polls; polled together they fit a budget of 5
    channels
        .connect_all(&mut transport, &[1, 2, 3], ChannelKind::Consistency, 5)
        .unwrap();
    assert_eq!(channels.len(), 3);
    for proc in 1..4 {
        assert!(channels.channel(proc, ChannelKind::Consistency).is_some());
    }

    channels.close_all(&mut transport).unwrap();
    assert!(channels.is_empty());
    assert_eq!(transport.open_channels(), 0);
}

#[test]
fn connect_to_invalid_process_fails() {
    let hub = LocalHub::new(2);
    let mut transport = hub.transports().remove(1);
    let mut channels = ChannelRegistry::new();
    assert_eq!(
        channels.connect_all(&mut transport, &[0, 7], ChannelKind::Interface, 10),
        Err(ChannelError::ConnectFailed {
            proc: 7,
            kind: ChannelKind::Interface,
            source: TransportError::InvalidProcess { proc: 7, size: 2 },
        })
    );
    assert_eq!(transport.rank(), 1);
}
