//! The transport boundary the [`crate::ReplicationDriver`] sends to and
//! drains from, plus an in-process reference implementation for tests and
//! single-binary multi-node demos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use fdp_component::ComponentTypeId;
use fdp_net::NetId;

/// One replicated component's wire payload, addressed by netId.
#[derive(Debug, Clone)]
pub struct WireMessage {
    pub net_id: NetId,
    pub type_id: ComponentTypeId,
    pub payload: Vec<u8>,
}

/// Send outbound payloads and drain inbound ones. Implementations own
/// whatever actually moves bytes between nodes; the driver never reaches
/// past this trait.
pub trait Transport: Send + Sync {
    fn send(&self, message: WireMessage);

    /// Remove and return every inbound message queued since the last
    /// drain, in arrival order.
    fn drain(&self) -> Vec<WireMessage>;
}

/// A `Transport` that holds messages in memory. The inbox is a
/// [`DashMap`] keyed by a monotonic sequence number rather than a `Vec`
/// behind a single lock, so a background thread marshaling in real network
/// frames never blocks the tick thread's `drain` on the same mutex; `drain`
/// sorts by key to recover arrival order before returning.
pub struct InProcessTransport {
    inbox: DashMap<u64, WireMessage>,
    next_inbound_seq: AtomicU64,
    outbox: Mutex<Vec<WireMessage>>,
}

impl Default for InProcessTransport {
    fn default() -> Self {
        Self {
            inbox: DashMap::new(),
            next_inbound_seq: AtomicU64::new(0),
            outbox: Mutex::new(Vec::new()),
        }
    }
}

impl InProcessTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by whatever marshals wire frames in off the real network
    /// (or, in tests, by another transport's `relay_to`).
    pub fn push_inbound(&self, message: WireMessage) {
        let seq = self.next_inbound_seq.fetch_add(1, Ordering::SeqCst);
        self.inbox.insert(seq, message);
    }

    /// Move everything queued in `self`'s outbox into `other`'s inbox, in
    /// the order it was sent. Test/demo wiring only.
    pub fn relay_to(&self, other: &InProcessTransport) {
        let mut outbox = self.outbox.lock().expect("outbox mutex poisoned");
        for message in outbox.drain(..) {
            other.push_inbound(message);
        }
    }
}

impl Transport for InProcessTransport {
    fn send(&self, message: WireMessage) {
        self.outbox.lock().expect("outbox mutex poisoned").push(message);
    }

    fn drain(&self) -> Vec<WireMessage> {
        let mut entries: Vec<(u64, WireMessage)> = self.inbox.iter().map(|e| (*e.key(), e.value().clone())).collect();
        entries.sort_by_key(|(seq, _)| *seq);
        self.inbox.clear();
        entries.into_iter().map(|(_, m)| m).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_preserves_send_order() {
        let a = InProcessTransport::new();
        let b = InProcessTransport::new();
        a.send(WireMessage { net_id: NetId(1), type_id: ComponentTypeId(0), payload: vec![1] });
        a.send(WireMessage { net_id: NetId(2), type_id: ComponentTypeId(0), payload: vec![2] });
        a.relay_to(&b);
        let drained = b.drain();
        let ids: Vec<i64> = drained.iter().map(|m| m.net_id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_drain_empties_inbox() {
        let t = InProcessTransport::new();
        t.push_inbound(WireMessage { net_id: NetId(5), type_id: ComponentTypeId(0), payload: vec![] });
        assert_eq!(t.drain().len(), 1);
        assert_eq!(t.drain().len(), 0);
    }
}
