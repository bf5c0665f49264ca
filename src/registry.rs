//! Live subscriber membership and broadcast fan-out.
//!
//! Membership mutations go through the DashMap; `broadcast` iterates a
//! snapshot, so a subscriber connecting or dropping mid-broadcast never
//! perturbs an in-flight delivery. A failed or timed-out send evicts that
//! subscriber and never aborts delivery to the rest.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub type SubscriberId = u64;

/// How long one subscriber send may take before that subscriber is dropped.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, mpsc::Sender<String>>,
    next_id: AtomicU64,
    send_timeout: Duration,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            send_timeout: SEND_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
            send_timeout,
        }
    }

    /// Admit a subscriber whose handshake has already completed.
    pub fn register(&self, tx: mpsc::Sender<String>) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(id, tx);
        tracing::debug!(subscriber_id = id, total = self.len(), "subscriber registered");
        id
    }

    pub fn unregister(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscriber_id = id, total = self.len(), "subscriber removed");
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `payload` to every currently-registered subscriber.
    ///
    /// Best-effort: returns the number of successful deliveries.
    pub async fn broadcast(&self, payload: &str) -> usize {
        let snapshot: Vec<(SubscriberId, mpsc::Sender<String>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in snapshot {
            match timeout(self.send_timeout, tx.send(payload.to_owned())).await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(_)) => {
                    // Receiver side is gone.
                    self.unregister(id);
                }
                Err(_) => {
                    tracing::warn!(subscriber_id = id, "subscriber send timed out, dropping");
                    self.unregister(id);
                }
            }
        }
        delivered
    }
}
