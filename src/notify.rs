//! Outbound change notifications.

use std::sync::Arc;

use chrono::Utc;

use crate::models::{ChangeEvent, EventKind, Product};
use crate::registry::SubscriberRegistry;

/// Builds the event envelope, stamps it with the current UTC time,
/// serializes it once and hands it to the registry for broadcast.
///
/// Side effect only: delivery is best-effort and nothing here surfaces an
/// error to the caller.
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<SubscriberRegistry>,
}

impl Notifier {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub async fn notify(
        &self,
        event: EventKind,
        product: Option<Product>,
        details: Option<serde_json::Value>,
    ) {
        let envelope = ChangeEvent {
            event,
            timestamp: Utc::now(),
            product,
            details,
        };
        match serde_json::to_string(&envelope) {
            Ok(payload) => {
                let delivered = self.registry.broadcast(&payload).await;
                tracing::debug!(event = ?envelope.event, delivered, "change event broadcast");
            }
            Err(err) => {
                tracing::error!(event = ?envelope.event, error = %err, "failed to encode change event");
            }
        }
    }
}
