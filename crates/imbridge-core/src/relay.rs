use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::decode::try_decode;
use crate::metrics::BridgeMetrics;

/// One parsed push from the native unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "operationID", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(rename = "errCode", default, skip_serializing_if = "Option::is_none")]
    pub err_code: Option<i64>,
    #[serde(rename = "errMsg", default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

pub type Listener = Arc<dyn Fn(&PushEvent) + Send + Sync>;

/// Handle returned by [`EventRelay::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    event: String,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }
}

/// Fans the unit's single push stream out to topic-scoped listeners.
///
/// Delivery is synchronous and in subscription order. Each push is delivered
/// to a snapshot of the listeners registered when it arrived, so subscribe
/// and unsubscribe calls made meanwhile (including from inside a listener)
/// only affect later pushes.
pub struct EventRelay {
    listeners: RwLock<HashMap<String, Vec<(u64, Listener)>>>,
    next_id: AtomicU64,
    try_parse: bool,
    metrics: Arc<BridgeMetrics>,
}

impl EventRelay {
    pub fn new(try_parse: bool, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            try_parse,
            metrics,
        }
    }

    pub fn subscribe<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        tracing::debug!(event, subscription = id, "Listener subscribed");
        Subscription {
            id,
            event: event.to_string(),
        }
    }

    /// Remove a listener. Returns false if it was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = listeners.get_mut(&subscription.event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(id, _)| *id != subscription.id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(&subscription.event);
        }
        if removed {
            tracing::debug!(event = %subscription.event, subscription = subscription.id, "Listener unsubscribed");
        }
        removed
    }

    pub fn listener_count(&self, event: &str) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners.get(event).map_or(0, Vec::len)
    }

    fn snapshot(&self, event: &str) -> Vec<Listener> {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners
            .get(event)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Parse one raw push and deliver it. Returns how many listeners ran to
    /// completion.
    ///
    /// Unparsable pushes are logged and dropped. Pushes for an event nobody
    /// subscribed to are dropped; there is no replay.
    pub fn on_inbound_push(&self, raw_event: &str) -> usize {
        self.metrics.record_push_received();

        let mut parsed: PushEvent = match serde_json::from_str(raw_event) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.metrics.record_push_unparsable();
                tracing::warn!(error = %e, raw_event, "Dropping unparsable push");
                return 0;
            }
        };
        if self.try_parse {
            parsed.data = try_decode(std::mem::take(&mut parsed.data));
        }

        let listeners = self.snapshot(&parsed.event);
        if listeners.is_empty() {
            self.metrics.record_push_unrouted();
            tracing::debug!(event = %parsed.event, "No listeners for push");
            return 0;
        }

        tracing::trace!(event = %parsed.event, listeners = listeners.len(), "Delivering push");
        let mut delivered = 0;
        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(&parsed))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    self.metrics.record_listener_panic();
                    tracing::error!(
                        event = %parsed.event,
                        panic = panic_message(panic.as_ref()),
                        "Listener panicked, continuing delivery"
                    );
                }
            }
        }
        self.metrics.record_push_delivered();
        delivered
    }

    /// Drain the inbound channel, one push at a time, until every sender is gone.
    pub async fn pump(self: Arc<Self>, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(raw_event) = inbound.recv().await {
            self.on_inbound_push(&raw_event);
        }
        tracing::debug!("Push channel closed");
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "(non-string panic payload)"
    }
}
