use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for metrics backends. Implementations can forward to Prometheus,
/// StatsD, or simply log metrics.
pub trait MetricsBackend: Send + Sync {
    fn record_counter(&self, name: &str, value: u64);
}

/// Atomic counters for invocations and push delivery.
/// Observability only: nothing in the bridge reads them back.
pub struct BridgeMetrics {
    pub invocations_started: AtomicU64,
    pub invocations_succeeded: AtomicU64,
    pub invocations_failed: AtomicU64,
    pub invocations_rejected: AtomicU64,
    pub pushes_received: AtomicU64,
    pub pushes_delivered: AtomicU64,
    pub pushes_unparsable: AtomicU64,
    pub pushes_unrouted: AtomicU64,
    pub listener_panics: AtomicU64,
    backend: Option<Arc<dyn MetricsBackend>>,
}

impl std::fmt::Debug for BridgeMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeMetrics")
            .field("snapshot", &self.snapshot())
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeMetrics {
    pub fn new() -> Self {
        Self {
            invocations_started: AtomicU64::new(0),
            invocations_succeeded: AtomicU64::new(0),
            invocations_failed: AtomicU64::new(0),
            invocations_rejected: AtomicU64::new(0),
            pushes_received: AtomicU64::new(0),
            pushes_delivered: AtomicU64::new(0),
            pushes_unparsable: AtomicU64::new(0),
            pushes_unrouted: AtomicU64::new(0),
            listener_panics: AtomicU64::new(0),
            backend: None,
        }
    }

    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Self::new()
        }
    }

    fn bump(&self, counter: &AtomicU64, name: &str) {
        let val = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(backend) = &self.backend {
            backend.record_counter(name, val);
        }
    }

    pub fn record_invocation_started(&self) {
        self.bump(&self.invocations_started, "imbridge.invocations_started");
    }

    pub fn record_invocation_succeeded(&self) {
        self.bump(&self.invocations_succeeded, "imbridge.invocations_succeeded");
    }

    pub fn record_invocation_failed(&self) {
        self.bump(&self.invocations_failed, "imbridge.invocations_failed");
    }

    /// Rejected by the lifecycle guard before or during the native call.
    pub fn record_invocation_rejected(&self) {
        self.bump(&self.invocations_rejected, "imbridge.invocations_rejected");
    }

    pub fn record_push_received(&self) {
        self.bump(&self.pushes_received, "imbridge.pushes_received");
    }

    pub fn record_push_delivered(&self) {
        self.bump(&self.pushes_delivered, "imbridge.pushes_delivered");
    }

    pub fn record_push_unparsable(&self) {
        self.bump(&self.pushes_unparsable, "imbridge.pushes_unparsable");
    }

    pub fn record_push_unrouted(&self) {
        self.bump(&self.pushes_unrouted, "imbridge.pushes_unrouted");
    }

    pub fn record_listener_panic(&self) {
        self.bump(&self.listener_panics, "imbridge.listener_panics");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations_started: self.invocations_started.load(Ordering::Relaxed),
            invocations_succeeded: self.invocations_succeeded.load(Ordering::Relaxed),
            invocations_failed: self.invocations_failed.load(Ordering::Relaxed),
            invocations_rejected: self.invocations_rejected.load(Ordering::Relaxed),
            pushes_received: self.pushes_received.load(Ordering::Relaxed),
            pushes_delivered: self.pushes_delivered.load(Ordering::Relaxed),
            pushes_unparsable: self.pushes_unparsable.load(Ordering::Relaxed),
            pushes_unrouted: self.pushes_unrouted.load(Ordering::Relaxed),
            listener_panics: self.listener_panics.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of all metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub invocations_started: u64,
    pub invocations_succeeded: u64,
    pub invocations_failed: u64,
    pub invocations_rejected: u64,
    pub pushes_received: u64,
    pub pushes_delivered: u64,
    pub pushes_unparsable: u64,
    pub pushes_unrouted: u64,
    pub listener_panics: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingBackend {
        counters: Mutex<Vec<(String, u64)>>,
    }

    impl MetricsBackend for RecordingBackend {
        fn record_counter(&self, name: &str, value: u64) {
            self.counters.lock().unwrap().push((name.to_string(), value));
        }
    }

    #[test]
    fn counters_increment() {
        let metrics = BridgeMetrics::new();
        metrics.record_invocation_started();
        metrics.record_invocation_started();
        metrics.record_invocation_succeeded();
        metrics.record_push_unrouted();

        let snap = metrics.snapshot();
        assert_eq!(snap.invocations_started, 2);
        assert_eq!(snap.invocations_succeeded, 1);
        assert_eq!(snap.pushes_unrouted, 1);
        assert_eq!(snap.invocations_failed, 0);
    }

    #[test]
    fn backend_receives_running_totals() {
        let backend = Arc::new(RecordingBackend {
            counters: Mutex::new(Vec::new()),
        });
        let metrics = BridgeMetrics::with_backend(backend.clone());
        metrics.record_invocation_rejected();
        metrics.record_invocation_rejected();

        let counters = backend.counters.lock().unwrap();
        assert_eq!(
            *counters,
            vec![
                ("imbridge.invocations_rejected".to_string(), 1),
                ("imbridge.invocations_rejected".to_string(), 2),
            ]
        );
    }
}
