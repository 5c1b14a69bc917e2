use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::decode::transforms::ResultTransform;
use crate::decode::try_decode;
use crate::envelope::{ErrorKind, OperationEnvelope, OperationError, Response, canonical_event_name};
use crate::error::BridgeError;
use crate::id::OperationId;
use crate::lifecycle::{ExitSignal, ExitStatus, LifecycleGuard};
use crate::metrics::BridgeMetrics;
use crate::relay::{EventRelay, PushEvent, Subscription, panic_message};
use crate::unit::{NativeFailure, NativeUnit, PushSink, UnitContext};

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Best-effort JSON decode of results and push payloads.
    #[serde(default = "default_true")]
    pub try_parse: bool,
    /// Log every invocation with its operation id and arguments.
    #[serde(default = "default_true")]
    pub log_calls: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            try_parse: true,
            log_calls: true,
        }
    }
}

/// A request to run one operation on the native unit.
pub struct Invocation {
    operation: String,
    entry_point: Option<String>,
    operation_id: OperationId,
    args: Vec<Value>,
    transform: Option<ResultTransform>,
    invalid_arguments: Option<String>,
}

impl Invocation {
    /// New invocation with a freshly generated operation id.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            entry_point: None,
            operation_id: OperationId::generate(),
            args: Vec::new(),
            transform: None,
            invalid_arguments: None,
        }
    }

    /// Use a caller-supplied correlation token; `None` keeps the generated one.
    pub fn operation_id(mut self, operation_id: Option<OperationId>) -> Self {
        if let Some(id) = operation_id {
            self.operation_id = id;
        }
        self
    }

    /// Call a differently named entry point. The event name still derives
    /// from the operation name.
    pub fn entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append `value` serialized to a JSON string, the form the unit expects
    /// for structured parameters.
    pub fn json_arg<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(encoded) => self.args.push(Value::String(encoded)),
            Err(e) => {
                self.invalid_arguments
                    .get_or_insert_with(|| format!("argument {}: {e}", self.args.len() + 1));
            }
        }
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, String> + Send + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn id(&self) -> &OperationId {
        &self.operation_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("operation", &self.operation)
            .field("entry_point", &self.entry_point)
            .field("operation_id", &self.operation_id)
            .field("args", &self.args)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

/// An invocation between envelope construction and settlement.
///
/// Settling consumes the value, so a call resolves or rejects exactly once.
#[derive(Debug)]
pub struct PendingCall {
    envelope: OperationEnvelope,
}

impl PendingCall {
    fn new(envelope: OperationEnvelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &OperationEnvelope {
        &self.envelope
    }

    fn resolve(mut self, data: Value) -> Response {
        self.envelope.payload = Some(data);
        let OperationEnvelope {
            operation_id,
            event,
            payload,
            ..
        } = self.envelope;
        Response {
            operation_id,
            event,
            data: payload.unwrap_or(Value::Null),
        }
    }

    fn reject(self, kind: ErrorKind, native_code: Option<i64>, err_msg: String) -> OperationError {
        OperationError {
            operation_id: self.envelope.operation_id,
            event: self.envelope.event,
            kind,
            err_code: native_code
                .or(kind.bridge_code())
                .unwrap_or(NativeFailure::UNSPECIFIED),
            err_msg,
        }
    }
}

/// Process-wide context connecting callers to the native unit.
///
/// Owns the unit handle, the lifecycle guard and the event relay. Cheap to
/// clone; clones share all state. Holds no lock around calls: invocations
/// run fully concurrently.
#[derive(Clone)]
pub struct Bridge {
    unit: Arc<dyn NativeUnit>,
    guard: Arc<LifecycleGuard>,
    relay: Arc<EventRelay>,
    metrics: Arc<BridgeMetrics>,
    config: BridgeConfig,
    started: Arc<AtomicBool>,
}

impl Bridge {
    pub fn new(unit: Arc<dyn NativeUnit>, config: BridgeConfig) -> Self {
        Self::with_metrics(unit, config, Arc::new(BridgeMetrics::new()))
    }

    pub fn with_metrics(
        unit: Arc<dyn NativeUnit>,
        config: BridgeConfig,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        let relay = Arc::new(EventRelay::new(config.try_parse, Arc::clone(&metrics)));
        Self {
            unit,
            guard: Arc::new(LifecycleGuard::new()),
            relay,
            metrics,
            config,
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn guard(&self) -> &Arc<LifecycleGuard> {
        &self.guard
    }

    pub fn relay(&self) -> &Arc<EventRelay> {
        &self.relay
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.guard.is_ready()
    }

    /// Boot the native unit and register the single inbound push handler.
    ///
    /// May only be attempted once per bridge, whether or not boot succeeds.
    pub async fn start(&self) -> Result<(), BridgeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Arc::clone(&self.relay).pump(rx));

        let ctx = UnitContext {
            push: PushSink::new(tx),
            exit: ExitSignal::new(Arc::clone(&self.guard)),
        };

        tracing::info!(unit = self.unit.name(), "Booting native unit");
        if let Err(failure) = self.unit.boot(ctx).await {
            self.guard.mark_exited(ExitStatus::Failed(failure.err_msg.clone()));
            tracing::error!(unit = self.unit.name(), error = %failure, "Native unit failed to boot");
            return Err(BridgeError::BootFailed(failure));
        }

        if self.guard.mark_running() {
            tracing::info!(unit = self.unit.name(), "Native unit running");
        }

        let exited = self.guard.observe_exit();
        let unit_name = self.unit.name().to_string();
        tokio::spawn(async move {
            match exited.await {
                ExitStatus::Clean => tracing::info!(unit = %unit_name, "Native unit exited"),
                ExitStatus::Failed(detail) => {
                    tracing::warn!(unit = %unit_name, detail = %detail, "Native unit exited with error")
                }
            }
        });
        Ok(())
    }

    /// Host-side stop: every later call, and every call still waiting on the
    /// unit, is rejected with `UnitUnavailable`.
    pub fn shutdown(&self) {
        self.guard.mark_exited(ExitStatus::Clean);
    }

    pub fn subscribe<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.relay.subscribe(event, listener)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.relay.unsubscribe(subscription)
    }

    /// Run one operation and settle it into a uniform envelope.
    pub async fn invoke(&self, invocation: Invocation) -> Result<Response, OperationError> {
        let Invocation {
            operation,
            entry_point,
            operation_id,
            args,
            transform,
            invalid_arguments,
        } = invocation;

        // Subscribe before the readiness check so an exit racing this call is seen.
        let exited = self.guard.observe_exit();
        self.metrics.record_invocation_started();

        let mut raw_arguments = Vec::with_capacity(args.len() + 1);
        raw_arguments.push(Value::String(operation_id.to_string()));
        raw_arguments.extend(args);
        let pending = PendingCall::new(OperationEnvelope {
            operation_id,
            event: canonical_event_name(&operation),
            raw_arguments,
            payload: None,
        });

        if self.config.log_calls {
            tracing::debug!(
                operation_id = %pending.envelope.operation_id,
                operation = %operation,
                args = ?pending.envelope.raw_arguments,
                "Invoking native entry point"
            );
        }

        if !self.guard.is_ready() {
            let detail = format!("native unit is not running ({:?})", self.guard.state());
            return Err(self.fail(pending, ErrorKind::UnitUnavailable, None, detail));
        }
        if let Some(detail) = invalid_arguments {
            return Err(self.fail(pending, ErrorKind::InvalidArguments, None, detail));
        }

        let entry = entry_point.unwrap_or(operation);
        let unit = Arc::clone(&self.unit);
        let call_args = pending.envelope.raw_arguments.clone();
        // Detached so that, once started, the native call runs to completion
        // even if the caller goes away or the unit is seen exiting.
        let call = tokio::spawn(async move { unit.call(&entry, &call_args).await });

        let joined = tokio::select! {
            biased;
            joined = call => Ok(joined),
            status = exited => Err(status),
        };

        let raw = match joined {
            Ok(Ok(Ok(raw))) => raw,
            Ok(Ok(Err(failure))) => {
                return Err(self.fail(
                    pending,
                    ErrorKind::NativeCallFailure,
                    Some(failure.err_code),
                    failure.err_msg,
                ));
            }
            Ok(Err(join_error)) => {
                let detail = format!("native call aborted: {join_error}");
                return Err(self.fail(pending, ErrorKind::NativeCallFailure, None, detail));
            }
            Err(status) => {
                let detail = format!("native unit exited: {status}");
                return Err(self.fail(pending, ErrorKind::UnitUnavailable, None, detail));
            }
        };

        let mut data = raw;
        if let Some(transform) = transform {
            if self.config.log_calls {
                tracing::debug!(
                    operation_id = %pending.envelope.operation_id,
                    raw = %data,
                    "Applying result transform"
                );
            }
            data = match catch_unwind(AssertUnwindSafe(|| transform(data))) {
                Ok(Ok(transformed)) => transformed,
                Ok(Err(detail)) => {
                    return Err(self.fail(pending, ErrorKind::TransformFailure, None, detail));
                }
                Err(panic) => {
                    let detail = format!("transform panicked: {}", panic_message(panic.as_ref()));
                    return Err(self.fail(pending, ErrorKind::TransformFailure, None, detail));
                }
            };
        }
        if self.config.try_parse {
            data = try_decode(data);
        }

        self.metrics.record_invocation_succeeded();
        Ok(pending.resolve(data))
    }

    fn fail(
        &self,
        pending: PendingCall,
        kind: ErrorKind,
        native_code: Option<i64>,
        err_msg: String,
    ) -> OperationError {
        let err = pending.reject(kind, native_code, err_msg);
        if kind == ErrorKind::UnitUnavailable {
            self.metrics.record_invocation_rejected();
        } else {
            self.metrics.record_invocation_failed();
        }
        if self.config.log_calls {
            tracing::warn!(
                operation_id = %err.operation_id,
                event = %err.event,
                kind = %kind,
                err_code = err.err_code,
                err_msg = %err.err_msg,
                "Invocation failed"
            );
        }
        err
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("unit", &self.unit.name())
            .field("state", &self.guard.state())
            .field("config", &self.config)
            .finish()
    }
}
