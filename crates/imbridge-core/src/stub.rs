use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::watch;

use crate::lifecycle::ExitStatus;
use crate::unit::{NativeFailure, NativeUnit, UnitContext};

/// Scripted reply for one entry point of a [`StubUnit`].
#[derive(Debug, Clone)]
pub enum StubReply {
    Value(Value),
    Failure(NativeFailure),
    /// Wait until [`StubUnit::release`] is called, then reply.
    Held(Box<StubReply>),
}

/// A call the stub received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub entry_point: String,
    pub args: Vec<Value>,
}

/// Deterministic native unit for tests and local development.
///
/// Entry points without a scripted reply fail with `errCode -1`.
pub struct StubUnit {
    replies: Mutex<HashMap<String, StubReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    boot_failure: Mutex<Option<NativeFailure>>,
    context: Mutex<Option<UnitContext>>,
    boots: AtomicUsize,
    release: watch::Sender<bool>,
}

impl StubUnit {
    pub fn new() -> Self {
        let (release, _) = watch::channel(false);
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            boot_failure: Mutex::new(None),
            context: Mutex::new(None),
            boots: AtomicUsize::new(0),
            release,
        }
    }

    pub fn reply(&self, entry_point: &str, value: Value) {
        self.script(entry_point, StubReply::Value(value));
    }

    /// Reply with a serialized string, the way real units return data.
    pub fn reply_raw(&self, entry_point: &str, raw: &str) {
        self.script(entry_point, StubReply::Value(Value::String(raw.to_string())));
    }

    pub fn fail(&self, entry_point: &str, err_code: i64, err_msg: &str) {
        self.script(
            entry_point,
            StubReply::Failure(NativeFailure::new(err_code, err_msg)),
        );
    }

    /// Reply with `value` only after [`StubUnit::release`].
    pub fn hold(&self, entry_point: &str, value: Value) {
        self.script(entry_point, StubReply::Held(Box::new(StubReply::Value(value))));
    }

    pub fn script(&self, entry_point: &str, reply: StubReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry_point.to_string(), reply);
    }

    pub fn fail_boot(&self, failure: NativeFailure) {
        *self.boot_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(failure);
    }

    pub fn release(&self) {
        self.release.send_replace(true);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn boot_count(&self) -> usize {
        self.boots.load(Ordering::Relaxed)
    }

    /// Emit a push through the channel handed over at boot.
    /// Returns false if the unit has not booted or the bridge stopped listening.
    pub fn emit(&self, raw_event: &str) -> bool {
        let context = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        context.as_ref().is_some_and(|ctx| ctx.push.push(raw_event))
    }

    /// Simulate the unit terminating on its own.
    pub fn terminate(&self, status: ExitStatus) {
        let context = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ctx) = context.as_ref() {
            ctx.exit.signal(status);
        }
    }

    async fn answer(&self, reply: StubReply) -> Result<Value, NativeFailure> {
        let mut reply = reply;
        loop {
            match reply {
                StubReply::Value(value) => return Ok(value),
                StubReply::Failure(failure) => return Err(failure),
                StubReply::Held(inner) => {
                    let mut released = self.release.subscribe();
                    let _ = released.wait_for(|r| *r).await;
                    reply = *inner;
                }
            }
        }
    }
}

impl Default for StubUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeUnit for StubUnit {
    fn name(&self) -> &str {
        "stub"
    }

    fn boot<'a>(
        &'a self,
        ctx: UnitContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), NativeFailure>> + Send + 'a>> {
        Box::pin(async move {
            self.boots.fetch_add(1, Ordering::Relaxed);
            if let Some(failure) = self
                .boot_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
            {
                return Err(failure);
            }
            *self.context.lock().unwrap_or_else(PoisonError::into_inner) = Some(ctx);
            Ok(())
        })
    }

    fn call<'a>(
        &'a self,
        entry_point: &'a str,
        args: &'a [Value],
    ) -> Pin<Box<dyn Future<Output = Result<Value, NativeFailure>> + Send + 'a>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedCall {
                    entry_point: entry_point.to_string(),
                    args: args.to_vec(),
                });

            let reply = self
                .replies
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(entry_point)
                .cloned();
            match reply {
                Some(reply) => self.answer(reply).await,
                None => Err(NativeFailure::unspecified(format!(
                    "no such entry point: {entry_point}"
                ))),
            }
        })
    }
}
