use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::lifecycle::ExitSignal;

/// Failure detail reported by a native entry point. Opaque to the bridge
/// beyond being copied onto the caller's error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("errCode {err_code}: {err_msg}")]
pub struct NativeFailure {
    #[serde(rename = "errCode")]
    pub err_code: i64,
    #[serde(rename = "errMsg", default)]
    pub err_msg: String,
}

impl NativeFailure {
    /// Code used when the unit failed without supplying one.
    pub const UNSPECIFIED: i64 = -1;

    pub fn new(err_code: i64, err_msg: impl Into<String>) -> Self {
        Self {
            err_code,
            err_msg: err_msg.into(),
        }
    }

    pub fn unspecified(err_msg: impl Into<String>) -> Self {
        Self::new(Self::UNSPECIFIED, err_msg)
    }

    /// Interpret a serialized failure from the unit: `{errCode, errMsg}` JSON
    /// when it parses, otherwise the whole string is the message.
    pub fn from_detail(detail: &str) -> Self {
        serde_json::from_str::<NativeFailure>(detail)
            .unwrap_or_else(|_| Self::unspecified(detail))
    }
}

/// Sending half of the unit's single inbound push channel.
#[derive(Debug, Clone)]
pub struct PushSink {
    tx: mpsc::UnboundedSender<String>,
}

impl PushSink {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Hand one serialized event to the bridge. Returns false once the
    /// bridge has stopped listening.
    pub fn push(&self, raw_event: impl Into<String>) -> bool {
        self.tx.send(raw_event.into()).is_ok()
    }
}

/// Everything a unit receives when it boots.
#[derive(Debug, Clone)]
pub struct UnitContext {
    pub push: PushSink,
    pub exit: ExitSignal,
}

/// The native computation unit: a flat namespace of entry points.
///
/// Each entry point receives the operation id as its first argument followed
/// by operation-specific arguments. Implementations that need calls
/// serialized must do so themselves; the bridge issues them concurrently.
///
/// Uses Pin<Box<dyn Future>> for dyn-compatibility.
pub trait NativeUnit: Send + Sync {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Initialize the unit. The unit keeps `ctx` to emit pushes and to
    /// report its own termination.
    fn boot<'a>(
        &'a self,
        ctx: UnitContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), NativeFailure>> + Send + 'a>>;

    /// Call the entry point named `entry_point`.
    fn call<'a>(
        &'a self,
        entry_point: &'a str,
        args: &'a [Value],
    ) -> Pin<Box<dyn Future<Output = Result<Value, NativeFailure>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_from_structured_detail() {
        let failure = NativeFailure::from_detail(r#"{"errCode":1004,"errMsg":"record not found"}"#);
        assert_eq!(failure, NativeFailure::new(1004, "record not found"));
    }

    #[test]
    fn failure_from_plain_detail() {
        let failure = NativeFailure::from_detail("panic: nil map");
        assert_eq!(failure.err_code, NativeFailure::UNSPECIFIED);
        assert_eq!(failure.err_msg, "panic: nil map");
    }

    #[test]
    fn push_sink_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = PushSink::new(tx);
        assert!(sink.push("{}"));
        drop(rx);
        assert!(!sink.push("{}"));
    }
}
