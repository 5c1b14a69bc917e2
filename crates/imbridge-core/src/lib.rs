//! Bridge between concurrent async callers and a singleton native unit.
//!
//! The native unit exposes a flat set of entry points and a single push
//! channel. [`Bridge`] wraps every call in a correlated envelope, gates it on
//! the unit's lifecycle, and normalizes the outcome; [`EventRelay`] fans the
//! push channel out to topic-scoped listeners.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use imbridge_core::{Bridge, BridgeConfig, Invocation};
//! use imbridge_core::stub::StubUnit;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let unit = Arc::new(StubUnit::new());
//! unit.reply_raw("getUserInfo", r#"{"userID":"u1","nickname":"Alice"}"#);
//!
//! let bridge = Bridge::new(unit, BridgeConfig::default());
//! bridge.start().await?;
//!
//! bridge.subscribe("OnRecvNewMessages", |push| {
//!     println!("new messages: {}", push.data);
//! });
//!
//! let resp = bridge
//!     .invoke(Invocation::new("getUserInfo").arg("u1"))
//!     .await?;
//! assert_eq!(resp.event, "Getuserinfo");
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod decode;
pub mod envelope;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod metrics;
pub mod relay;
pub mod stub;
pub mod unit;

pub use bridge::{Bridge, BridgeConfig, Invocation, PendingCall};
pub use decode::try_decode;
pub use envelope::{ErrorKind, OperationEnvelope, OperationError, Response, canonical_event_name};
pub use error::BridgeError;
pub use id::OperationId;
pub use lifecycle::{ExitSignal, ExitStatus, LifecycleGuard, UnitState};
pub use metrics::{BridgeMetrics, MetricsBackend, MetricsSnapshot};
pub use relay::{EventRelay, Listener, PushEvent, Subscription};
pub use unit::{NativeFailure, NativeUnit, PushSink, UnitContext};
