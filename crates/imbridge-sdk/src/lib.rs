//! Typed client for the IM unit.
//!
//! [`Sdk`] exposes one async method per logical operation, each returning the
//! uniform [`imbridge_core::Response`] / [`imbridge_core::OperationError`]
//! envelopes, plus the login flow, push subscriptions and store migration.

pub mod config;
pub mod error;
mod ops;
pub mod params;
pub mod provider;
pub mod sdk;

pub use config::{ImBridgeConfig, SdkSettings};
pub use error::SdkError;
pub use provider::BridgeConversationIds;
pub use sdk::Sdk;
