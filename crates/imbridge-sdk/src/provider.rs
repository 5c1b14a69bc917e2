use std::future::Future;
use std::pin::Pin;

use imbridge_core::{Bridge, Invocation};
use imbridge_store::{StoreError, TargetProvider};
use serde_json::Value;

/// Asks the running unit for every conversation id.
pub struct BridgeConversationIds {
    bridge: Bridge,
}

impl BridgeConversationIds {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }
}

impl TargetProvider for BridgeConversationIds {
    fn target_ids<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let resp = self
                .bridge
                .invoke(Invocation::new("getAllConversationIDList"))
                .await
                .map_err(|e| StoreError::Provider(e.to_string()))?;
            // Decoding may already have turned the list into an array.
            Ok(match resp.data {
                Value::String(raw) => raw,
                other => other.to_string(),
            })
        })
    }
}
