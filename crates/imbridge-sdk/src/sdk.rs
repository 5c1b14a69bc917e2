use std::sync::Arc;

use imbridge_core::{
    Bridge, BridgeMetrics, Invocation, NativeUnit, OperationError, OperationId, PushEvent,
    Response, Subscription,
};
use imbridge_runtime::WasmUnit;
use imbridge_store::{LocalStore, MigrationReport};

use crate::config::{ImBridgeConfig, SdkSettings};
use crate::error::SdkError;
use crate::params::{InitConfig, LoginParams};
use crate::provider::BridgeConversationIds;

/// Caller-facing client: one method per logical operation on top of a
/// [`Bridge`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Sdk {
    bridge: Bridge,
    settings: SdkSettings,
}

impl Sdk {
    pub fn new(bridge: Bridge, settings: SdkSettings) -> Self {
        Self { bridge, settings }
    }

    /// Wrap `unit` in a fresh bridge configured from `config`.
    pub fn with_unit(unit: Arc<dyn NativeUnit>, config: &ImBridgeConfig) -> Self {
        Self::new(
            Bridge::new(unit, config.bridge.clone()),
            config.sdk.clone(),
        )
    }

    /// Build the WASM unit named in `config`. The unit is not booted until
    /// [`Sdk::login`] or [`Sdk::start`].
    pub fn from_config(config: &ImBridgeConfig) -> Result<Self, SdkError> {
        let unit = WasmUnit::new(&config.unit.module_path, config.unit.cache_dir.clone())?;
        Ok(Self::with_unit(Arc::new(unit), config))
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn settings(&self) -> &SdkSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<BridgeMetrics> {
        self.bridge.metrics()
    }

    /// Boot the unit if that has not been attempted yet.
    pub async fn start(&self) -> Result<(), SdkError> {
        if !self.bridge.is_started() {
            self.bridge.start().await?;
        }
        Ok(())
    }

    /// Boot the unit (first time only), initialize it with the resolved
    /// config, then log in.
    pub async fn login(
        &self,
        params: LoginParams,
        operation_id: Option<OperationId>,
    ) -> Result<Response, SdkError> {
        let operation_id = operation_id.unwrap_or_default();
        tracing::info!(operation_id = %operation_id, user_id = %params.user_id, "Logging in");

        self.start().await?;

        let init_config = InitConfig::resolve(&self.settings, &params);
        self.bridge
            .invoke(
                Invocation::new("initSDK")
                    .operation_id(Some(operation_id.clone()))
                    .json_arg(&init_config),
            )
            .await?;

        let resp = self
            .bridge
            .invoke(
                Invocation::new("login")
                    .operation_id(Some(operation_id))
                    .arg(params.user_id)
                    .arg(params.token),
            )
            .await?;
        Ok(resp)
    }

    /// Stop the unit from the host side; every later call is rejected.
    pub fn shutdown(&self) {
        self.bridge.shutdown();
    }

    /// Listen for pushes named `event`.
    pub fn on<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        self.bridge.subscribe(event, listener)
    }

    pub fn off(&self, subscription: &Subscription) -> bool {
        self.bridge.unsubscribe(subscription)
    }

    /// Run an operation that has no typed wrapper.
    pub async fn invoke(&self, invocation: Invocation) -> Result<Response, OperationError> {
        self.bridge.invoke(invocation).await
    }

    /// Upgrade `store` in place, discovering per-conversation tables through
    /// the running unit.
    pub async fn migrate_store(&self, store: &LocalStore) -> MigrationReport {
        let provider = BridgeConversationIds::new(self.bridge.clone());
        imbridge_store::migrate(store, &provider).await
    }
}
