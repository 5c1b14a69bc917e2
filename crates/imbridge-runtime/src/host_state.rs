// Ported from microsoft/wassette (MIT License)
// Copyright (c) Microsoft Corporation.

use imbridge_core::PushSink;
use wasmtime::component::ResourceTable;
use wasmtime_wasi::{WasiCtx, WasiCtxBuilder, WasiCtxView, WasiView};
use wasmtime_wasi_http::{WasiHttpCtx, WasiHttpView};

/// Host-side state of the unit's single long-lived store.
///
/// - No filesystem preopens
/// - No host environment variables
/// - Network access via WASI HTTP only
/// - Pushes leave through `push`, the bridge's inbound channel
pub struct HostState {
    ctx: WasiCtx,
    table: ResourceTable,
    http: WasiHttpCtx,
    push: Option<PushSink>,
}

impl WasiView for HostState {
    fn ctx(&mut self) -> WasiCtxView<'_> {
        WasiCtxView {
            ctx: &mut self.ctx,
            table: &mut self.table,
        }
    }
}

impl WasiHttpView for HostState {
    fn ctx(&mut self) -> &mut WasiHttpCtx {
        &mut self.http
    }
    fn table(&mut self) -> &mut ResourceTable {
        &mut self.table
    }
}

impl HostState {
    pub fn new(push: Option<PushSink>) -> Self {
        let ctx = WasiCtxBuilder::new().inherit_stderr().build();
        Self {
            ctx,
            table: ResourceTable::new(),
            http: WasiHttpCtx::new(),
            push,
        }
    }

    /// Forward one event from the guest. Events emitted with no bridge
    /// attached, or after it stopped listening, are dropped.
    pub fn emit(&self, event: String) {
        match &self.push {
            Some(push) => {
                if !push.push(event) {
                    tracing::debug!("Push channel closed, dropping event");
                }
            }
            None => tracing::debug!("No push channel attached, dropping event"),
        }
    }
}
