// Ported from microsoft/wassette (MIT License)
// Copyright (c) Microsoft Corporation.

use anyhow::Result;
use wasmtime::component::Linker;
use wasmtime::{Config, Engine, StoreContextMut};

use crate::host_state::HostState;

/// Engine plus a linker carrying every import the unit's world needs:
/// WASI p2, WASI HTTP and the root-level `emit(event: string)` push hook.
pub struct RuntimeContext {
    pub engine: Engine,
    pub linker: Linker<HostState>,
}

impl RuntimeContext {
    pub fn new() -> Result<Self> {
        let mut config = Config::new();
        config.wasm_component_model(true);
        config.async_support(true);

        let engine = Engine::new(&config)?;
        let mut linker: Linker<HostState> = Linker::new(&engine);

        wasmtime_wasi::p2::add_to_linker_async(&mut linker)?;
        wasmtime_wasi_http::add_only_http_to_linker_async(&mut linker)?;

        linker.root().func_wrap(
            "emit",
            |store: StoreContextMut<'_, HostState>, (event,): (String,)| {
                store.data().emit(event);
                Ok(())
            },
        )?;

        tracing::debug!("RuntimeContext initialized (component-model + async + WASI p2 + HTTP + emit)");

        Ok(Self { engine, linker })
    }
}
