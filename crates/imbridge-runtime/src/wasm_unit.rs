// Ported from microsoft/wassette (MIT License, with modifications)
// Copyright (c) Microsoft Corporation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use imbridge_core::{ExitSignal, ExitStatus, NativeFailure, NativeUnit, UnitContext};
use serde_json::Value;
use tokio::sync::Mutex;
use wasmtime::Store;
use wasmtime::component::{Func, Val};

use crate::cache::ModuleCache;
use crate::error::UnitError;
use crate::host_state::HostState;
use crate::runtime_context::RuntimeContext;

/// Name of the component export every call goes through.
pub const INVOKE_EXPORT: &str = "invoke";

/// The instantiated unit: one store, one instance, for the unit's whole life.
struct Instance {
    store: Store<HostState>,
    invoke: Func,
}

/// A native unit compiled to a WebAssembly component.
///
/// The component exports `invoke(entry: string, args: string) ->
/// result<string, string>` and imports `emit(event: string)`. It is
/// instantiated once at boot and keeps its state across calls; calls are
/// serialized into its store.
///
/// A trap ends the unit: the exit signal fires with the trap detail and
/// every later call fails without entering the guest.
pub struct WasmUnit {
    module_path: PathBuf,
    runtime: Arc<RuntimeContext>,
    cache: ModuleCache,
    instance: Mutex<Option<Instance>>,
    exit: OnceLock<ExitSignal>,
}

impl WasmUnit {
    pub fn new(module_path: &Path, cache_dir: Option<PathBuf>) -> Result<Self, UnitError> {
        let runtime = Arc::new(RuntimeContext::new()?);
        let cache = ModuleCache::new(cache_dir.unwrap_or_else(ModuleCache::default_path));
        cache.init()?;
        Ok(Self {
            module_path: module_path.to_path_buf(),
            runtime,
            cache,
            instance: Mutex::new(None),
            exit: OnceLock::new(),
        })
    }

    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    async fn instantiate(&self, ctx: &UnitContext) -> Result<Instance, UnitError> {
        let component = self
            .cache
            .load_or_compile(&self.module_path, &self.runtime.engine)?;

        let mut store = Store::new(&self.runtime.engine, HostState::new(Some(ctx.push.clone())));
        let instance = self
            .runtime
            .linker
            .instantiate_async(&mut store, &component)
            .await
            .map_err(|e| UnitError::InstantiationFailed(format!("{}: {e}", self.module_path.display())))?;

        let invoke = instance
            .get_func(&mut store, INVOKE_EXPORT)
            .ok_or(UnitError::MissingExport(INVOKE_EXPORT))?;

        Ok(Instance { store, invoke })
    }

    /// The guest trapped: drop the instance and report the unit as exited.
    fn terminate(&self, slot: &mut Option<Instance>, detail: String) -> NativeFailure {
        *slot = None;
        tracing::error!(module = %self.module_path.display(), detail = %detail, "Unit trapped");
        if let Some(exit) = self.exit.get() {
            exit.signal(ExitStatus::Failed(detail.clone()));
        }
        NativeFailure::unspecified(format!("unit trapped: {detail}"))
    }
}

impl NativeUnit for WasmUnit {
    fn name(&self) -> &str {
        "wasm"
    }

    fn boot<'a>(
        &'a self,
        ctx: UnitContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), NativeFailure>> + Send + 'a>> {
        Box::pin(async move {
            let mut slot = self.instance.lock().await;
            if slot.is_some() {
                return Ok(());
            }

            tracing::info!(module = %self.module_path.display(), "Instantiating unit");
            let instance = self
                .instantiate(&ctx)
                .await
                .map_err(|e| NativeFailure::unspecified(e.to_string()))?;
            *slot = Some(instance);
            let _ = self.exit.set(ctx.exit);
            Ok(())
        })
    }

    fn call<'a>(
        &'a self,
        entry_point: &'a str,
        args: &'a [Value],
    ) -> Pin<Box<dyn Future<Output = Result<Value, NativeFailure>> + Send + 'a>> {
        Box::pin(async move {
            let args_json = serde_json::to_string(args)
                .map_err(|e| NativeFailure::unspecified(format!("cannot encode arguments: {e}")))?;

            let mut slot = self.instance.lock().await;
            let Some(instance) = slot.as_mut() else {
                return Err(NativeFailure::unspecified("unit is not running"));
            };

            tracing::trace!(entry_point, "Entering unit");
            let params = [Val::String(entry_point.to_string()), Val::String(args_json)];
            let mut results = vec![Val::Bool(false)];

            if let Err(e) = instance
                .invoke
                .call_async(&mut instance.store, &params, &mut results)
                .await
            {
                return Err(self.terminate(&mut slot, format!("{entry_point}: {e:#}")));
            }
            if let Err(e) = instance.invoke.post_return_async(&mut instance.store).await {
                return Err(self.terminate(&mut slot, format!("{entry_point} post_return: {e:#}")));
            }

            decode_invoke_result(results)
        })
    }
}

/// Map the `result<string, string>` returned by `invoke`.
///
/// `Ok` strings are handed to the bridge untouched; `Err` strings are decoded
/// as `{errCode, errMsg}` when possible.
pub fn decode_invoke_result(results: Vec<Val>) -> Result<Value, NativeFailure> {
    match results.into_iter().next() {
        Some(Val::Result(Ok(Some(boxed)))) => match *boxed {
            Val::String(s) => Ok(Value::String(s)),
            other => Err(NativeFailure::unspecified(format!(
                "expected string in Ok variant, got {other:?}"
            ))),
        },
        Some(Val::Result(Ok(None))) => Ok(Value::Null),
        Some(Val::Result(Err(Some(boxed)))) => match *boxed {
            Val::String(e) => Err(NativeFailure::from_detail(&e)),
            other => Err(NativeFailure::unspecified(format!("{other:?}"))),
        },
        Some(Val::Result(Err(None))) => Err(NativeFailure::unspecified("(no error detail)")),
        Some(other) => Err(NativeFailure::unspecified(format!(
            "unexpected return Val: {other:?}"
        ))),
        None => Err(NativeFailure::unspecified("unit returned no values")),
    }
}
