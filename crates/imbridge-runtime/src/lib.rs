// Ported from microsoft/wassette (MIT License).
// Copyright (c) Microsoft Corporation.
// Modifications Copyright (c) Epiphytic.

//! Hosts the native unit as a WebAssembly component.
//!
//! [`WasmUnit`] implements [`imbridge_core::NativeUnit`] on top of Wasmtime,
//! with WASI p2 and WASI HTTP linked in and precompiled artifacts cached on
//! disk.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use imbridge_core::{Bridge, BridgeConfig, Invocation};
//! use imbridge_runtime::WasmUnit;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let unit = WasmUnit::new(Path::new("/path/to/openIM.wasm"), None)?;
//! let bridge = Bridge::new(Arc::new(unit), BridgeConfig::default());
//! bridge.start().await?;
//!
//! let status = bridge.invoke(Invocation::new("getLoginStatus")).await?;
//! println!("{}", status.data);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod host_state;
pub mod runtime_context;
pub mod wasm_unit;

pub use cache::ModuleCache;
pub use error::UnitError;
pub use wasm_unit::{WasmUnit, decode_invoke_result};
