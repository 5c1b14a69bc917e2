// Ported from microsoft/wassette (MIT License, with modifications)
// Copyright (c) Microsoft Corporation.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use wasmtime::Engine;
use wasmtime::component::Component;

use crate::error::UnitError;

const PRECOMPILED_EXT: &str = "cwasm";

/// Disk cache of precompiled units, keyed by the SHA-256 of the source
/// module so a changed module never loads a stale artifact.
///
/// ```text
/// {base_dir}/
///   {sha256}.cwasm   - precompiled (Wasmtime serialized)
/// ```
pub struct ModuleCache {
    base_dir: PathBuf,
}

impl ModuleCache {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".imbridge")
            .join("cache")
    }

    pub fn init(&self) -> Result<(), UnitError> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cwasm_path(&self, hash: &str) -> PathBuf {
        self.base_dir.join(format!("{hash}.{PRECOMPILED_EXT}"))
    }

    /// Load the precompiled artifact for `wasm_path`, compiling and caching
    /// it first if needed. A cache that cannot be read or written only costs
    /// a recompile.
    pub fn load_or_compile(
        &self,
        wasm_path: &Path,
        engine: &Engine,
    ) -> Result<Component, UnitError> {
        let wasm_bytes = std::fs::read(wasm_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => UnitError::ModuleNotFound(wasm_path.to_path_buf()),
            _ => UnitError::Io(e),
        })?;
        let hash = hash_bytes(&wasm_bytes);
        let cwasm_path = self.cwasm_path(&hash);

        if cwasm_path.exists() {
            match self.load_precompiled(&cwasm_path, engine) {
                Ok(cached) => {
                    tracing::debug!(hash = %hash, "Loaded unit from precompiled cache");
                    return Ok(cached);
                }
                Err(e) => {
                    tracing::debug!(hash = %hash, error = %e, "Precompiled cache invalid, recompiling")
                }
            }
        }

        let component = Component::from_binary(engine, &wasm_bytes)
            .map_err(|e| UnitError::CompilationFailed(format!("{}: {e}", wasm_path.display())))?;

        match component.serialize() {
            Ok(serialized) => match std::fs::write(&cwasm_path, serialized) {
                Ok(()) => tracing::debug!(hash = %hash, "Saved precompiled cache"),
                Err(e) => tracing::warn!(path = %cwasm_path.display(), error = %e, "Could not write precompiled cache"),
            },
            Err(e) => tracing::warn!(error = %e, "Could not serialize compiled unit"),
        }

        Ok(component)
    }

    fn load_precompiled(&self, path: &Path, engine: &Engine) -> anyhow::Result<Component> {
        // SAFETY: the cwasm files are written by this cache, with the same
        // Wasmtime version, and named by the hash of their source. The safety
        // contract of `deserialize_file` is satisfied.
        unsafe { Component::deserialize_file(engine, path) }
    }
}

/// Hex SHA-256 of a module's bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
