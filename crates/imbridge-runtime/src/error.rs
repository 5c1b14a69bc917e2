use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("Module not found: {}", .0.display())]
    ModuleNotFound(PathBuf),

    #[error("Compilation failed: {0}")]
    CompilationFailed(String),

    #[error("Instantiation failed: {0}")]
    InstantiationFailed(String),

    #[error("Component does not export `{0}`")]
    MissingExport(&'static str),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
