use imbridge_core::{BridgeError, OperationError};
use imbridge_runtime::UnitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
