use thiserror::Error;

use crate::unit::NativeFailure;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge already started; the push handler is registered once per process")]
    AlreadyStarted,

    #[error("native unit failed to boot: {0}")]
    BootFailed(NativeFailure),
}
