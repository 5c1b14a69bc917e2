use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::id::OperationId;

/// Canonical event name for an operation: first character upper-cased, the
/// rest lower-cased (`sendMessage` -> `Sendmessage`).
///
/// Push events are named with the same convention, so this must not be
/// "improved" (no trimming, no word splitting). A leading non-alphabetic
/// character is kept as-is.
pub fn canonical_event_name(operation: &str) -> String {
    let mut chars = operation.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut name: String = first.to_uppercase().collect();
    name.push_str(&chars.as_str().to_lowercase());
    name
}

/// Per-invocation record owned by the bridge until the call settles.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationEnvelope {
    pub operation_id: OperationId,
    pub event: String,
    /// Arguments as handed to the native entry point, operation id first.
    pub raw_arguments: Vec<Value>,
    pub payload: Option<Value>,
}

/// Successful outcome of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T = Value> {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
    pub event: String,
    pub data: T,
}

impl Response<Value> {
    /// Decode the payload into a caller type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Why an invocation was rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The lifecycle guard refused the call; the native surface was not touched.
    UnitUnavailable,
    /// The native entry point itself failed.
    #[default]
    NativeCallFailure,
    /// The caller-supplied result transform failed.
    TransformFailure,
    /// Arguments could not be serialized for the native surface.
    InvalidArguments,
}

impl ErrorKind {
    /// Error code reported for failures the bridge raises itself.
    /// Native failures carry the unit's own code instead.
    pub fn bridge_code(self) -> Option<i64> {
        match self {
            ErrorKind::UnitUnavailable => Some(10001),
            ErrorKind::TransformFailure => Some(10002),
            ErrorKind::InvalidArguments => Some(10003),
            ErrorKind::NativeCallFailure => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnitUnavailable => write!(f, "unit unavailable"),
            ErrorKind::NativeCallFailure => write!(f, "native call failure"),
            ErrorKind::TransformFailure => write!(f, "transform failure"),
            ErrorKind::InvalidArguments => write!(f, "invalid arguments"),
        }
    }
}

/// Failed outcome of an invocation. Same correlation fields as [`Response`],
/// so callers can match both uniformly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{event} [{operation_id}] {kind}: {err_msg} (errCode {err_code})")]
pub struct OperationError {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
    pub event: String,
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(rename = "errCode")]
    pub err_code: i64,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
}

impl OperationError {
    pub fn is_unit_unavailable(&self) -> bool {
        self.kind == ErrorKind::UnitUnavailable
    }
}
