use std::time::Duration;

use plume_ledger::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rejection code as reported by a node.
///
/// Codes this client does not know are kept verbatim rather than dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RejectionCode(u32);

impl RejectionCode {
    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// The program error code, if this client knows it.
    pub fn known(self) -> Option<ErrorCode> {
        ErrorCode::from_u32(self.0)
    }

    pub fn is(self, code: ErrorCode) -> bool {
        self.0 == code.as_u32()
    }

    pub fn class(self) -> ErrorClass {
        match self.known() {
            Some(ErrorCode::Unauthorized) => ErrorClass::Authorization,
            Some(ErrorCode::AlreadyExists) => ErrorClass::Conflict,
            // Unknown codes are treated like input errors: final, shown as-is.
            Some(_) | None => ErrorClass::Validation,
        }
    }
}

impl From<ErrorCode> for RejectionCode {
    fn from(code: ErrorCode) -> Self {
        Self(code.as_u32())
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.known() {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "unknown rejection code {}", self.0),
        }
    }
}

/// How a caller should react to a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Bad input. Never retried.
    Validation,
    /// The request was not signed by the stated author.
    Authorization,
    /// The storage key was taken. Recoverable with a new key.
    Conflict,
    /// The node could not be reached or answered badly. Transient.
    Transport,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Conflict => "conflict",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Failures between the client and a node.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("node error: {0}")]
    Remote(String),
}

/// Outcome of a failed submission at the transport boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("rejected: {0}")]
    Rejected(RejectionCode),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("rejected: {0}")]
    Rejected(RejectionCode),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Rejected(code) => code.class(),
            Self::Transport(_) => ErrorClass::Transport,
        }
    }

    /// The program error code behind a rejection.
    pub fn rejection(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected(code) => code.known(),
            Self::Transport(_) => None,
        }
    }
}

impl From<SubmitError> for ClientError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(code) => Self::Rejected(code),
            SubmitError::Transport(e) => Self::Transport(e),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
