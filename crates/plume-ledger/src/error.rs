use plume_store::StoreError;

/// Stable rejection codes reported by the program.
///
/// The numeric values are part of the wire protocol and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    TopicTooLong = 6000,
    ContentTooLong = 6001,
    TopicEmpty = 6002,
    ContentEmpty = 6003,
    Unauthorized = 6004,
    AlreadyExists = 6005,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        Self::TopicTooLong,
        Self::ContentTooLong,
        Self::TopicEmpty,
        Self::ContentEmpty,
        Self::Unauthorized,
        Self::AlreadyExists,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_u32() == code)
    }

    /// Human-readable message, suitable for showing to the end user as-is.
    pub fn message(self) -> &'static str {
        match self {
            Self::TopicTooLong => "The provided topic is too long.",
            Self::ContentTooLong => "The provided content is too long.",
            Self::TopicEmpty => "The provided topic should not be empty.",
            Self::ContentEmpty => "The provided content should not be empty.",
            Self::Unauthorized => "The request was not signed by the stated author.",
            Self::AlreadyExists => "The storage key is already in use.",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TopicTooLong => "TopicTooLong",
            Self::ContentTooLong => "ContentTooLong",
            Self::TopicEmpty => "TopicEmpty",
            Self::ContentEmpty => "ContentEmpty",
            Self::Unauthorized => "Unauthorized",
            Self::AlreadyExists => "AlreadyExists",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u32(), self.message())
    }
}

/// Errors produced by the ledger program.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// The request was refused. Nothing was written.
    #[error("rejected: {0}")]
    Rejected(ErrorCode),

    /// The store failed for a reason other than an occupied key.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl ProgramError {
    /// The rejection code, if this is a program-level decision.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected(code) => Some(*code),
            Self::Store(_) => None,
        }
    }
}

impl From<ErrorCode> for ProgramError {
    fn from(code: ErrorCode) -> Self {
        Self::Rejected(code)
    }
}

impl From<StoreError> for ProgramError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(_) => Self::Rejected(ErrorCode::AlreadyExists),
            other => Self::Store(other),
        }
    }
}
