use plume_types::StorageKey;

/// Errors from post store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key already holds a record. The existing record is untouched.
    #[error("storage key already in use: {0}")]
    AlreadyExists(StorageKey),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from decoding stored record bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("record truncated: needed {needed} bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("not a post record (discriminator mismatch)")]
    Discriminator,

    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("field {field} has {chars} characters (max {max})")]
    FieldTooLong {
        field: &'static str,
        chars: usize,
        max: usize,
    },

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}
