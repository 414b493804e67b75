//! Foundation types for Plume.
//!
//! This crate provides the identifiers and time primitives shared by every
//! other Plume crate. It carries no business logic.
//!
//! # Key Types
//!
//! - [`AuthorId`] — 32-byte public identity of the signer who created a post
//! - [`StorageKey`] — unique 32-byte address under which one post record lives
//! - [`UnixTimestamp`] — signed seconds since the UNIX epoch
//! - [`TransactionId`] — acknowledgement id for a committed creation request

pub mod error;
pub mod identity;
pub mod key;
pub mod temporal;
pub mod transaction;

pub use error::TypeError;
pub use identity::AuthorId;
pub use key::StorageKey;
pub use temporal::UnixTimestamp;
pub use transaction::TransactionId;

/// Decode a 64-character hex string into 32 raw bytes.
pub(crate) fn decode_hex32(s: &str) -> Result<[u8; 32], TypeError> {
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}
