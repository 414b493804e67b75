//! Post record storage for Plume.
//!
//! This crate owns the durable representation of a post: the [`PostRecord`]
//! model, its fixed binary layout, and the key-addressed [`PostStore`]
//! contract the ledger program writes through.
//!
//! # Storage Backends
//!
//! All backends implement the [`PostStore`] trait:
//!
//! - [`InMemoryPostStore`] -- insertion-ordered map for tests and embedding
//! - [`DirectoryPostStore`] -- one file per key, published atomically
//!
//! # Design Rules
//!
//! 1. Records are immutable once written. There is no update or delete.
//! 2. `put_if_absent` is the only write, and it never overwrites.
//! 3. Readers never observe a partially written record.
//! 4. The store never interprets record bytes -- decoding is the caller's job.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod directory;
pub mod error;
pub mod memory;
pub mod record;
pub mod traits;

pub use directory::DirectoryPostStore;
pub use error::{CodecError, StoreError, StoreResult};
pub use memory::InMemoryPostStore;
pub use record::{PostRecord, StoredPost, CONTENT_MAX_CHARS, TOPIC_MAX_CHARS};
pub use traits::PostStore;
