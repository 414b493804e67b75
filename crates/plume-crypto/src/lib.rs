//! Cryptographic primitives for Plume.
//!
//! Provides Ed25519 signing/verification bound to [`AuthorId`]s, the
//! [`Identity`] seam through which a wallet supplies a public identity and a
//! signing capability, and domain-separated BLAKE3 hashing.
//!
//! All crypto operations wrap established libraries — no custom cryptography.
//!
//! [`AuthorId`]: plume_types::AuthorId

pub mod hasher;
pub mod identity;
pub mod signer;

pub use hasher::DomainHasher;
pub use identity::{Identity, Keypair, KeyFileError};
pub use signer::{verify_author, Signature, SignatureError, SigningKey, VerifyingKey};
