use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Public identity of a post author.
///
/// An `AuthorId` is the raw 32-byte Ed25519 public key of the signer. It is
/// stored verbatim in every post record and is what the ledger program checks
/// the request signature against, so it is never hashed or derived.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthorId([u8; 32]);

impl AuthorId {
    /// Wrap raw public key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        crate::decode_hex32(s).map(Self)
    }

    /// Shortened form for display: first and last four hex characters.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        format!("{}...{}", &hex[..4], &hex[hex.len() - 4..])
    }
}

impl FromStr for AuthorId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorId({})", self.short())
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let id = AuthorId::from_bytes([0x5a; 32]);
        let parsed = AuthorId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = AuthorId::from_hex("abcd").unwrap_err();
        assert_eq!(err, TypeError::InvalidLength { expected: 32, actual: 2 });
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            AuthorId::from_hex(&"zz".repeat(32)),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_format() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0xcd;
        let short = AuthorId::from_bytes(bytes).short();
        assert_eq!(short, "ab00...00cd");
    }

    #[test]
    fn parse_via_from_str() {
        let id = AuthorId::from_bytes([7; 32]);
        let parsed: AuthorId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
