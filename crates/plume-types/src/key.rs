use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Unique address of a single post record.
///
/// Keys are chosen by the creating client, one fresh key per post. The store
/// guarantees that an occupied key is never overwritten, so a key names at
/// most one record for the lifetime of the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageKey([u8; 32]);

impl StorageKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        crate::decode_hex32(s).map(Self)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for StorageKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.short_id())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_keys_are_unique() {
        let a = StorageKey::generate();
        let b = StorageKey::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn short_id_is_eight_hex_chars() {
        let key = StorageKey::from_bytes([0xff; 32]);
        assert_eq!(key.short_id(), "ffffffff");
    }

    #[test]
    fn ordering_follows_bytes() {
        let a = StorageKey::from_bytes([0; 32]);
        let b = StorageKey::from_bytes([1; 32]);
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let key = StorageKey::from_bytes([3; 32]);
        let json = serde_json::to_string(&key).unwrap();
        let parsed: StorageKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }

    proptest! {
        #[test]
        fn hex_parse_inverts_display(bytes in any::<[u8; 32]>()) {
            let key = StorageKey::from_bytes(bytes);
            prop_assert_eq!(key.to_string().parse::<StorageKey>().unwrap(), key);
        }

        #[test]
        fn hex_order_matches_byte_order(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let (ka, kb) = (StorageKey::from_bytes(a), StorageKey::from_bytes(b));
            prop_assert_eq!(ka.cmp(&kb), ka.to_hex().cmp(&kb.to_hex()));
        }
    }
}
