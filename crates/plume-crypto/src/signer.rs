use std::fmt;

use plume_types::AuthorId;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

const SIGNATURE_LEN: usize = 64;

/// An author's Ed25519 secret. Never printed and never serialized.
pub struct SigningKey(ed25519_dalek::SigningKey);

impl SigningKey {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&secret))
    }

    pub fn secret(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// The identity this key signs as: its compressed public key.
    pub fn author(&self) -> AuthorId {
        AuthorId::from_bytes(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message).to_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(author={})", self.author().short())
    }
}

/// The public half of an author's key, recovered from their id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

impl VerifyingKey {
    /// Fails when the id is not a valid curve point. No key can sign for
    /// such an author.
    pub fn from_author(author: &AuthorId) -> Result<Self, SignatureError> {
        ed25519_dalek::VerifyingKey::from_bytes(author.as_bytes())
            .map(Self)
            .map_err(|_| SignatureError::InvalidAuthor)
    }

    pub fn author(&self) -> AuthorId {
        AuthorId::from_bytes(self.0.to_bytes())
    }

    /// Strict verification: rejects weak keys and malleable signatures.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.0
            .verify_strict(message, &sig)
            .map_err(|_| SignatureError::BadSignature)
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyingKey({})", self.author().short())
    }
}

/// Check that `author` produced `signature` over `message`.
pub fn verify_author(
    author: &AuthorId,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    VerifyingKey::from_author(author)?.verify(message, signature)
}

/// A detached Ed25519 signature, kept as raw bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(SignatureVisitor)
    }
}

struct SignatureVisitor;

impl<'de> Visitor<'de> for SignatureVisitor {
    type Value = Signature;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SIGNATURE_LEN} signature bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Signature, E> {
        let bytes: [u8; SIGNATURE_LEN] = v
            .try_into()
            .map_err(|_| E::invalid_length(v.len(), &self))?;
        Ok(Signature(bytes))
    }

    // Self-describing formats such as JSON hand bytes over as a sequence.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Signature, A::Error> {
        let mut bytes = [0u8; SIGNATURE_LEN];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        if seq.next_element::<u8>()?.is_some() {
            return Err(de::Error::invalid_length(SIGNATURE_LEN + 1, &self));
        }
        Ok(Signature(bytes))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("author id is not a valid public key")]
    InvalidAuthor,
    #[error("signature does not match author and message")]
    BadSignature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_verifies_own_signature() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"gm");
        assert_eq!(verify_author(&sk.author(), b"gm", &sig), Ok(()));
    }

    #[test]
    fn other_message_fails() {
        let sk = SigningKey::generate();
        let sig = sk.sign(b"gm");
        assert_eq!(
            verify_author(&sk.author(), b"gn", &sig),
            Err(SignatureError::BadSignature)
        );
    }

    #[test]
    fn other_author_fails() {
        let sig = SigningKey::generate().sign(b"gm");
        let other = SigningKey::generate().author();
        assert!(verify_author(&other, b"gm", &sig).is_err());
    }

    #[test]
    fn key_recovered_from_author() {
        let sk = SigningKey::generate();
        let vk = VerifyingKey::from_author(&sk.author()).unwrap();
        assert_eq!(vk.author(), sk.author());
    }

    #[test]
    fn secret_reloads_to_same_author() {
        let sk = SigningKey::generate();
        assert_eq!(SigningKey::from_secret(*sk.secret()).author(), sk.author());
    }

    #[test]
    fn signature_serializes_in_json_and_bincode() {
        let sig = SigningKey::generate().sign(b"x");

        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(serde_json::from_str::<Signature>(&json).unwrap(), sig);

        let bin = bincode::serialize(&sig).unwrap();
        assert_eq!(bincode::deserialize::<Signature>(&bin).unwrap(), sig);
    }

    #[test]
    fn short_signature_is_rejected() {
        assert!(serde_json::from_str::<Signature>("[1,2,3]").is_err());
    }

    #[test]
    fn debug_never_shows_secret() {
        let sk = SigningKey::generate();
        let debug = format!("{sk:?}");
        assert!(!debug.contains(&hex::encode(sk.secret())));
    }
}
