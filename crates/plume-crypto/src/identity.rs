use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use plume_types::AuthorId;

use crate::signer::{Signature, SigningKey};

/// A wallet-like identity provider.
///
/// Supplies a public identity and a signing capability. Implementations
/// keep private key material to themselves; callers only ever see the
/// public identity and finished signatures.
pub trait Identity: Send + Sync {
    /// The identity posts are attributed to.
    fn public_identity(&self) -> AuthorId;

    /// Sign `message` on behalf of [`Self::public_identity`].
    fn sign(&self, message: &[u8]) -> Signature;
}

/// An in-process Ed25519 keypair.
#[derive(Debug)]
pub struct Keypair {
    secret: SigningKey,
    author: AuthorId,
}

impl Keypair {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate())
    }

    pub fn from_signing_key(secret: SigningKey) -> Self {
        let author = secret.author();
        Self { secret, author }
    }

    /// Load a keypair from a file holding the hex-encoded 32-byte secret.
    pub fn read_from_file(path: &Path) -> Result<Self, KeyFileError> {
        let text = fs::read_to_string(path)?;
        let bytes = hex::decode(text.trim()).map_err(|e| KeyFileError::Malformed(e.to_string()))?;
        let secret: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeyFileError::Malformed(format!("expected 32 secret bytes, got {}", b.len()))
        })?;
        Ok(Self::from_signing_key(SigningKey::from_secret(secret)))
    }

    /// Write the hex-encoded secret to `path`. Refuses to overwrite.
    ///
    /// The file is created exclusively and, on unix, readable by its owner
    /// only.
    pub fn write_to_file(&self, path: &Path) -> Result<(), KeyFileError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => KeyFileError::AlreadyExists(path.display().to_string()),
            _ => KeyFileError::Io(e),
        })?;
        file.write_all(hex::encode(self.secret.secret()).as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl Identity for Keypair {
    fn public_identity(&self) -> AuthorId {
        self.author
    }

    fn sign(&self, message: &[u8]) -> Signature {
        self.secret.sign(message)
    }
}

/// Errors from loading or saving key files.
#[derive(Debug, thiserror::Error)]
pub enum KeyFileError {
    #[error("malformed key file: {0}")]
    Malformed(String),

    #[error("key file already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::verify_author;

    #[test]
    fn signatures_verify_under_public_identity() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"post");
        assert!(verify_author(&kp.public_identity(), b"post", &sig).is_ok());
    }

    #[test]
    fn key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.key");
        let kp = Keypair::generate();
        kp.write_to_file(&path).unwrap();
        let loaded = Keypair::read_from_file(&path).unwrap();
        assert_eq!(loaded.public_identity(), kp.public_identity());
    }

    #[test]
    fn write_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.key");
        Keypair::generate().write_to_file(&path).unwrap();
        assert!(matches!(
            Keypair::generate().write_to_file(&path),
            Err(KeyFileError::AlreadyExists(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.key");
        Keypair::generate().write_to_file(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn failed_overwrite_keeps_the_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.key");
        let first = Keypair::generate();
        first.write_to_file(&path).unwrap();
        let _ = Keypair::generate().write_to_file(&path);
        let loaded = Keypair::read_from_file(&path).unwrap();
        assert_eq!(loaded.public_identity(), first.public_identity());
    }

    #[test]
    fn read_rejects_short_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.key");
        fs::write(&path, "abcd").unwrap();
        assert!(matches!(
            Keypair::read_from_file(&path),
            Err(KeyFileError::Malformed(_))
        ));
    }
}
