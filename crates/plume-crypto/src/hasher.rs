/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so identical bytes hashed for different purposes never
/// collide.
pub struct DomainHasher {
    domain: &'static str,
}

impl DomainHasher {
    /// Hasher for account discriminators.
    pub const ACCOUNT: Self = Self {
        domain: "plume-account-v1",
    };
    /// Hasher for transaction ids.
    pub const TRANSACTION: Self = Self {
        domain: "plume-tx-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// The leading eight bytes of the domain hash of `name`.
    ///
    /// Used as a type tag at the start of stored records.
    pub fn discriminator(&self, name: &str) -> [u8; 8] {
        let digest = self.hash(name.as_bytes());
        let mut out = [0u8; 8];
        out.copy_from_slice(&digest[..8]);
        out
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            DomainHasher::ACCOUNT.hash(b"hello"),
            DomainHasher::ACCOUNT.hash(b"hello")
        );
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        assert_ne!(
            DomainHasher::ACCOUNT.hash(b"same"),
            DomainHasher::TRANSACTION.hash(b"same")
        );
    }

    #[test]
    fn domain_hash_differs_from_raw_blake3() {
        let raw = *blake3::hash(b"data").as_bytes();
        assert_ne!(DomainHasher::new("x").hash(b"data"), raw);
    }

    #[test]
    fn discriminator_is_hash_prefix() {
        let full = DomainHasher::ACCOUNT.hash(b"PostRecord");
        let disc = DomainHasher::ACCOUNT.discriminator("PostRecord");
        assert_eq!(&full[..8], &disc);
        assert_ne!(disc, DomainHasher::ACCOUNT.discriminator("Other"));
    }
}
