use plume_crypto::{DomainHasher, Identity, Signature};
use plume_types::{AuthorId, StorageKey, TransactionId};
use serde::{Deserialize, Serialize};

const MESSAGE_DOMAIN: &[u8] = b"plume-create-post-v1:";

/// A signed request to create one post at `storage_key`.
///
/// The signature covers every other field, so a relay cannot move a post to
/// a different key or attribute it to a different author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePost {
    pub storage_key: StorageKey,
    pub author: AuthorId,
    pub topic: String,
    pub content: String,
    pub signature: Signature,
}

impl CreatePost {
    /// Build and sign a request on behalf of `identity`.
    pub fn signed(
        identity: &dyn Identity,
        storage_key: StorageKey,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let author = identity.public_identity();
        let topic = topic.into();
        let content = content.into();
        let signature = identity.sign(&Self::message(&storage_key, &author, &topic, &content));
        Self {
            storage_key,
            author,
            topic,
            content,
            signature,
        }
    }

    /// The canonical bytes the author signs.
    ///
    /// `domain ‖ key ‖ author ‖ u32le len ‖ topic ‖ u32le len ‖ content`
    pub fn message(
        storage_key: &StorageKey,
        author: &AuthorId,
        topic: &str,
        content: &str,
    ) -> Vec<u8> {
        let mut msg =
            Vec::with_capacity(MESSAGE_DOMAIN.len() + 64 + 8 + topic.len() + content.len());
        msg.extend_from_slice(MESSAGE_DOMAIN);
        msg.extend_from_slice(storage_key.as_bytes());
        msg.extend_from_slice(author.as_bytes());
        msg.extend_from_slice(&(topic.len() as u32).to_le_bytes());
        msg.extend_from_slice(topic.as_bytes());
        msg.extend_from_slice(&(content.len() as u32).to_le_bytes());
        msg.extend_from_slice(content.as_bytes());
        msg
    }

    /// The signing message for this request.
    pub fn signing_message(&self) -> Vec<u8> {
        Self::message(&self.storage_key, &self.author, &self.topic, &self.content)
    }

    /// Deterministic id of this exact signed request.
    pub fn transaction_id(&self) -> TransactionId {
        let mut data = self.signing_message();
        data.extend_from_slice(&self.signature.to_bytes());
        TransactionId::from_bytes(DomainHasher::TRANSACTION.hash(&data))
    }

    /// The same request addressed to a different key, re-signed.
    ///
    /// Used to recover from a key collision without changing the content.
    pub fn rekeyed(&self, identity: &dyn Identity, storage_key: StorageKey) -> Self {
        Self::signed(identity, storage_key, self.topic.clone(), self.content.clone())
    }
}
