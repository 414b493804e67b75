use std::sync::Arc;

use async_trait::async_trait;
use plume_ledger::{CreatePost, PostProgram};
use plume_protocol::{Endpoint, PlumeCodec, PlumeMessage};
use plume_store::InMemoryPostStore;
use plume_types::{StorageKey, TransactionId};

use crate::error::{RejectionCode, SubmitError, TransportError};

/// The client's view of a node.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submit a signed creation request and wait for the node's verdict.
    async fn submit_creation(&self, instruction: CreatePost) -> Result<TransactionId, SubmitError>;

    /// Every stored account, as raw bytes, in the node's store order.
    async fn query_all(&self) -> Result<Vec<(StorageKey, Vec<u8>)>, TransportError>;
}

/// A transport to a program running in the same process.
///
/// Requests and replies still pass through the wire codec, so anything that
/// works here also survives the network.
#[derive(Clone)]
pub struct LocalTransport {
    endpoint: Endpoint,
}

impl LocalTransport {
    pub fn new(program: Arc<PostProgram>) -> Self {
        Self {
            endpoint: Endpoint::new(program),
        }
    }

    /// A transport over a fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(PostProgram::new(Arc::new(InMemoryPostStore::new()))))
    }

    pub fn program(&self) -> &Arc<PostProgram> {
        self.endpoint.program()
    }

    fn exchange(&self, request: PlumeMessage) -> Result<Vec<PlumeMessage>, TransportError> {
        let request = through_codec(&request)?;
        self.endpoint
            .respond(request)
            .iter()
            .map(through_codec)
            .collect()
    }
}

#[async_trait]
impl LedgerTransport for LocalTransport {
    async fn submit_creation(&self, instruction: CreatePost) -> Result<TransactionId, SubmitError> {
        let reply = self
            .exchange(PlumeMessage::SubmitCreation { instruction })?
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Malformed("empty reply".into()))?;
        submit_reply(reply)
    }

    async fn query_all(&self) -> Result<Vec<(StorageKey, Vec<u8>)>, TransportError> {
        let mut listing = AccountListing::default();
        for reply in self.exchange(PlumeMessage::QueryAll)? {
            if let Some(entries) = listing.push(reply)? {
                return Ok(entries);
            }
        }
        Err(TransportError::Malformed(
            "account listing ended without AccountsEnd".into(),
        ))
    }
}

fn through_codec(msg: &PlumeMessage) -> Result<PlumeMessage, TransportError> {
    let bytes = PlumeCodec::encode(msg).map_err(|e| TransportError::Malformed(e.to_string()))?;
    let (msg, _) =
        PlumeCodec::decode(&bytes).map_err(|e| TransportError::Malformed(e.to_string()))?;
    Ok(msg)
}

/// Interpret a node's reply to `SubmitCreation`.
pub(crate) fn submit_reply(reply: PlumeMessage) -> Result<TransactionId, SubmitError> {
    match reply {
        PlumeMessage::Submitted { tx } => Ok(tx),
        PlumeMessage::Rejected { code } => Err(SubmitError::Rejected(RejectionCode::new(code))),
        PlumeMessage::Error { message } => Err(TransportError::Remote(message).into()),
        other => Err(unexpected(&other).into()),
    }
}

/// Reassembles the paged reply to `QueryAll`.
#[derive(Debug, Default)]
pub(crate) struct AccountListing {
    entries: Vec<(StorageKey, Vec<u8>)>,
}

impl AccountListing {
    /// Take the next reply; yields the whole listing once it is closed.
    pub(crate) fn push(
        &mut self,
        reply: PlumeMessage,
    ) -> Result<Option<Vec<(StorageKey, Vec<u8>)>>, TransportError> {
        match reply {
            PlumeMessage::Accounts { entries } => {
                self.entries.extend(entries);
                Ok(None)
            }
            PlumeMessage::AccountsEnd { count } if count == self.entries.len() as u64 => {
                Ok(Some(std::mem::take(&mut self.entries)))
            }
            PlumeMessage::AccountsEnd { count } => Err(TransportError::Malformed(format!(
                "node announced {count} accounts but sent {}",
                self.entries.len()
            ))),
            PlumeMessage::Error { message } => Err(TransportError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }
}

pub(crate) fn unexpected(reply: &PlumeMessage) -> TransportError {
    TransportError::Malformed(format!("unexpected reply: {}", reply.type_name()))
}

#[cfg(test)]
mod tests {
    use plume_crypto::{Identity, Keypair};
    use plume_ledger::ErrorCode;
    use plume_protocol::MAX_MESSAGE_SIZE;
    use plume_store::{PostRecord, PostStore};
    use plume_types::{AuthorId, UnixTimestamp};

    use super::*;

    #[tokio::test]
    async fn local_submit_and_query() {
        let transport = LocalTransport::in_memory();
        let kp = Keypair::generate();
        let ix = CreatePost::signed(&kp, StorageKey::generate(), "topic", "content");

        let tx = transport.submit_creation(ix.clone()).await.unwrap();
        assert_eq!(tx, ix.transaction_id());

        let entries = transport.query_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        let record = PostRecord::decode(&entries[0].1).unwrap();
        assert_eq!(record.author, kp.public_identity());
    }

    #[tokio::test]
    async fn local_rejection_is_not_a_transport_error() {
        let transport = LocalTransport::in_memory();
        let kp = Keypair::generate();
        let ix = CreatePost::signed(&kp, StorageKey::generate(), "x".repeat(51), "c");
        let err = transport.submit_creation(ix).await.unwrap_err();
        assert_eq!(err, SubmitError::Rejected(ErrorCode::TopicTooLong.into()));
        assert_eq!(transport.program().store().len().unwrap(), 0);
    }

    #[test]
    fn replies_map_to_outcomes() {
        assert!(matches!(
            submit_reply(PlumeMessage::Error {
                message: "disk full".into()
            }),
            Err(SubmitError::Transport(TransportError::Remote(_)))
        ));
        assert!(matches!(
            submit_reply(PlumeMessage::QueryAll),
            Err(SubmitError::Transport(TransportError::Malformed(_)))
        ));
        assert!(matches!(
            AccountListing::default().push(PlumeMessage::Rejected { code: 6000 }),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            AccountListing::default().push(PlumeMessage::Error {
                message: "disk full".into()
            }),
            Err(TransportError::Remote(_))
        ));
    }

    #[test]
    fn listing_joins_pages_in_order() {
        let a = (StorageKey::from_bytes([1; 32]), vec![1]);
        let b = (StorageKey::from_bytes([2; 32]), vec![2]);
        let mut listing = AccountListing::default();
        assert_eq!(
            listing
                .push(PlumeMessage::Accounts {
                    entries: vec![a.clone()]
                })
                .unwrap(),
            None
        );
        listing
            .push(PlumeMessage::Accounts {
                entries: vec![b.clone()],
            })
            .unwrap();
        assert_eq!(
            listing.push(PlumeMessage::AccountsEnd { count: 2 }).unwrap(),
            Some(vec![a, b])
        );
    }

    #[test]
    fn listing_with_wrong_count_is_malformed() {
        let mut listing = AccountListing::default();
        listing
            .push(PlumeMessage::Accounts {
                entries: vec![(StorageKey::from_bytes([1; 32]), vec![1])],
            })
            .unwrap();
        assert!(matches!(
            listing.push(PlumeMessage::AccountsEnd { count: 3 }),
            Err(TransportError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn listing_larger_than_one_frame_arrives_whole() {
        let store = Arc::new(InMemoryPostStore::new());
        let record = PostRecord {
            author: AuthorId::from_bytes([5; 32]),
            created_at: UnixTimestamp::from_secs(1_700_000_000),
            topic: "🚀".repeat(50),
            content: "🚀".repeat(280),
        }
        .encode();
        let total = MAX_MESSAGE_SIZE / record.len() + 1_000;
        for _ in 0..total {
            store.put_if_absent(&StorageKey::generate(), &record).unwrap();
        }
        let transport = LocalTransport::new(Arc::new(PostProgram::new(store)));

        let entries = transport.query_all().await.unwrap();
        assert_eq!(entries.len(), total);
        assert!(entries.iter().all(|(_, data)| *data == record));
    }
}
