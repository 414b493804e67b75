use std::future::Future;
use std::time::Duration;

use plume_ledger::{CreatePost, ErrorCode};
use plume_store::{PostRecord, StoredPost};
use plume_types::{StorageKey, TransactionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, SubmitError, TransportError};
use crate::session::Session;

/// Where a [`Feed`] is in its lifecycle. No state is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedState {
    Idle,
    Loading,
    Ready,
    Submitting,
    Failed,
}

/// A point-in-time view of a feed for display layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub state: FeedState,
    pub posts: Vec<StoredPost>,
    /// `true` when `posts` is the last known good list, not a fresh one.
    pub stale: bool,
    pub last_error: Option<String>,
    /// Entries the last refresh could not decode.
    pub skipped: usize,
}

/// Every post on a node, newest first.
///
/// The cached list only changes after a confirmed response from the node and
/// is always replaced as a whole. A failed refresh keeps the previous list
/// and marks it stale.
pub struct Feed {
    session: Session,
    config: ClientConfig,
    state: FeedState,
    posts: Vec<StoredPost>,
    stale: bool,
    last_error: Option<ClientError>,
    skipped: usize,
}

impl Feed {
    pub fn new(session: Session, config: ClientConfig) -> Self {
        Self {
            session,
            config,
            state: FeedState::Idle,
            posts: Vec::new(),
            stale: false,
            last_error: None,
            skipped: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    /// The cached posts, newest first.
    pub fn posts(&self) -> &[StoredPost] {
        &self.posts
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            state: self.state,
            posts: self.posts.clone(),
            stale: self.stale,
            last_error: self.last_error.as_ref().map(ToString::to_string),
            skipped: self.skipped,
        }
    }

    /// Load every post from the node, newest first.
    ///
    /// Posts with equal stamps keep the node's store order. Entries that are
    /// not post records are skipped. Transport failures are retried with
    /// backoff; if every attempt fails the previous list is kept, marked
    /// stale, and the error is returned.
    pub async fn fetch_all(&mut self) -> ClientResult<&[StoredPost]> {
        self.state = FeedState::Loading;
        match self.query_with_retry().await {
            Ok(entries) => {
                let (posts, skipped) = assemble(entries);
                debug!(count = posts.len(), skipped, "feed refreshed");
                self.posts = posts;
                self.skipped = skipped;
                self.stale = false;
                self.last_error = None;
                self.state = FeedState::Ready;
                Ok(&self.posts)
            }
            Err(err) => {
                warn!(error = %err, cached = self.posts.len(), "feed refresh failed");
                self.stale = true;
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Publish a post under a fresh storage key, then refresh.
    ///
    /// Nothing is added to the cached list until the node confirms the write
    /// and a refresh returns it. A taken key is retried with a new one; any
    /// other failure is returned without retrying. If only the follow-up
    /// refresh fails, the write still counts and its id is returned.
    pub async fn submit(&mut self, topic: &str, content: &str) -> ClientResult<TransactionId> {
        self.state = FeedState::Submitting;
        let tx = match self.submit_with_fresh_keys(topic, content).await {
            Ok(tx) => tx,
            Err(err) => {
                debug!(error = %err, class = %err.class(), "submission failed");
                self.fail(err.clone());
                return Err(err);
            }
        };
        info!(tx = %tx, "post confirmed");

        if let Err(err) = self.fetch_all().await {
            warn!(tx = %tx, error = %err, "refresh after submit failed");
        }
        Ok(tx)
    }

    async fn query_with_retry(&self) -> ClientResult<Vec<(StorageKey, Vec<u8>)>> {
        let policy = &self.config.retry;
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let call = self.session.transport().query_all();
            match bounded(self.config.request_timeout(), call).await {
                Ok(entries) => return Ok(entries),
                Err(err) if attempt < attempts => {
                    let delay = policy.backoff(attempt);
                    debug!(attempt, ?delay, error = %err, "query failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn submit_with_fresh_keys(&self, topic: &str, content: &str) -> ClientResult<TransactionId> {
        let identity = self.session.identity();
        let mut ix = CreatePost::signed(identity.as_ref(), StorageKey::generate(), topic, content);
        let mut regenerations = 0;
        loop {
            let call = self.session.transport().submit_creation(ix.clone());
            match bounded(self.config.request_timeout(), call).await {
                Ok(tx) => return Ok(tx),
                Err(SubmitError::Rejected(code))
                    if code.is(ErrorCode::AlreadyExists)
                        && regenerations < self.config.max_key_regenerations =>
                {
                    regenerations += 1;
                    debug!(
                        key = %ix.storage_key.short_id(),
                        regenerations,
                        "storage key taken, retrying with a new key"
                    );
                    ix = ix.rekeyed(identity.as_ref(), StorageKey::generate());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn fail(&mut self, err: ClientError) {
        self.last_error = Some(err);
        self.state = FeedState::Failed;
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("session", &self.session)
            .field("state", &self.state)
            .field("posts", &self.posts.len())
            .field("stale", &self.stale)
            .finish()
    }
}

async fn bounded<T, E, F>(limit: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit).into()),
    }
}

/// Decode raw accounts and order them newest first.
///
/// The sort is stable, so equal stamps keep their incoming order. Returns
/// the posts and the number of entries that failed to decode.
fn assemble(entries: Vec<(StorageKey, Vec<u8>)>) -> (Vec<StoredPost>, usize) {
    let mut posts = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (key, data) in entries {
        match PostRecord::decode(&data) {
            Ok(record) => posts.push(StoredPost { key, record }),
            Err(err) => {
                warn!(key = %key.short_id(), error = %err, "skipping undecodable account");
                skipped += 1;
            }
        }
    }
    posts.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
    (posts, skipped)
}
