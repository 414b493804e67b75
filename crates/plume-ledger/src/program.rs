use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use plume_store::{PostRecord, PostStore};
use plume_types::{StorageKey, UnixTimestamp};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::ProgramError;
use crate::instruction::CreatePost;
use crate::validation::{validate_fields, verify_signer};

/// What a successful creation committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateReceipt {
    pub storage_key: StorageKey,
    pub created_at: UnixTimestamp,
}

/// The post ledger program: the single authoritative write path.
///
/// Every record in the store was validated, stamped, and committed here.
/// Creation stamps never go backwards for a given program instance, even if
/// the underlying clock does.
pub struct PostProgram {
    store: Arc<dyn PostStore>,
    clock: Arc<dyn Clock>,
    last_stamp: AtomicI64,
}

impl PostProgram {
    /// A program over `store` stamping from the wall clock.
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn PostStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            last_stamp: AtomicI64::new(i64::MIN),
        }
    }

    /// Read access to the store this program writes into.
    pub fn store(&self) -> &Arc<dyn PostStore> {
        &self.store
    }

    /// Validate `ix` and commit a new post record at `ix.storage_key`.
    ///
    /// Checks run in a fixed order and the first failure wins; nothing is
    /// written unless every check passes. An occupied key is reported as
    /// [`ErrorCode::AlreadyExists`] by the store's atomic insert.
    ///
    /// [`ErrorCode::AlreadyExists`]: crate::ErrorCode::AlreadyExists
    pub fn create_post(&self, ix: &CreatePost) -> Result<CreateReceipt, ProgramError> {
        if let Err(code) = validate_fields(&ix.topic, &ix.content).and_then(|()| verify_signer(ix))
        {
            debug!(
                key = %ix.storage_key.short_id(),
                author = %ix.author.short(),
                code = code.name(),
                "create_post rejected"
            );
            return Err(code.into());
        }

        let created_at = self.stamp();
        let record = PostRecord {
            author: ix.author,
            created_at,
            topic: ix.topic.clone(),
            content: ix.content.clone(),
        };

        if let Err(err) = self.store.put_if_absent(&ix.storage_key, &record.encode()) {
            let err = ProgramError::from(err);
            debug!(key = %ix.storage_key.short_id(), error = %err, "create_post commit failed");
            return Err(err);
        }

        info!(
            key = %ix.storage_key.short_id(),
            author = %ix.author.short(),
            created_at = created_at.as_secs(),
            "post created"
        );
        Ok(CreateReceipt {
            storage_key: ix.storage_key,
            created_at,
        })
    }

    fn stamp(&self) -> UnixTimestamp {
        let now = self.clock.now().as_secs();
        let prev = self.last_stamp.fetch_max(now, Ordering::SeqCst);
        UnixTimestamp::from_secs(now.max(prev))
    }
}

impl std::fmt::Debug for PostProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProgram").finish_non_exhaustive()
    }
}
