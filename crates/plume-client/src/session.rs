use std::sync::Arc;

use plume_crypto::Identity;
use plume_types::AuthorId;

use crate::transport::LedgerTransport;

/// Who is acting and which node they talk to.
///
/// Passed explicitly into every client operation; there is no ambient
/// wallet or connection.
#[derive(Clone)]
pub struct Session {
    identity: Arc<dyn Identity>,
    transport: Arc<dyn LedgerTransport>,
}

impl Session {
    pub fn new(identity: Arc<dyn Identity>, transport: Arc<dyn LedgerTransport>) -> Self {
        Self {
            identity,
            transport,
        }
    }

    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }

    pub fn transport(&self) -> &Arc<dyn LedgerTransport> {
        &self.transport
    }

    /// The author posts from this session are attributed to.
    pub fn author(&self) -> AuthorId {
        self.identity.public_identity()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("author", &self.author())
            .finish_non_exhaustive()
    }
}
