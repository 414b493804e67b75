use std::sync::Arc;

use plume_ledger::{PostProgram, ProgramError};
use plume_types::StorageKey;
use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::message::{PlumeMessage, PAGE_BYTES, PROTOCOL_VERSION};

/// Key plus bincode length prefix around each entry's bytes.
const ENTRY_OVERHEAD: usize = 32 + 8;

/// Answers protocol requests against a ledger program.
///
/// This is the single place a request becomes a program call, shared by the
/// TCP node and by in-process transports.
#[derive(Clone)]
pub struct Endpoint {
    program: Arc<PostProgram>,
}

impl Endpoint {
    pub fn new(program: Arc<PostProgram>) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &Arc<PostProgram> {
        &self.program
    }

    /// Reply to a `Hello` carrying `version`.
    pub fn handshake(&self, version: u32) -> PlumeMessage {
        if version == PROTOCOL_VERSION {
            PlumeMessage::HelloAck {
                version: PROTOCOL_VERSION,
            }
        } else {
            PlumeMessage::Error {
                message: ProtocolError::VersionMismatch {
                    local: PROTOCOL_VERSION,
                    remote: version,
                }
                .to_string(),
            }
        }
    }

    /// Produce the replies for one request, in the order they must be sent.
    ///
    /// Never fails: every problem becomes a `Rejected` or `Error` reply.
    /// `QueryAll` yields one or more `Accounts` pages closed by
    /// `AccountsEnd`; every other request yields exactly one reply.
    pub fn respond(&self, request: PlumeMessage) -> Vec<PlumeMessage> {
        match request {
            PlumeMessage::Hello { version } => vec![self.handshake(version)],
            PlumeMessage::SubmitCreation { instruction } => {
                let reply = match self.program.create_post(&instruction) {
                    Ok(_) => PlumeMessage::Submitted {
                        tx: instruction.transaction_id(),
                    },
                    Err(ProgramError::Rejected(code)) => PlumeMessage::Rejected {
                        code: code.as_u32(),
                    },
                    Err(err) => {
                        warn!(error = %err, "submission failed");
                        PlumeMessage::Error {
                            message: err.to_string(),
                        }
                    }
                };
                vec![reply]
            }
            PlumeMessage::QueryAll => match self.program.store().list_all() {
                Ok(entries) => paginate(entries, PAGE_BYTES),
                Err(err) => {
                    warn!(error = %err, "account listing failed");
                    vec![PlumeMessage::Error {
                        message: err.to_string(),
                    }]
                }
            },
            PlumeMessage::GetAccount { key } => {
                let reply = match self.program.store().get(&key) {
                    Ok(data) => PlumeMessage::Account { key, data },
                    Err(err) => PlumeMessage::Error {
                        message: err.to_string(),
                    },
                };
                vec![reply]
            }
            other => {
                debug!(kind = other.type_name(), "unexpected message from client");
                vec![PlumeMessage::Error {
                    message: format!("unexpected message: {}", other.type_name()),
                }]
            }
        }
    }
}

/// Split a listing into `Accounts` pages of at most `budget` entry bytes,
/// followed by `AccountsEnd`.
///
/// An entry too large for a page on its own cannot be a post record and is
/// left out of the listing.
fn paginate(entries: Vec<(StorageKey, Vec<u8>)>, budget: usize) -> Vec<PlumeMessage> {
    let mut pages = Vec::new();
    let mut page = Vec::new();
    let mut used = 0;
    let mut count = 0u64;

    for (key, data) in entries {
        let cost = ENTRY_OVERHEAD + data.len();
        if cost > budget {
            warn!(key = %key.short_id(), bytes = data.len(), "account too large to list");
            continue;
        }
        if used + cost > budget {
            pages.push(PlumeMessage::Accounts {
                entries: std::mem::take(&mut page),
            });
            used = 0;
        }
        used += cost;
        count += 1;
        page.push((key, data));
    }
    if !page.is_empty() || pages.is_empty() {
        pages.push(PlumeMessage::Accounts { entries: page });
    }
    pages.push(PlumeMessage::AccountsEnd { count });
    pages
}
