use plume_ledger::CreatePost;
use plume_types::{StorageKey, TransactionId};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
/// Entry bytes carried by one `Accounts` page, well under the frame limit.
pub const PAGE_BYTES: usize = 4 * 1024 * 1024;

/// All message types in the Plume protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlumeMessage {
    Hello { version: u32 },
    HelloAck { version: u32 },
    SubmitCreation { instruction: CreatePost },
    Submitted { tx: TransactionId },
    QueryAll,
    /// One page of a `QueryAll` listing, in store order.
    Accounts { entries: Vec<(StorageKey, Vec<u8>)> },
    /// Closes a `QueryAll` listing; `count` is the number of entries sent.
    AccountsEnd { count: u64 },
    GetAccount { key: StorageKey },
    Account { key: StorageKey, data: Option<Vec<u8>> },
    /// The program refused the request; `code` is a program error code.
    Rejected { code: u32 },
    /// The node failed to process the request.
    Error { message: String },
}

impl PlumeMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Hello { .. } => 1,
            Self::HelloAck { .. } => 2,
            Self::SubmitCreation { .. } => 3,
            Self::Submitted { .. } => 4,
            Self::QueryAll => 5,
            Self::Accounts { .. } => 6,
            Self::GetAccount { .. } => 7,
            Self::Account { .. } => 8,
            Self::Rejected { .. } => 9,
            Self::AccountsEnd { .. } => 10,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "Hello",
            Self::HelloAck { .. } => "HelloAck",
            Self::SubmitCreation { .. } => "SubmitCreation",
            Self::Submitted { .. } => "Submitted",
            Self::QueryAll => "QueryAll",
            Self::Accounts { .. } => "Accounts",
            Self::AccountsEnd { .. } => "AccountsEnd",
            Self::GetAccount { .. } => "GetAccount",
            Self::Account { .. } => "Account",
            Self::Rejected { .. } => "Rejected",
            Self::Error { .. } => "Error",
        }
    }
}
