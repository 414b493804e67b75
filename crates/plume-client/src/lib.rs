//! Aggregation client for Plume.
//!
//! A [`Session`] pairs an identity with a transport to a node. A [`Feed`]
//! built on a session lists every post newest first and submits new posts,
//! refreshing only after the node confirms the write.
//!
//! ```text
//! Idle -> Loading -> Ready | Failed
//! Ready -> Submitting -> Ready | Failed
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod session;
pub mod tcp;
pub mod transport;

pub use config::{ClientConfig, RetryPolicy};
pub use error::{ClientError, ClientResult, ErrorClass, RejectionCode, SubmitError, TransportError};
pub use feed::{Feed, FeedSnapshot, FeedState};
pub use session::Session;
pub use tcp::TcpTransport;
pub use transport::{LedgerTransport, LocalTransport};

pub use plume_store::StoredPost;
