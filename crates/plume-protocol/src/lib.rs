//! Wire protocol for Plume.
//!
//! Defines the framing, message types, and serialization format used between
//! Plume clients and nodes for submitting creation requests and querying
//! stored post accounts.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod stream;

pub use codec::PlumeCodec;
pub use endpoint::Endpoint;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{PlumeMessage, MAX_MESSAGE_SIZE, PAGE_BYTES, PROTOCOL_VERSION};
pub use stream::{read_message, write_message};
