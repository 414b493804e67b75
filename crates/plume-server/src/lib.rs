//! Plume node.
//!
//! Hosts a post ledger program over the framed TCP protocol. Each connection
//! is served on its own task; all connections share one program.

pub mod config;
pub mod error;
pub mod handler;
pub mod node;

pub use config::NodeConfig;
pub use error::{ServerError, ServerResult};
pub use handler::handle_connection;
pub use node::{BoundNode, PlumeNode};
