use async_trait::async_trait;
use plume_ledger::CreatePost;
use plume_protocol::{read_message, write_message, PlumeMessage, ProtocolError, PROTOCOL_VERSION};
use plume_types::{StorageKey, TransactionId};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{SubmitError, TransportError};
use crate::transport::{submit_reply, unexpected, AccountListing, LedgerTransport};

/// A transport to a `plume-server` node over TCP.
///
/// Each call opens a connection, performs the version handshake, and sends
/// exactly one request, then reads replies until the request is answered.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Connect and complete the version handshake.
    async fn open(&self) -> Result<TcpStream, TransportError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| TransportError::Unreachable(format!("{}: {e}", self.addr)))?;

        let hello = PlumeMessage::Hello {
            version: PROTOCOL_VERSION,
        };
        write_message(&mut stream, &hello).await.map_err(protocol_failure)?;
        match next_reply(&mut stream).await? {
            PlumeMessage::HelloAck { version } if version == PROTOCOL_VERSION => Ok(stream),
            PlumeMessage::Error { message } => Err(TransportError::Remote(message)),
            other => Err(unexpected(&other)),
        }
    }

    async fn send(&self, request: PlumeMessage) -> Result<TcpStream, TransportError> {
        let mut stream = self.open().await?;
        debug!(addr = %self.addr, kind = request.type_name(), "sending request");
        write_message(&mut stream, &request).await.map_err(protocol_failure)?;
        Ok(stream)
    }
}

#[async_trait]
impl LedgerTransport for TcpTransport {
    async fn submit_creation(&self, instruction: CreatePost) -> Result<TransactionId, SubmitError> {
        let mut stream = self.send(PlumeMessage::SubmitCreation { instruction }).await?;
        submit_reply(next_reply(&mut stream).await?)
    }

    async fn query_all(&self) -> Result<Vec<(StorageKey, Vec<u8>)>, TransportError> {
        let mut stream = self.send(PlumeMessage::QueryAll).await?;
        let mut listing = AccountListing::default();
        loop {
            if let Some(entries) = listing.push(next_reply(&mut stream).await?)? {
                return Ok(entries);
            }
        }
    }
}

async fn next_reply(stream: &mut TcpStream) -> Result<PlumeMessage, TransportError> {
    read_message(stream)
        .await
        .map_err(protocol_failure)?
        .ok_or_else(closed)
}

fn protocol_failure(err: ProtocolError) -> TransportError {
    match err {
        ProtocolError::Io(e) => TransportError::Unreachable(e.to_string()),
        other => TransportError::Malformed(other.to_string()),
    }
}

fn closed() -> TransportError {
    TransportError::Unreachable("connection closed by node".into())
}
