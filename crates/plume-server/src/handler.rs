use plume_protocol::{read_message, write_message, Endpoint, PlumeMessage, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};

/// Serve one client connection until it closes.
///
/// The first message must be a `Hello` with a matching version. After that
/// every request gets its replies in order: one for most requests, a run of
/// pages for `QueryAll`. Program calls run on the blocking pool because
/// stores may touch the disk.
pub async fn handle_connection<S>(mut stream: S, endpoint: Endpoint) -> ServerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match read_message(&mut stream).await? {
        None => return Ok(()),
        Some(PlumeMessage::Hello { version }) => {
            let reply = endpoint.handshake(version);
            let accepted = matches!(reply, PlumeMessage::HelloAck { .. });
            write_message(&mut stream, &reply).await?;
            if !accepted {
                return Err(ServerError::Handshake("protocol version mismatch".into()));
            }
        }
        Some(other) => {
            let message = format!("expected Hello, got {}", other.type_name());
            write_message(&mut stream, &PlumeMessage::Error { message: message.clone() }).await?;
            return Err(ServerError::Handshake(message));
        }
    }

    loop {
        let request = match read_message(&mut stream).await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(err) => {
                // Best effort: the peer may already be gone.
                let reply = PlumeMessage::Error {
                    message: err.to_string(),
                };
                let _ = write_message(&mut stream, &reply).await;
                return Err(err.into());
            }
        };
        debug!(kind = request.type_name(), "request");
        let ep = endpoint.clone();
        let replies = tokio::task::spawn_blocking(move || ep.respond(request)).await?;
        for reply in &replies {
            send_reply(&mut stream, reply).await?;
        }
    }
}

/// Write one reply. A reply that cannot be framed is nothing on the wire
/// yet, so the peer gets an `Error` in its place and the connection lives on.
async fn send_reply<S>(stream: &mut S, reply: &PlumeMessage) -> ServerResult<()>
where
    S: AsyncWrite + Unpin,
{
    match write_message(stream, reply).await {
        Err(err @ (ProtocolError::FrameTooLarge { .. } | ProtocolError::Encode(_))) => {
            warn!(kind = reply.type_name(), error = %err, "reply could not be framed");
            let fallback = PlumeMessage::Error {
                message: err.to_string(),
            };
            write_message(stream, &fallback).await?;
            Ok(())
        }
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plume_crypto::Keypair;
    use plume_ledger::{CreatePost, PostProgram};
    use plume_protocol::{MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
    use plume_store::InMemoryPostStore;
    use plume_types::StorageKey;
    use tokio::io::AsyncWriteExt;

    use super::*;

    fn endpoint() -> Endpoint {
        Endpoint::new(Arc::new(PostProgram::new(Arc::new(InMemoryPostStore::new()))))
    }

    fn hello() -> PlumeMessage {
        PlumeMessage::Hello {
            version: PROTOCOL_VERSION,
        }
    }

    #[tokio::test]
    async fn handshake_then_requests() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(handle_connection(server, endpoint()));

        write_message(&mut client, &hello()).await.unwrap();
        assert!(matches!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::HelloAck { .. })
        ));

        let ix = CreatePost::signed(&Keypair::generate(), StorageKey::generate(), "t", "c");
        write_message(&mut client, &PlumeMessage::SubmitCreation { instruction: ix.clone() })
            .await
            .unwrap();
        assert_eq!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::Submitted {
                tx: ix.transaction_id()
            })
        );

        write_message(&mut client, &PlumeMessage::QueryAll).await.unwrap();
        let Some(PlumeMessage::Accounts { entries }) = read_message(&mut client).await.unwrap()
        else {
            panic!("expected Accounts");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::AccountsEnd { count: 1 })
        );

        drop(client);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn request_before_hello_is_refused() {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(handle_connection(server, endpoint()));

        write_message(&mut client, &PlumeMessage::QueryAll).await.unwrap();
        assert!(matches!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::Error { .. })
        ));
        assert!(matches!(
            task.await.unwrap(),
            Err(ServerError::Handshake(_))
        ));
    }

    #[tokio::test]
    async fn version_mismatch_closes() {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(handle_connection(server, endpoint()));

        write_message(&mut client, &PlumeMessage::Hello { version: 0 })
            .await
            .unwrap();
        assert!(matches!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::Error { .. })
        ));
        assert!(task.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn garbage_frame_gets_an_error_reply() {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(handle_connection(server, endpoint()));

        write_message(&mut client, &hello()).await.unwrap();
        read_message(&mut client).await.unwrap();

        client.write_all(&[0, 0, 0, 3, 5, 0xff, 0xff]).await.unwrap();
        assert!(matches!(
            read_message(&mut client).await.unwrap(),
            Some(PlumeMessage::Error { .. })
        ));
        assert!(matches!(task.await.unwrap(), Err(ServerError::Protocol(_))));
    }

    #[tokio::test]
    async fn unframeable_reply_becomes_an_error() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let oversized = PlumeMessage::Account {
            key: StorageKey::generate(),
            data: Some(vec![0; MAX_MESSAGE_SIZE + 1]),
        };
        send_reply(&mut server, &oversized).await.unwrap();

        let Some(PlumeMessage::Error { message }) = read_message(&mut client).await.unwrap() else {
            panic!("expected Error");
        };
        assert!(message.contains("exceeds"));
    }

    #[tokio::test]
    async fn immediate_close_is_clean() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        handle_connection(server, endpoint()).await.unwrap();
    }
}
