use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::PlumeCodec;
use crate::error::ProtocolResult;
use crate::message::PlumeMessage;

/// Read one framed message from `reader`.
///
/// Returns `Ok(None)` if the stream ends cleanly before a new frame starts.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Option<PlumeMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = PlumeCodec::frame_len(&header)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    let msg = PlumeCodec::decode_body(body[0], &body[1..])?;
    tracing::trace!(kind = msg.type_name(), len, "frame read");
    Ok(Some(msg))
}

/// Write one framed message to `writer` and flush it.
pub async fn write_message<W>(writer: &mut W, msg: &PlumeMessage) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = PlumeCodec::encode(msg)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    tracing::trace!(kind = msg.type_name(), len = frame.len(), "frame written");
    Ok(())
}
