use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{PlumeMessage, MAX_MESSAGE_SIZE};

/// Length of the frame header: 4-byte big-endian length plus 1-byte tag.
pub const HEADER_LEN: usize = 5;

/// Frames [`PlumeMessage`]s for a byte stream.
pub struct PlumeCodec;

impl PlumeCodec {
    /// Frame `msg` as `[u32 be len][tag][bincode payload]`, where `len`
    /// covers the tag and the payload.
    pub fn encode(msg: &PlumeMessage) -> ProtocolResult<Vec<u8>> {
        let payload = Self::encode_payload(msg)?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
        frame.push(msg.type_tag());
        frame.extend(payload);
        Ok(frame)
    }

    /// Decode the first frame in `data`, returning it with the number of
    /// bytes it occupied.
    pub fn decode(data: &[u8]) -> ProtocolResult<(PlumeMessage, usize)> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::Framing("too short".into()));
        }
        let len = Self::frame_len(&data[..4])?;
        let end = 4 + len;
        if data.len() < end {
            return Err(ProtocolError::Framing(format!(
                "incomplete: have {}, need {}",
                data.len(),
                end
            )));
        }
        let msg = Self::decode_body(data[4], &data[HEADER_LEN..end])?;
        Ok((msg, end))
    }

    /// Validate a 4-byte length header and return the frame length it names.
    pub fn frame_len(header: &[u8]) -> ProtocolResult<usize> {
        let bytes: [u8; 4] = header
            .try_into()
            .map_err(|_| ProtocolError::Framing("length header must be 4 bytes".into()))?;
        let len = u32::from_be_bytes(bytes) as usize;
        if len < 1 {
            return Err(ProtocolError::Framing("zero-length frame".into()));
        }
        if len - 1 > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len - 1,
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(len)
    }

    /// Decode a tag byte and payload, checking that they agree.
    pub fn decode_body(tag: u8, payload: &[u8]) -> ProtocolResult<PlumeMessage> {
        let msg = Self::decode_payload(payload)?;
        if msg.type_tag() != tag {
            return Err(ProtocolError::UnknownTag(tag));
        }
        Ok(msg)
    }

    /// The bincode body of `msg`, without a header.
    pub fn encode_payload(msg: &PlumeMessage) -> ProtocolResult<Vec<u8>> {
        bincode::serialize(msg).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    pub fn decode_payload(data: &[u8]) -> ProtocolResult<PlumeMessage> {
        bincode::deserialize(data).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
