use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("tag {0} does not match the message it carries")]
    UnknownTag(u8),

    #[error("frame of {size} bytes exceeds the {max}-byte limit")]
    FrameTooLarge { size: usize, max: usize },

    #[error("bad frame: {0}")]
    Framing(String),

    #[error("protocol version mismatch: local {local}, remote {remote}")]
    VersionMismatch { local: u32, remote: u32 },

    #[error("could not encode message: {0}")]
    Encode(String),

    #[error("could not decode message: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
