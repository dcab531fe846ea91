use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame exceeds maximum size ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("no gathering is published under web name {0:?}")]
    UnknownWebName(String),
    #[error("a master already owns web name {0:?}")]
    WebNameTaken(String),
    #[error("session closed")]
    SessionClosed,
}
