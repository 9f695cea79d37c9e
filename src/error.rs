use crate::value::ValueError;
use thiserror::Error;

/// Errors raised while interpreting an inbound frame.
///
/// Only a frame whose shape violates the protocol contract produces an error;
/// referential misses (ids racing with removals) are logged and dropped by the
/// handlers instead.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown frame type code {0}")]
    UnknownFrameType(i64),
    #[error("frame value error: {0}")]
    Value(#[from] ValueError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client is not connected")]
    NotConnected,
    #[error("client is already connected")]
    AlreadyConnected,
    #[error("transport error: {0}")]
    Transport(anyhow::Error),
    #[error("codec error: {0}")]
    Codec(anyhow::Error),
    #[error("handshake failed: {0}")]
    Handshake(#[from] crate::handshake::HandshakeError),
}
