use crate::protocol::ProtocolError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("segment I/O failed")]
    Io(#[from] io::Error),

    #[error("invalid segment: {0}")]
    BadSegment(String),

    /// The current request cannot be decoded. The worker can answer it with a
    /// failure and keep serving.
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::Malformed(_))
    }

    pub fn as_protocol_error(&self) -> Option<ProtocolError> {
        match self {
            TransportError::Malformed(reason) => Some(ProtocolError::Malformed(reason.clone())),
            _ => None,
        }
    }
}
