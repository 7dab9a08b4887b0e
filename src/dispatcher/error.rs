use crate::classifiers::ClassifierError;
use crate::protocol::Opcode;
use crate::transport::TransportError;
use thiserror::Error;

/// Ends the session. Everything else is answered and the loop continues.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("transport failed")]
    Transport(#[from] TransportError),

    #[error("classifier failed during '{opcode}'")]
    Classifier {
        opcode: Opcode,
        #[source]
        source: ClassifierError,
    },
}
