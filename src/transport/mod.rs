//! Message passing between the host and this worker.

mod error;
#[cfg(unix)]
pub mod shm;

pub use error::TransportError;

use crate::protocol::{CommandMessage, ProtocolError};

/// One side of the request/response channel, as seen by the worker.
///
/// Every received command is answered by exactly one `send_*` call, except
/// exit. Receiving blocks until the host has published a whole request.
pub trait Transport {
    fn receive_command(&mut self) -> Result<CommandMessage, TransportError>;

    /// Path text attached to the command last received.
    fn receive_path_message(&mut self) -> Result<String, TransportError>;

    fn send_ack(&mut self) -> Result<(), TransportError>;

    fn send_distribution(&mut self, distribution: &[f64]) -> Result<(), TransportError>;

    fn send_failure(&mut self, error: &ProtocolError) -> Result<(), TransportError>;
}
