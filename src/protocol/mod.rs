//! The host/worker command protocol: opcodes, the per-request message and
//! the codec turning payload rows into instances.

pub mod codec;
mod command;
mod error;
mod opcode;

pub use command::CommandMessage;
pub use error::ProtocolError;
pub use opcode::Opcode;
