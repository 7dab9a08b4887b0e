use crate::protocol::{CommandMessage, ProtocolError};
use crate::transport::{Transport, TransportError};
use std::collections::VecDeque;
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedResponse {
    Ack,
    Distribution(Vec<f64>),
    Failure(String),
}

/// Replays a fixed list of commands and records every response. Running out
/// of commands is reported as an I/O error, like a vanished host.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<(CommandMessage, Option<String>)>,
    current_path: Option<String>,
    responses: Vec<RecordedResponse>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, command: CommandMessage) -> Self {
        self.script.push_back((command, None));
        self
    }

    pub fn push_bare(self, opcode: u8) -> Self {
        self.push(CommandMessage::bare(opcode))
    }

    pub fn push_rows(self, opcode: u8, rows: Vec<Vec<f64>>, weights: Vec<f64>) -> Self {
        self.push(CommandMessage::with_rows(opcode, rows, weights))
    }

    pub fn push_path(mut self, opcode: u8, path: impl Into<String>) -> Self {
        self.script
            .push_back((CommandMessage::bare(opcode), Some(path.into())));
        self
    }

    pub fn responses(&self) -> &[RecordedResponse] {
        &self.responses
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transport for ScriptedTransport {
    fn receive_command(&mut self) -> Result<CommandMessage, TransportError> {
        let (command, path) = self.script.pop_front().ok_or_else(|| {
            TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "script exhausted",
            ))
        })?;
        self.current_path = path;
        Ok(command)
    }

    fn receive_path_message(&mut self) -> Result<String, TransportError> {
        self.current_path
            .take()
            .ok_or_else(|| TransportError::Malformed("no path attached".into()))
    }

    fn send_ack(&mut self) -> Result<(), TransportError> {
        self.responses.push(RecordedResponse::Ack);
        Ok(())
    }

    fn send_distribution(&mut self, distribution: &[f64]) -> Result<(), TransportError> {
        self.responses
            .push(RecordedResponse::Distribution(distribution.to_vec()));
        Ok(())
    }

    fn send_failure(&mut self, error: &ProtocolError) -> Result<(), TransportError> {
        self.responses
            .push(RecordedResponse::Failure(error.to_string()));
        Ok(())
    }
}
