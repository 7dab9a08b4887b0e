use crate::dispatcher::FatalError;
use crate::protocol::codec::{decode_batch, decode_row};
use crate::protocol::{CommandMessage, Opcode, ProtocolError};
use crate::session::{PersistenceError, Session};
use crate::transport::{Transport, TransportError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    AwaitingCommand,
    Terminated,
}

enum Reply {
    Ack,
    Distribution(Vec<f64>),
    Failure(ProtocolError),
    Silent,
}

/// Serves commands from `T` against one session until exit. `print` output
/// goes to `W`.
pub struct Dispatcher<T: Transport, W: Write> {
    session: Session,
    transport: T,
    diagnostics: W,
    state: DispatcherState,
}

impl<T: Transport, W: Write> Dispatcher<T, W> {
    pub fn new(session: Session, transport: T, diagnostics: W) -> Self {
        Self {
            session,
            transport,
            diagnostics,
            state: DispatcherState::AwaitingCommand,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (Session, T, W) {
        (self.session, self.transport, self.diagnostics)
    }

    /// Serves until exit or the first fatal error.
    pub fn run(&mut self) -> Result<(), FatalError> {
        info!(
            "Serving {} with {} seed instances ({})",
            self.session.classifier().name(),
            self.session.dataset().len(),
            self.session.schema()
        );
        while self.state == DispatcherState::AwaitingCommand {
            self.step()?;
        }
        info!("Session terminated");
        Ok(())
    }

    /// Receives, handles and answers exactly one command.
    pub fn step(&mut self) -> Result<DispatcherState, FatalError> {
        let command = match self.transport.receive_command() {
            Ok(command) => command,
            Err(e) => {
                let Some(protocol) = e.as_protocol_error() else {
                    return Err(e.into());
                };
                self.respond(Reply::Failure(protocol))?;
                return Ok(self.state);
            }
        };

        let reply = match command.decoded_opcode() {
            Some(opcode) => self.handle(opcode, command)?,
            None => {
                debug!("Ignoring unknown opcode {:#04x}", command.opcode);
                Reply::Ack
            }
        };
        self.respond(reply)?;
        Ok(self.state)
    }

    fn respond(&mut self, reply: Reply) -> Result<(), TransportError> {
        match reply {
            Reply::Ack => self.transport.send_ack(),
            Reply::Distribution(d) => self.transport.send_distribution(&d),
            Reply::Failure(e) => {
                warn!("Rejected request: {e}");
                self.transport.send_failure(&e)
            }
            Reply::Silent => Ok(()),
        }
    }

    fn handle(&mut self, opcode: Opcode, command: CommandMessage) -> Result<Reply, FatalError> {
        let schema = self.session.schema();
        let classifier_failed = |source| FatalError::Classifier { opcode, source };

        let reply = match opcode {
            Opcode::Train => {
                self.session.train().map_err(classifier_failed)?;
                Reply::Ack
            }
            Opcode::Clear => {
                self.session.clear();
                Reply::Ack
            }
            Opcode::Classify => {
                if command.count != 1 {
                    return Ok(Reply::Failure(ProtocolError::ClassifyCount(command.count)));
                }
                let (Some(row), Some(&weight)) =
                    (command.feature_rows.first(), command.weights.first())
                else {
                    return Ok(Reply::Failure(ProtocolError::MissingRows {
                        count: 1,
                        rows: command.feature_rows.len(),
                        weights: command.weights.len(),
                    }));
                };
                match decode_row(&schema, row, weight) {
                    Ok(instance) => Reply::Distribution(
                        self.session.classify(instance).map_err(classifier_failed)?,
                    ),
                    Err(e) => Reply::Failure(e),
                }
            }
            Opcode::Append => {
                if command.count == 0 {
                    return Ok(Reply::Failure(ProtocolError::EmptyBatch("append")));
                }
                match decode_batch(
                    &schema,
                    &command.feature_rows,
                    &command.weights,
                    command.count,
                ) {
                    Ok(instances) => {
                        self.session.append(instances);
                        Reply::Ack
                    }
                    Err(e) => Reply::Failure(e),
                }
            }
            Opcode::Reweight => {
                let count = command.count;
                if count == 0 {
                    return Ok(Reply::Failure(ProtocolError::EmptyBatch("reweight")));
                }
                if command.weights.len() < count {
                    return Ok(Reply::Failure(ProtocolError::MissingRows {
                        count,
                        rows: command.feature_rows.len(),
                        weights: command.weights.len(),
                    }));
                }
                match self.session.reweight(&command.weights[..count]) {
                    Ok(()) => Reply::Ack,
                    Err(e) => Reply::Failure(e),
                }
            }
            Opcode::Print => {
                let mut description = self.session.describe();
                if !description.ends_with('\n') {
                    description.push('\n');
                }
                if let Err(e) = self
                    .diagnostics
                    .write_all(description.as_bytes())
                    .and_then(|()| self.diagnostics.flush())
                {
                    error!("Could not print classifier description: {e}");
                }
                Reply::Ack
            }
            Opcode::WriteText | Opcode::Save | Opcode::Load => {
                let path = match self.transport.receive_path_message() {
                    Ok(path) => path,
                    Err(e) => {
                        return match e.as_protocol_error() {
                            Some(protocol) => Ok(Reply::Failure(protocol)),
                            None => Err(e.into()),
                        };
                    }
                };
                let path = Path::new(&path);
                let result = match opcode {
                    Opcode::WriteText => self.session.write_description(path),
                    Opcode::Save => self.session.save(path),
                    _ => self.session.load(path),
                };
                if let Err(e) = result {
                    report_persistence_failure(opcode, path, &e);
                }
                Reply::Ack
            }
            Opcode::Exit => {
                info!("Exit requested");
                self.state = DispatcherState::Terminated;
                Reply::Silent
            }
        };
        Ok(reply)
    }
}

fn report_persistence_failure(opcode: Opcode, path: &Path, e: &PersistenceError) {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    error!("'{opcode}' on {} failed: {message}", path.display());
}
