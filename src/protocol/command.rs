use crate::protocol::Opcode;

/// One request as read from the transport. Built fresh per read and consumed
/// by the handler; rows beyond `count` are never materialised.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandMessage {
    pub opcode: u8,
    pub feature_rows: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
    pub count: usize,
}

impl CommandMessage {
    /// A command with no payload rows.
    pub fn bare(opcode: u8) -> Self {
        Self {
            opcode,
            ..Self::default()
        }
    }

    pub fn with_rows(opcode: u8, feature_rows: Vec<Vec<f64>>, weights: Vec<f64>) -> Self {
        let count = feature_rows.len();
        Self {
            opcode,
            feature_rows,
            weights,
            count,
        }
    }

    pub fn decoded_opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode)
    }
}
