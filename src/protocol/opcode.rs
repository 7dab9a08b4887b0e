use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Single-byte command discriminators written by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Opcode {
    Train,
    Clear,
    Classify,
    Append,
    Print,
    WriteText,
    Save,
    Load,
    Reweight,
    Exit,
}

impl Opcode {
    pub const fn as_byte(self) -> u8 {
        match self {
            Opcode::Train => b't',
            Opcode::Clear => b'x',
            Opcode::Classify => b'c',
            Opcode::Append => b'a',
            Opcode::Print => b'p',
            Opcode::WriteText => b'w',
            Opcode::Save => b's',
            Opcode::Load => b'l',
            Opcode::Reweight => b'r',
            Opcode::Exit => b'e',
        }
    }

    pub const fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            b't' => Some(Opcode::Train),
            b'x' => Some(Opcode::Clear),
            b'c' => Some(Opcode::Classify),
            b'a' => Some(Opcode::Append),
            b'p' => Some(Opcode::Print),
            b'w' => Some(Opcode::WriteText),
            b's' => Some(Opcode::Save),
            b'l' => Some(Opcode::Load),
            b'r' => Some(Opcode::Reweight),
            b'e' => Some(Opcode::Exit),
            _ => None,
        }
    }

    /// Commands followed by a path message.
    pub const fn carries_path(self) -> bool {
        matches!(self, Opcode::WriteText | Opcode::Save | Opcode::Load)
    }
}
