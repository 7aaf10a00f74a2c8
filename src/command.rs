pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM-level commands understood by every device on the bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Followed by a 64-bit ROM code, selects exactly one device
    MatchRom = 0x55,
    /// Selects every device on the bus
    SkipRom = 0xCC,
    /// Only valid with a single device on the bus
    ReadRom = 0x33,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}
