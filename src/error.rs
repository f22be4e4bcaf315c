use std::fmt;

/// Errors raised while preparing a machine, before any instruction runs.
#[derive(Debug, PartialEq)]
pub enum Error {
    EmptyRom,
    RomTooLarge(usize),
    RamOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyRom => write!(f, "Rom is empty!"),
            Error::RomTooLarge(size) => write!(f, "Rom with size {} bytes is too large!", size),
            Error::RamOverflow => write!(f, "Write extends beyond the end of RAM!"),
        }
    }
}

impl std::error::Error for Error {}

/// Fatal conditions hit while executing. Once raised the machine stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    ProgramCounterOutOfRange(u16),
    MemoryOutOfBounds { address: usize },
    StackOverflow,
    StackUnderflow,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::ProgramCounterOutOfRange(pc) => {
                write!(f, "Program counter {pc:#06X} is outside of addressable memory")
            }
            Fault::MemoryOutOfBounds { address } => {
                write!(f, "Memory access at {address:#06X} is out of bounds")
            }
            Fault::StackOverflow => write!(f, "CHIP-8 stack overflow!"),
            Fault::StackUnderflow => {
                write!(f, "Cannot return when not in a subroutine. Stack is empty!")
            }
        }
    }
}

impl std::error::Error for Fault {}
