//! Roms hold CHIP-8 program data.
use std::fmt::Debug;

use crate::memory::{MEMORY_SIZE, PROGRAM_START_ADDRESS};
use crate::{Error, Result};

/// Everything from the program start address to the top of memory is
/// available to the program.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START_ADDRESS;

/// A validated program image, ready to be copied into a machine.
pub struct Rom {
    name: String,
    data: Vec<u8>,
}

impl Rom {
    /// Create a `Rom` from copied bytes.
    ///
    /// # Errors
    /// Can return [`Error::EmptyRom`] or [`Error::RomTooLarge`].
    pub fn from_bytes(name: &str, rom_bytes: &[u8]) -> Result<Self> {
        if rom_bytes.is_empty() {
            return Err(Error::EmptyRom);
        } else if rom_bytes.len() > MAX_ROM_SIZE {
            return Err(Error::RomTooLarge(rom_bytes.len()));
        }

        Ok(Rom {
            name: name.to_string(),
            data: rom_bytes.to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for Rom {
    /// Returns the rom name, its size and up to the first 10 bytes of the rom.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.bytes();
        write!(
            f,
            "{} ({} bytes): {:02X?}",
            self.name,
            bytes.len(),
            &bytes[..10.min(bytes.len())]
        )
    }
}
