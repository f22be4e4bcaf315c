//! The CHIP-8 address space is 4096 bytes. Only the program area and the
//! font glyphs are meaningful to this interpreter; the rest of the reserved
//! block is left zeroed.
//!
//! # Memory map
//! ```text
//! +-----------------------------------------+ 0x000
//! | Font glyphs, 16 x 5 bytes               |
//! +-----------------------------------------+ 0x050
//! | Reserved for the interpreter (unused)   |
//! +-----------------------------------------+ 0x200
//! | User program/rom (3584 bytes)           |
//! +-----------------------------------------+ 0x1000
//! ```
//!
//! Registers, the call stack and the display live outside of this image, so a
//! program writing through `I` can never clobber interpreter state. Every
//! access is bounds-checked and reports a [`Fault`] instead of wrapping.

use crate::rom::Rom;
use crate::{Error, Fault, Result};

pub const MEMORY_SIZE: usize = 0x1000;
pub const MEMORY_START_ADDRESS: usize = 0x000;
pub const MEMORY_LAST_ADDRESS: usize = MEMORY_SIZE - 1;
pub const FONT_START_ADDRESS: usize = 0x000;
pub const PROGRAM_START_ADDRESS: usize = 0x200;

/// Each glyph is 4 pixels wide (high nibble of each byte) and 5 rows tall.
pub const GLYPH_HEIGHT: usize = 5;

#[rustfmt::skip]
pub const FONT: [u8; 16 * GLYPH_HEIGHT] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Main memory used by the CHIP-8 interpreter.
pub struct Ram {
    data: [u8; MEMORY_SIZE],
}

impl Ram {
    /// Create 4K of RAM, zero-initialized apart from the font glyphs.
    pub fn new() -> Self {
        let mut data = [0; MEMORY_SIZE];
        data[FONT_START_ADDRESS..][..FONT.len()].copy_from_slice(&FONT);
        Self { data }
    }

    /// A read-only view of the data in RAM.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Loads a sequence of bytes into memory starting at the address given by
    /// `ram_offset`.
    ///
    /// # Example
    /// ```
    /// # use chip8_vm::memory::Ram;
    /// let bytes = [0x11, 0x22, 0x33, 0x44];
    /// let mut ram = Ram::new();
    /// assert!(ram.load_bytes(&bytes, 0x0300).is_ok());
    /// assert!(ram.load_bytes(&bytes, 0x0FFE).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns [`Error::RamOverflow`] if bytes cannot fit into RAM at the given offset.
    /// When this occurs no change is made to the RAM.
    pub fn load_bytes(&mut self, bytes: &[u8], ram_offset: usize) -> Result<()> {
        if ram_offset + bytes.len() > MEMORY_SIZE {
            return Err(Error::RamOverflow);
        }
        self.data[ram_offset..][..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy a rom into the program area.
    ///
    /// # Errors
    /// A [`Rom`] is already size checked, so this only fails with
    /// [`Error::RamOverflow`] if that check was bypassed.
    pub fn load_rom(&mut self, rom: &Rom) -> Result<()> {
        self.load_bytes(rom.bytes(), PROGRAM_START_ADDRESS)
    }

    /// Address of the glyph for the low nibble of `digit`.
    pub fn glyph_address(digit: u8) -> u16 {
        (FONT_START_ADDRESS + (digit & 0x0F) as usize * GLYPH_HEIGHT) as u16
    }

    /// Borrow `len` bytes starting at `address`, failing if any of them lie
    /// past the end of memory.
    pub(crate) fn slice(&self, address: usize, len: usize) -> std::result::Result<&[u8], Fault> {
        check_range(address, len)?;
        Ok(&self.data[address..][..len])
    }

    pub(crate) fn slice_mut(
        &mut self,
        address: usize,
        len: usize,
    ) -> std::result::Result<&mut [u8], Fault> {
        check_range(address, len)?;
        Ok(&mut self.data[address..][..len])
    }

    /// Grab a u16 from two sequential bytes in RAM, which is big endian.
    /// Does not check alignment of address.
    pub(crate) fn get_u16_at(&self, address: usize) -> std::result::Result<u16, Fault> {
        let bytes = self.slice(address, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

fn check_range(address: usize, len: usize) -> std::result::Result<(), Fault> {
    match address.checked_add(len) {
        Some(end) if end <= MEMORY_SIZE => Ok(()),
        // Report the first byte that falls outside of memory.
        _ => Err(Fault::MemoryOutOfBounds {
            address: address.max(MEMORY_SIZE),
        }),
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}
