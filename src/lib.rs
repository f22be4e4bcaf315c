//! A CHIP-8 virtual machine.
//!
//! [`Chip8`] owns the whole machine: memory, registers, timers, framebuffer
//! and keypad. A host feeds it key transitions, calls [`Chip8::step`] at its
//! chosen rate and reads the framebuffer back when it has changed. The
//! [`emulator`] module has a ready made host loop.

#[cfg(test)]
#[macro_use]
mod test_utils;

// Modules
pub mod config;
pub mod display;
pub mod emulator;
mod error;
pub mod instruction;
mod interpreter;
pub mod keypad;
pub mod memory;
pub mod peripherals;
pub mod registers;
pub mod rng;
pub mod rom;
pub mod timers;

// Reexports
pub use config::{CompatibilityMode, Config};
pub use error::{Error, Fault};
pub use interpreter::{Chip8, EngineState, PROGRAM_COUNTER_LAST_ADDRESS};

// Private helpers
type Result<T> = std::result::Result<T, Error>;
