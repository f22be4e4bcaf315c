//! CHIP-8 register file and subroutine stack.
use crate::memory::PROGRAM_START_ADDRESS;
use crate::Fault;

pub const NUM_V_REGISTERS: usize = 16;
/// Index of `VF`, the carry/borrow/collision flag.
pub const VF: usize = 0xF;
/// Maximum subroutine nesting depth.
pub const STACK_CAPACITY: usize = 16;

/// Bounded stack of subroutine return addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    frames: [u16; STACK_CAPACITY],
    sp: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self {
            frames: [0; STACK_CAPACITY],
            sp: 0,
        }
    }

    /// # Errors
    /// [`Fault::StackOverflow`] when already holding `STACK_CAPACITY` frames.
    pub fn push(&mut self, return_address: u16) -> Result<(), Fault> {
        let slot = self.frames.get_mut(self.sp).ok_or(Fault::StackOverflow)?;
        *slot = return_address;
        self.sp += 1;
        Ok(())
    }

    /// # Errors
    /// [`Fault::StackUnderflow`] when not inside a subroutine.
    pub fn pop(&mut self) -> Result<u16, Fault> {
        self.sp = self.sp.checked_sub(1).ok_or(Fault::StackUnderflow)?;
        Ok(self.frames[self.sp])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; NUM_V_REGISTERS],
    /// Only the low 12 bits address memory. Values above `0xFFF` fault on use.
    pub i: u16,
    pub pc: u16,
    pub stack: CallStack,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; NUM_V_REGISTERS],
            i: 0,
            pc: PROGRAM_START_ADDRESS as u16,
            stack: CallStack::new(),
        }
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF] = flag as u8;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
