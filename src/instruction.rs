//! Decoding of 16-bit opcodes into [`Instruction`]s.
//!
//! Operand fields are named after their position in the opcode:
//!
//! ```text
//! F X Y N
//!     N N
//!   N N N
//! ```
use std::fmt;

/// One decoded CHIP-8 instruction. Register operands are indices into
/// `V0..=VF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    ClearScreen,
    /// `00EE`
    Return,
    /// `1NNN`
    Jump(u16),
    /// `2NNN`
    Call(u16),
    /// `3XNN`
    SkipIfEqualImm { x: usize, nn: u8 },
    /// `4XNN`
    SkipIfNotEqualImm { x: usize, nn: u8 },
    /// `5XY0`
    SkipIfEqual { x: usize, y: usize },
    /// `6XNN`
    LoadImm { x: usize, nn: u8 },
    /// `7XNN`, no carry flag.
    AddImm { x: usize, nn: u8 },
    /// `8XY0`
    Copy { x: usize, y: usize },
    /// `8XY1`
    Or { x: usize, y: usize },
    /// `8XY2`
    And { x: usize, y: usize },
    /// `8XY3`
    Xor { x: usize, y: usize },
    /// `8XY4`
    Add { x: usize, y: usize },
    /// `8XY5`, `VX = VX - VY`
    Sub { x: usize, y: usize },
    /// `8XY6`
    ShiftRight { x: usize, y: usize },
    /// `8XY7`, `VX = VY - VX`
    SubReverse { x: usize, y: usize },
    /// `8XYE`
    ShiftLeft { x: usize, y: usize },
    /// `9XY0`
    SkipIfNotEqual { x: usize, y: usize },
    /// `ANNN`
    LoadIndex(u16),
    /// `BNNN`, jump to `NNN + V0`
    JumpOffset(u16),
    /// `CXNN`
    Random { x: usize, nn: u8 },
    /// `DXYN`
    Draw { x: usize, y: usize, n: u8 },
    /// `EX9E`
    SkipIfKeyPressed { x: usize },
    /// `EXA1`
    SkipIfKeyNotPressed { x: usize },
    /// `FX07`
    LoadDelay { x: usize },
    /// `FX0A`
    WaitKey { x: usize },
    /// `FX15`
    SetDelay { x: usize },
    /// `FX18`
    SetSound { x: usize },
    /// `FX1E`
    AddIndex { x: usize },
    /// `FX29`
    LoadGlyph { x: usize },
    /// `FX33`
    StoreBcd { x: usize },
    /// `FX55`
    StoreRegisters { x: usize },
    /// `FX65`
    LoadRegisters { x: usize },
    /// Anything this interpreter does not implement, including `0NNN`.
    Unknown(u16),
}

impl Instruction {
    pub fn decode(opcode: u16) -> Self {
        use Instruction::*;

        let family = (opcode >> 12) as u8;
        let x = ((opcode & 0x0F00) >> 8) as usize;
        let y = ((opcode & 0x00F0) >> 4) as usize;
        let n = (opcode & 0x000F) as u8;
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        match (family, n, nn) {
            (0x0, _, _) if opcode == 0x00E0 => ClearScreen,
            (0x0, _, _) if opcode == 0x00EE => Return,
            (0x1, _, _) => Jump(nnn),
            (0x2, _, _) => Call(nnn),
            (0x3, _, _) => SkipIfEqualImm { x, nn },
            (0x4, _, _) => SkipIfNotEqualImm { x, nn },
            (0x5, 0x0, _) => SkipIfEqual { x, y },
            (0x6, _, _) => LoadImm { x, nn },
            (0x7, _, _) => AddImm { x, nn },
            (0x8, 0x0, _) => Copy { x, y },
            (0x8, 0x1, _) => Or { x, y },
            (0x8, 0x2, _) => And { x, y },
            (0x8, 0x3, _) => Xor { x, y },
            (0x8, 0x4, _) => Add { x, y },
            (0x8, 0x5, _) => Sub { x, y },
            (0x8, 0x6, _) => ShiftRight { x, y },
            (0x8, 0x7, _) => SubReverse { x, y },
            (0x8, 0xE, _) => ShiftLeft { x, y },
            (0x9, 0x0, _) => SkipIfNotEqual { x, y },
            (0xA, _, _) => LoadIndex(nnn),
            (0xB, _, _) => JumpOffset(nnn),
            (0xC, _, _) => Random { x, nn },
            (0xD, _, _) => Draw { x, y, n },
            (0xE, _, 0x9E) => SkipIfKeyPressed { x },
            (0xE, _, 0xA1) => SkipIfKeyNotPressed { x },
            (0xF, _, 0x07) => LoadDelay { x },
            (0xF, _, 0x0A) => WaitKey { x },
            (0xF, _, 0x15) => SetDelay { x },
            (0xF, _, 0x18) => SetSound { x },
            (0xF, _, 0x1E) => AddIndex { x },
            (0xF, _, 0x29) => LoadGlyph { x },
            (0xF, _, 0x33) => StoreBcd { x },
            (0xF, _, 0x55) => StoreRegisters { x },
            (0xF, _, 0x65) => LoadRegisters { x },
            _ => Unknown(opcode),
        }
    }
}

impl fmt::Display for Instruction {
    /// Disassembly in the conventional mnemonic syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(nnn) => write!(f, "JP {nnn:#05X}"),
            Call(nnn) => write!(f, "CALL {nnn:#05X}"),
            SkipIfEqualImm { x, nn } => write!(f, "SE V{x:X}, {nn:#04X}"),
            SkipIfNotEqualImm { x, nn } => write!(f, "SNE V{x:X}, {nn:#04X}"),
            SkipIfEqual { x, y } => write!(f, "SE V{x:X}, V{y:X}"),
            LoadImm { x, nn } => write!(f, "LD V{x:X}, {nn:#04X}"),
            AddImm { x, nn } => write!(f, "ADD V{x:X}, {nn:#04X}"),
            Copy { x, y } => write!(f, "LD V{x:X}, V{y:X}"),
            Or { x, y } => write!(f, "OR V{x:X}, V{y:X}"),
            And { x, y } => write!(f, "AND V{x:X}, V{y:X}"),
            Xor { x, y } => write!(f, "XOR V{x:X}, V{y:X}"),
            Add { x, y } => write!(f, "ADD V{x:X}, V{y:X}"),
            Sub { x, y } => write!(f, "SUB V{x:X}, V{y:X}"),
            ShiftRight { x, y } => write!(f, "SHR V{x:X}, V{y:X}"),
            SubReverse { x, y } => write!(f, "SUBN V{x:X}, V{y:X}"),
            ShiftLeft { x, y } => write!(f, "SHL V{x:X}, V{y:X}"),
            SkipIfNotEqual { x, y } => write!(f, "SNE V{x:X}, V{y:X}"),
            LoadIndex(nnn) => write!(f, "LD I, {nnn:#05X}"),
            JumpOffset(nnn) => write!(f, "JP V0, {nnn:#05X}"),
            Random { x, nn } => write!(f, "RND V{x:X}, {nn:#04X}"),
            Draw { x, y, n } => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            SkipIfKeyPressed { x } => write!(f, "SKP V{x:X}"),
            SkipIfKeyNotPressed { x } => write!(f, "SKNP V{x:X}"),
            LoadDelay { x } => write!(f, "LD V{x:X}, DT"),
            WaitKey { x } => write!(f, "LD V{x:X}, K"),
            SetDelay { x } => write!(f, "LD DT, V{x:X}"),
            SetSound { x } => write!(f, "LD ST, V{x:X}"),
            AddIndex { x } => write!(f, "ADD I, V{x:X}"),
            LoadGlyph { x } => write!(f, "LD F, V{x:X}"),
            StoreBcd { x } => write!(f, "LD B, V{x:X}"),
            StoreRegisters { x } => write!(f, "LD [I], V{x:X}"),
            LoadRegisters { x } => write!(f, "LD V{x:X}, [I]"),
            Unknown(opcode) => write!(f, "DW {opcode:#06X}"),
        }
    }
}
