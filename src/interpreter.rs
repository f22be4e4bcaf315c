//! The CHIP-8 fetch-decode-execute engine.
use log::{debug, error, trace, warn};

use crate::{
    config::CompatibilityMode,
    display::{Framebuffer, DISPLAY_PIXELS},
    instruction::Instruction,
    keypad::{KeyPress, Keypad},
    memory::{Ram, MEMORY_LAST_ADDRESS},
    registers::Registers,
    rng::Chip8Rng,
    rom::Rom,
    timers::{Instant, Timers},
    Fault, Result,
};

/// Highest address an instruction can be fetched from, since opcodes are two
/// bytes long.
pub const PROGRAM_COUNTER_LAST_ADDRESS: usize = MEMORY_LAST_ADDRESS - 1;

/// Observable state of the engine after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    /// Stalled on `FX0A` until [`Chip8::set_key`] delivers a key press.
    AwaitingKey,
    /// Terminal. No further instructions will execute.
    Faulted(Fault),
}

/// Where the program counter goes once an instruction has executed.
enum Flow {
    Next,
    Skip,
    Jump(u16),
    /// Re-execute the current instruction on the next step.
    Stay,
}

impl Flow {
    fn skip_if(condition: bool) -> Self {
        if condition {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

/// A complete CHIP-8 machine. All state is owned by the instance, so any
/// number of machines can run side by side.
pub struct Chip8<R: Chip8Rng = fastrand::Rng> {
    ram: Ram,
    registers: Registers,
    timers: Timers,
    framebuffer: Framebuffer,
    keypad: Keypad,
    compatibility: CompatibilityMode,
    rng: R,
    fault: Option<Fault>,
    tone_stopped: bool,
}

impl Chip8 {
    /// Create a machine with `rom` loaded at the program start address and a
    /// freshly seeded random number generator.
    ///
    /// # Example
    /// ```
    /// # use chip8_vm::{Chip8, CompatibilityMode, EngineState, rom::Rom};
    /// // V0 = 0x2A, then loop forever.
    /// let rom = Rom::from_bytes("example", &[0x60, 0x2A, 0x12, 0x02]).unwrap();
    /// let mut chip8 = Chip8::new(&rom, CompatibilityMode::Modern).unwrap();
    /// assert_eq!(chip8.step(), EngineState::Running);
    /// assert_eq!(chip8.registers().v[0], 0x2A);
    /// ```
    ///
    /// # Errors
    /// Returns [`crate::Error::RamOverflow`] if the rom does not fit.
    pub fn new(rom: &Rom, compatibility: CompatibilityMode) -> Result<Self> {
        Self::with_rng(rom, compatibility, fastrand::Rng::new())
    }
}

impl<R: Chip8Rng> Chip8<R> {
    /// Create a machine with a caller supplied random number generator.
    ///
    /// # Errors
    /// Returns [`crate::Error::RamOverflow`] if the rom does not fit.
    pub fn with_rng(rom: &Rom, compatibility: CompatibilityMode, rng: R) -> Result<Self> {
        let mut ram = Ram::new();
        ram.load_rom(rom)?;

        Ok(Self {
            ram,
            registers: Registers::new(),
            timers: Timers::new(Instant::now()),
            framebuffer: Framebuffer::new(),
            keypad: Keypad::new(),
            compatibility,
            rng,
            fault: None,
            tone_stopped: false,
        })
    }

    /// Tick the timers, then execute the instruction at the program counter.
    ///
    /// While awaiting a key the `FX0A` instruction is simply re-entered, so
    /// the program counter does not move. Once faulted, this does nothing.
    pub fn step(&mut self) -> EngineState {
        if self.fault.is_some() {
            return self.state();
        }

        let now = Instant::now();
        self.tick(now);

        if let Err(fault) = self.execute_next(now) {
            error!("CHIP-8 machine faulted: {fault}");
            self.fault = Some(fault);
        }
        self.state()
    }

    /// Advance the delay and sound timers to `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.timers.tick(now) {
            self.tone_stopped = true;
        }
    }

    /// Feed a key transition from the host. A press while awaiting a key
    /// stores the key in the waiting register and releases the engine.
    pub fn set_key(&mut self, index: usize, pressed: bool) {
        if let Some(KeyPress { register, key }) = self.keypad.set_key(index, pressed) {
            debug!("Key {key:X} pressed, resuming with V{register:X} = {key:#X}");
            self.registers.v[register] = key;
        }
    }

    pub fn state(&self) -> EngineState {
        match self.fault {
            Some(fault) => EngineState::Faulted(fault),
            None if self.keypad.is_waiting() => EngineState::AwaitingKey,
            None => EngineState::Running,
        }
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// The screen contents if they changed since the last call.
    pub fn take_frame(&mut self) -> Option<&[bool; DISPLAY_PIXELS]> {
        self.framebuffer.take_damaged()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn compatibility(&self) -> CompatibilityMode {
        self.compatibility
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay.get()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound.get()
    }

    pub fn is_tone_sounding(&self) -> bool {
        self.timers.is_tone_sounding()
    }

    /// `true` once after the sound timer has counted down to zero.
    pub fn take_tone_stopped(&mut self) -> bool {
        std::mem::take(&mut self.tone_stopped)
    }

    fn execute_next(&mut self, now: Instant) -> std::result::Result<(), Fault> {
        let pc = self.registers.pc;
        // Only the range is checked. Jumps to odd addresses are legal on the
        // original hardware and some roms rely on unaligned fetches.
        if pc as usize > PROGRAM_COUNTER_LAST_ADDRESS {
            return Err(Fault::ProgramCounterOutOfRange(pc));
        }

        let opcode = self.ram.get_u16_at(pc as usize)?;
        let instruction = Instruction::decode(opcode);
        trace!("{pc:#05X}: {opcode:04X}  {instruction}");

        self.registers.pc = match self.execute(instruction, now)? {
            Flow::Next => pc + 2,
            Flow::Skip => pc + 4,
            Flow::Jump(address) => address,
            Flow::Stay => pc,
        };
        Ok(())
    }

    fn execute(
        &mut self,
        instruction: Instruction,
        now: Instant,
    ) -> std::result::Result<Flow, Fault> {
        use Instruction::*;

        let regs = &mut self.registers;
        let v = &mut regs.v;

        let flow = match instruction {
            ClearScreen => {
                self.framebuffer.clear();
                Flow::Next
            }
            Return => Flow::Jump(regs.stack.pop()?),
            Jump(nnn) => Flow::Jump(nnn),
            Call(nnn) => {
                regs.stack.push(regs.pc + 2)?;
                Flow::Jump(nnn)
            }
            SkipIfEqualImm { x, nn } => Flow::skip_if(v[x] == nn),
            SkipIfNotEqualImm { x, nn } => Flow::skip_if(v[x] != nn),
            SkipIfEqual { x, y } => Flow::skip_if(v[x] == v[y]),
            SkipIfNotEqual { x, y } => Flow::skip_if(v[x] != v[y]),
            LoadImm { x, nn } => {
                v[x] = nn;
                Flow::Next
            }
            AddImm { x, nn } => {
                v[x] = v[x].wrapping_add(nn);
                Flow::Next
            }
            Copy { x, y } => {
                v[x] = v[y];
                Flow::Next
            }
            Or { x, y } => {
                v[x] |= v[y];
                Flow::Next
            }
            And { x, y } => {
                v[x] &= v[y];
                Flow::Next
            }
            Xor { x, y } => {
                v[x] ^= v[y];
                Flow::Next
            }
            // The flag is always written last so it wins when X is F.
            Add { x, y } => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                regs.set_flag(carry);
                Flow::Next
            }
            Sub { x, y } => {
                let no_borrow = v[x] >= v[y];
                v[x] = v[x].wrapping_sub(v[y]);
                regs.set_flag(no_borrow);
                Flow::Next
            }
            SubReverse { x, y } => {
                let no_borrow = v[y] >= v[x];
                v[x] = v[y].wrapping_sub(v[x]);
                regs.set_flag(no_borrow);
                Flow::Next
            }
            ShiftRight { x, y } => {
                let source = self.shift_source(x, y);
                let v = &mut self.registers.v;
                let shifted_out = v[source] & 0x01;
                v[source] >>= 1;
                v[x] = v[source];
                self.registers.set_flag(shifted_out != 0);
                Flow::Next
            }
            ShiftLeft { x, y } => {
                let source = self.shift_source(x, y);
                let v = &mut self.registers.v;
                let shifted_out = v[source] & 0x80;
                v[source] <<= 1;
                v[x] = v[source];
                self.registers.set_flag(shifted_out != 0);
                Flow::Next
            }
            LoadIndex(nnn) => {
                regs.i = nnn;
                Flow::Next
            }
            JumpOffset(nnn) => Flow::Jump(nnn + v[0] as u16),
            Random { x, nn } => {
                v[x] = self.rng.random_u8() & nn;
                Flow::Next
            }
            Draw { x, y, n } => {
                let rows = self.ram.slice(regs.i as usize, n as usize)?;
                let collision = self
                    .framebuffer
                    .draw_sprite(v[x] as usize, v[y] as usize, rows);
                regs.set_flag(collision);
                Flow::Next
            }
            SkipIfKeyPressed { x } => Flow::skip_if(self.keypad.is_pressed(v[x] & 0x0F)),
            SkipIfKeyNotPressed { x } => Flow::skip_if(!self.keypad.is_pressed(v[x] & 0x0F)),
            LoadDelay { x } => {
                v[x] = self.timers.delay.get();
                Flow::Next
            }
            WaitKey { x } => {
                if self.keypad.take_key_press().is_some() {
                    Flow::Next
                } else {
                    if !self.keypad.is_waiting() {
                        debug!("Waiting for a key press into V{x:X}");
                        self.keypad.begin_wait(x);
                    }
                    Flow::Stay
                }
            }
            SetDelay { x } => {
                self.timers.delay.set(v[x], now);
                Flow::Next
            }
            SetSound { x } => {
                self.timers.sound.set(v[x], now);
                Flow::Next
            }
            AddIndex { x } => {
                let sum = regs.i + v[x] as u16;
                regs.i = sum & 0x0FFF;
                regs.set_flag(sum > 0x0FFF);
                Flow::Next
            }
            LoadGlyph { x } => {
                regs.i = Ram::glyph_address(v[x]);
                Flow::Next
            }
            StoreBcd { x } => {
                let value = v[x];
                let digits = [value / 100, value / 10 % 10, value % 10];
                self.ram
                    .slice_mut(regs.i as usize, digits.len())?
                    .copy_from_slice(&digits);
                Flow::Next
            }
            StoreRegisters { x } => {
                self.ram
                    .slice_mut(regs.i as usize, x + 1)?
                    .copy_from_slice(&v[..=x]);
                regs.i += x as u16 + 1;
                Flow::Next
            }
            LoadRegisters { x } => {
                v[..=x].copy_from_slice(self.ram.slice(regs.i as usize, x + 1)?);
                regs.i += x as u16 + 1;
                Flow::Next
            }
            Unknown(opcode) => {
                warn!("Unknown opcode {opcode:#06X} at {:#05X}, skipping", regs.pc);
                Flow::Next
            }
        };
        Ok(flow)
    }

    /// Register the shift instructions read from.
    fn shift_source(&self, x: usize, y: usize) -> usize {
        match self.compatibility {
            CompatibilityMode::Modern => x,
            CompatibilityMode::Legacy => y,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mock_instant::MockClock;

    use super::{Chip8, EngineState};
    use crate::{
        config::CompatibilityMode,
        display::DISPLAY_WIDTH_PIXELS,
        registers::{STACK_CAPACITY, VF},
        rng::MockChip8Rng,
        rom::{Rom, MAX_ROM_SIZE},
        timers::DECREMENT_PERIOD,
        Fault,
    };

    fn machine_in_mode(program: &[u8], mode: CompatibilityMode) -> Chip8<MockChip8Rng> {
        let rom = Rom::from_bytes("test", program).expect("Test program should be a valid rom");
        Chip8::with_rng(&rom, mode, MockChip8Rng::new()).expect("Test program should load")
    }

    fn machine(program: &[u8]) -> Chip8<MockChip8Rng> {
        machine_in_mode(program, CompatibilityMode::Modern)
    }

    fn step_n(chip8: &mut Chip8<MockChip8Rng>, steps: usize) -> EngineState {
        for _ in 1..steps {
            chip8.step();
        }
        chip8.step()
    }

    #[test]
    fn unconditional_jump() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x1234));
        assert_eq!(chip8.registers().pc, 0x0200);
        chip8.step();
        assert_eq!(chip8.registers().pc, 0x0234);
    }

    #[test]
    fn add_wraps_and_sets_carry() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x8014));
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                chip8.registers.pc = 0x200;
                chip8.registers.v[0] = a;
                chip8.registers.v[1] = b;
                chip8.step();
                assert_eq!(chip8.registers.v[0], a.wrapping_add(b));
                assert_eq!(chip8.registers.v[VF], (a as u16 + b as u16 > 255) as u8);
            }
        }
    }

    #[test]
    fn sub_wraps_and_sets_no_borrow() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x8015));
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                chip8.registers.pc = 0x200;
                chip8.registers.v[0] = a;
                chip8.registers.v[1] = b;
                chip8.step();
                assert_eq!(chip8.registers.v[0], a.wrapping_sub(b));
                assert_eq!(chip8.registers.v[VF], (a >= b) as u8);
            }
        }
    }

    #[test]
    fn reverse_sub() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x8017));
        for (a, b, result, flag) in [(3, 10, 7, 1), (10, 3, 249, 0), (5, 5, 0, 1)] {
            chip8.registers.pc = 0x200;
            chip8.registers.v[0] = a;
            chip8.registers.v[1] = b;
            chip8.step();
            assert_eq!(chip8.registers.v[0], result);
            assert_eq!(chip8.registers.v[VF], flag);
        }
    }

    #[test]
    fn flag_wins_when_vf_is_the_destination() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6FFF 0x6E01 0x8FE4));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.v[VF], 1);
    }

    #[test]
    fn add_immediate_has_no_carry() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6F07 0x60FF 0x7002));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.v[0], 0x01);
        assert_eq!(chip8.registers.v[VF], 0x07);
    }

    #[test]
    fn bitwise_ops() {
        let mut chip8 = machine(&chip8_program_into_bytes!(
            0x60F0 0x613C 0x8200 0x8211 0x8300 0x8312 0x8400 0x8413
        ));
        step_n(&mut chip8, 8);
        let v = chip8.registers.v;
        assert_eq!(v[2], 0xFC);
        assert_eq!(v[3], 0x30);
        assert_eq!(v[4], 0xCC);
    }

    #[test]
    fn shift_right_modern_shifts_vx_in_place() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x8016));
        chip8.registers.v[0] = 0b0000_0101;
        chip8.registers.v[1] = 0xFF;
        chip8.step();
        assert_eq!(chip8.registers.v[0], 0b0000_0010);
        assert_eq!(chip8.registers.v[VF], 1);
        assert_eq!(chip8.registers.v[1], 0xFF);
    }

    #[test]
    fn shift_right_legacy_shifts_vy_into_vx() {
        let program = chip8_program_into_bytes!(0x8016);
        let mut chip8 = machine_in_mode(&program, CompatibilityMode::Legacy);
        chip8.registers.v[1] = 0b0000_0101;
        chip8.step();
        assert_eq!(chip8.registers.v[0], 0b0000_0010);
        assert_eq!(chip8.registers.v[1], 0b0000_0010);
        assert_eq!(chip8.registers.v[VF], 1);
    }

    #[test]
    fn shift_left_in_both_modes() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x801E));
        chip8.registers.v[0] = 0x81;
        chip8.step();
        assert_eq!(chip8.registers.v[0], 0x02);
        assert_eq!(chip8.registers.v[VF], 1);

        let program = chip8_program_into_bytes!(0x801E);
        let mut chip8 = machine_in_mode(&program, CompatibilityMode::Legacy);
        chip8.registers.v[0] = 0xFF;
        chip8.registers.v[1] = 0x40;
        chip8.step();
        assert_eq!(chip8.registers.v[0], 0x80);
        assert_eq!(chip8.registers.v[1], 0x80);
        assert_eq!(chip8.registers.v[VF], 0);
    }

    #[test]
    fn drawing_twice_restores_the_screen() {
        // I = glyph "0", draw it at (0, 0) twice.
        let mut chip8 = machine(&chip8_program_into_bytes!(0xF029 0xD015 0xD015));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.v[VF], 0);
        assert!(chip8.framebuffer().pixel(0, 0));
        assert!(chip8.framebuffer().pixel(3, 4));
        assert!(chip8.take_frame().is_some());
        assert!(chip8.take_frame().is_none());

        chip8.step();
        assert_eq!(chip8.registers.v[VF], 1, "Erasing lit pixels is a collision");
        assert!(chip8.framebuffer().pixels().iter().all(|&p| !p));
        assert!(chip8.take_frame().is_some());
    }

    #[test]
    fn collision_only_when_sprites_overlap() {
        // Glyph "0" at (0, 0), glyph "1" at (8, 0), then glyph "1" at (0, 0).
        let mut chip8 = machine(&chip8_program_into_bytes!(
            0xF029 0xD015 0x6201 0xF229 0x6108 0xD105 0xD015
        ));
        step_n(&mut chip8, 6);
        assert_eq!(chip8.registers.v[VF], 0);
        chip8.step();
        assert_eq!(chip8.registers.v[VF], 1);
    }

    #[test]
    fn sprite_is_clipped_at_screen_edge() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x603E 0x611E 0xF829 0xD015));
        assert_eq!(step_n(&mut chip8, 4), EngineState::Running);
        let fb = chip8.framebuffer();
        let lit = fb.pixels().iter().filter(|&&p| p).count();
        // Only the top two rows of the two leftmost columns of "0" are on
        // screen: 0b11 from 0xF0 and 0b10 from 0x90.
        assert_eq!(lit, 3);
        assert!(fb.pixel(DISPLAY_WIDTH_PIXELS - 2, 30));
        assert!(fb.pixel(DISPLAY_WIDTH_PIXELS - 1, 30));
        assert!(fb.pixel(DISPLAY_WIDTH_PIXELS - 2, 31));
        assert!(!fb.pixel(0, 30));
        assert!(!fb.pixel(0, 0));
    }

    #[test]
    fn zero_row_sprite_draws_nothing() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6F01 0xF029 0xD010));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.v[VF], 0);
        assert!(chip8.framebuffer().pixels().iter().all(|&p| !p));
    }

    #[test]
    fn sprite_read_past_memory_faults() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xAFFE 0xD015));
        let state = step_n(&mut chip8, 2);
        assert_eq!(
            state,
            EngineState::Faulted(Fault::MemoryOutOfBounds { address: 0x1000 })
        );
    }

    #[test]
    fn clear_screen() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xD015 0x00E0));
        step_n(&mut chip8, 1);
        chip8.take_frame();
        chip8.step();
        assert!(chip8.framebuffer().pixels().iter().all(|&p| !p));
        assert!(chip8.take_frame().is_some());
    }

    #[test]
    fn binary_coded_decimal() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x609D 0xA300 0xF033));
        step_n(&mut chip8, 3);
        assert_eq!(&chip8.ram().bytes()[0x300..0x303], &[1, 5, 7]);
        assert_eq!(chip8.registers.v[0], 157);
        assert_eq!(chip8.registers.i, 0x300);
    }

    #[test]
    fn store_and_load_registers() {
        let mut chip8 = machine(&chip8_program_into_bytes!(
            0x6001 0x6102 0x6203 0xA400 0xF255
            0x6000 0x6100 0x6209 0xA400 0xF165
        ));
        step_n(&mut chip8, 5);
        assert_eq!(&chip8.ram().bytes()[0x400..0x404], &[1, 2, 3, 0]);
        assert_eq!(chip8.registers.i, 0x403);

        step_n(&mut chip8, 5);
        assert_eq!(&chip8.registers.v[..3], &[1, 2, 9]);
        assert_eq!(chip8.registers.i, 0x402);
    }

    #[test]
    fn register_store_past_memory_faults() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xAFFD 0xF255 0xF055));
        assert_eq!(step_n(&mut chip8, 2), EngineState::Running);
        assert_eq!(chip8.registers.i, 0x1000);

        assert_eq!(
            chip8.step(),
            EngineState::Faulted(Fault::MemoryOutOfBounds { address: 0x1000 })
        );

        let mut chip8 = machine(&chip8_program_into_bytes!(0xAFFE 0xF265));
        assert!(matches!(step_n(&mut chip8, 2), EngineState::Faulted(_)));
        assert_eq!(chip8.registers.i, 0xFFE, "Faulting instruction leaves I alone");
    }

    #[test]
    fn add_to_index_detects_overflow() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xAFFF 0x6001 0xF01E));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.i, 0x000);
        assert_eq!(chip8.registers.v[VF], 1);

        let mut chip8 = machine(&chip8_program_into_bytes!(0x6F05 0xA100 0x6010 0xF01E));
        step_n(&mut chip8, 4);
        assert_eq!(chip8.registers.i, 0x110);
        assert_eq!(chip8.registers.v[VF], 0);
    }

    #[test]
    fn glyph_address() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x600A 0xF029));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.i, 50);
    }

    #[test]
    fn skip_on_immediate() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6005 0x3005 NOOP 0x4005 NOOP));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.pc, 0x206);
        chip8.step();
        assert_eq!(chip8.registers.pc, 0x208);
    }

    #[test]
    fn skip_on_registers() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6005 0x6105 0x5010 NOOP 0x9010));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.pc, 0x208);
        chip8.step();
        assert_eq!(chip8.registers.pc, 0x20A);
    }

    #[test]
    fn skip_on_key_state() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x600B 0xE09E 0x0000 0xE0A1));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.pc, 0x204, "Key B is up, no skip");

        chip8.registers.pc = 0x202;
        chip8.set_key(0xB, true);
        chip8.step();
        assert_eq!(chip8.registers.pc, 0x206, "Key B is down, skip");

        chip8.step();
        assert_eq!(chip8.registers.pc, 0x208, "Key B is down, no skip");
    }

    #[test]
    fn subroutine_call_and_return() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x2206 0x6101 0x1204 0x6042 0x00EE));
        chip8.step();
        assert_eq!(chip8.registers.pc, 0x206);
        assert_eq!(chip8.registers.stack.depth(), 1);

        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.pc, 0x202);
        assert_eq!(chip8.registers.stack.depth(), 0);

        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.v[..2], [0x42, 0x01]);
        assert_eq!(chip8.registers.pc, 0x204);
    }

    #[test]
    fn runaway_recursion_faults() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x2200));
        assert_eq!(step_n(&mut chip8, STACK_CAPACITY), EngineState::Running);
        assert_eq!(chip8.step(), EngineState::Faulted(Fault::StackOverflow));
    }

    #[test]
    fn return_outside_subroutine_faults() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x00EE));
        assert_eq!(chip8.step(), EngineState::Faulted(Fault::StackUnderflow));
        assert_eq!(chip8.fault(), Some(Fault::StackUnderflow));
    }

    #[test]
    fn jump_with_offset() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6004 0xB300));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.registers.pc, 0x304);
    }

    #[test]
    fn random_is_masked() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xC30F));
        chip8.rng.expect_random_u8().times(1).return_const(0xABu8);
        chip8.step();
        assert_eq!(chip8.registers.v[3], 0x0B);
    }

    #[test]
    fn unknown_opcode_is_skipped() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x0123 0xFFFF 0x6001));
        assert_eq!(step_n(&mut chip8, 2), EngineState::Running);
        assert_eq!(chip8.registers.pc, 0x204);
        chip8.step();
        assert_eq!(chip8.registers.v[0], 1);
    }

    #[test]
    fn key_wait_stalls_until_a_press() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xF30A 0x6001));
        assert_eq!(chip8.step(), EngineState::AwaitingKey);

        for _ in 0..10 {
            assert_eq!(chip8.step(), EngineState::AwaitingKey);
            assert_eq!(chip8.registers.pc, 0x200);
        }

        chip8.set_key(9, true);
        assert_eq!(chip8.step(), EngineState::Running);
        assert_eq!(chip8.registers.v[3], 9);
        assert_eq!(chip8.registers.pc, 0x202);

        chip8.step();
        assert_eq!(chip8.registers.v[0], 1);
    }

    #[test]
    fn key_wait_ignores_keys_already_held() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0xF30A));
        chip8.set_key(9, true);
        chip8.step();
        chip8.set_key(9, true);
        assert_eq!(chip8.step(), EngineState::AwaitingKey);
        chip8.set_key(16, true);
        assert_eq!(chip8.step(), EngineState::AwaitingKey);

        chip8.set_key(9, false);
        chip8.set_key(9, true);
        assert_eq!(chip8.step(), EngineState::Running);
        assert_eq!(chip8.registers.v[3], 9);
    }

    #[test]
    fn timers_follow_wall_clock_not_steps() {
        // VA = 10, delay = VA, loop forever.
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6A0A 0xFA15 0x1204));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.delay_timer(), 10);

        for _ in 0..1000 {
            MockClock::advance(Duration::from_nanos(500));
            chip8.step();
        }
        assert_eq!(chip8.delay_timer(), 10);

        MockClock::advance(Duration::from_millis(20));
        chip8.step();
        assert_eq!(chip8.delay_timer(), 9);
    }

    #[test]
    fn delay_timer_runs_at_sixty_hertz_when_stepped_every_10ms() {
        // V0 = 60, delay = V0, loop forever.
        let mut chip8 = machine(&chip8_program_into_bytes!(0x603C 0xF015 0x1204));
        step_n(&mut chip8, 2);
        assert_eq!(chip8.delay_timer(), 60);

        for _ in 0..100 {
            MockClock::advance(Duration::from_millis(10));
            chip8.step();
        }
        assert_eq!(chip8.delay_timer(), 0);
    }

    #[test]
    fn timers_keep_running_during_key_wait() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6A05 0xFA15 0xF30A));
        assert_eq!(step_n(&mut chip8, 3), EngineState::AwaitingKey);
        assert_eq!(chip8.delay_timer(), 5);

        for expected in [4, 3, 2] {
            MockClock::advance(DECREMENT_PERIOD);
            assert_eq!(chip8.step(), EngineState::AwaitingKey);
            assert_eq!(chip8.delay_timer(), expected);
            assert_eq!(chip8.registers.pc, 0x204);
        }
    }

    #[test]
    fn delay_timer_is_readable() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6A05 0xFA15 0xFB07));
        step_n(&mut chip8, 3);
        assert_eq!(chip8.registers.v[0xB], 5);
    }

    #[test]
    fn sound_timer_signals_tone_stop() {
        let mut chip8 = machine(&chip8_program_into_bytes!(0x6001 0xF018 0x1204));
        step_n(&mut chip8, 2);
        assert!(chip8.is_tone_sounding());
        assert!(!chip8.take_tone_stopped());

        MockClock::advance(DECREMENT_PERIOD);
        chip8.step();
        assert_eq!(chip8.sound_timer(), 0);
        assert!(chip8.take_tone_stopped());
        assert!(!chip8.take_tone_stopped());
    }

    #[test]
    fn program_counter_past_memory_faults() {
        let mut program = vec![0u8; MAX_ROM_SIZE];
        program[..2].copy_from_slice(&[0x1F, 0xFE]);
        program[MAX_ROM_SIZE - 2..].copy_from_slice(&[0x60, 0x42]);
        let mut chip8 = machine(&program);

        assert_eq!(step_n(&mut chip8, 2), EngineState::Running);
        assert_eq!(chip8.registers.v[0], 0x42);
        assert_eq!(chip8.registers.pc, 0x1000);

        let fault = Fault::ProgramCounterOutOfRange(0x1000);
        assert_eq!(chip8.step(), EngineState::Faulted(fault));

        // Faulted is terminal.
        chip8.set_key(1, true);
        assert_eq!(chip8.step(), EngineState::Faulted(fault));
        assert_eq!(chip8.registers.pc, 0x1000);
    }

    #[test]
    fn machines_are_independent() {
        let program = chip8_program_into_bytes!(0x7001 0x1200);
        let mut first = machine(&program);
        let mut second = machine(&program);
        step_n(&mut first, 6);
        step_n(&mut second, 2);
        assert_eq!(first.registers.v[0], 3);
        assert_eq!(second.registers.v[0], 1);
    }
}
