//! Headless host loop driving a [`Chip8`] with a set of peripherals.
use std::{thread::sleep, time::Duration};

use log::info;

use crate::{
    interpreter::{Chip8, EngineState},
    peripherals::{HexKeyboard, KeyEvent, Screen, Tone},
    rng::Chip8Rng,
    Config, Fault,
};

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Faulted(Fault),
    StepLimitReached,
}

/// Pause between steps for a given rate. `0` means run flat out.
pub fn step_interval(steps_per_second: u32) -> Option<Duration> {
    match steps_per_second {
        0 => None,
        rate => Some(Duration::from_nanos(1_000_000_000 / rate as u64)),
    }
}

/// Step `chip8` until it faults or `max_steps` have run.
///
/// Each iteration forwards pending key events, steps the machine, redraws if
/// the framebuffer changed, keeps the tone in line with the sound timer and
/// sleeps to hold `config.steps_per_second`.
pub fn run<R, T, U, V>(
    chip8: &mut Chip8<R>,
    config: &Config,
    tone: &mut T,
    screen: &mut U,
    hex_keyboard: &mut V,
    max_steps: Option<u64>,
) -> RunOutcome
where
    R: Chip8Rng,
    T: Tone,
    U: Screen,
    V: HexKeyboard,
{
    let interval = step_interval(config.steps_per_second);
    let mut steps: u64 = 0;

    loop {
        if max_steps.is_some_and(|max| steps >= max) {
            info!("Stopping after {steps} steps");
            return RunOutcome::StepLimitReached;
        }

        for KeyEvent { key, pressed } in hex_keyboard.key_events() {
            chip8.set_key(key, pressed);
        }

        let state = chip8.step();
        steps += 1;
        if let EngineState::Faulted(fault) = state {
            return RunOutcome::Faulted(fault);
        }

        if let Some(pixels) = chip8.take_frame() {
            screen.draw_frame(pixels);
        }

        // update tone
        let stop_signalled = chip8.take_tone_stopped();
        let tone_should_be_sounding = chip8.is_tone_sounding();
        if tone_should_be_sounding && !tone.is_tone_on() {
            tone.start_tone();
        } else if !tone_should_be_sounding && (stop_signalled || tone.is_tone_on()) {
            tone.stop_tone();
        }

        if let Some(interval) = interval {
            sleep(interval);
        }
    }
}
