//! Host-side devices the run loop talks to.
use crate::display::DISPLAY_PIXELS;

#[cfg_attr(test, mockall::automock)]
pub trait Tone {
    fn start_tone(&mut self) {}
    fn stop_tone(&mut self) {}
    fn is_tone_on(&self) -> bool {
        false
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Screen {
    /// Called with the whole screen whenever it has changed.
    fn draw_frame(&mut self, _pixels: &[bool; DISPLAY_PIXELS]) {}
}

/// A change in state of one of the 16 hex keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: usize,
    pub pressed: bool,
}

pub trait HexKeyboard {
    /// Key transitions since the last poll, oldest first.
    fn key_events(&mut self) -> Vec<KeyEvent> {
        Vec::new()
    }
}

/// Silent, blind and keyless.
pub struct DummyPeripherals;

impl Tone for DummyPeripherals {}
impl Screen for DummyPeripherals {}
impl HexKeyboard for DummyPeripherals {}
