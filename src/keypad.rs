//! 16-key hex keypad and the latch used by the key-wait instruction.
//!
//! ```text
//! 1 2 3 C
//! 4 5 6 D
//! 7 8 9 E
//! A 0 B F
//! ```
pub const NUM_KEYS: usize = 16;

/// A key press that satisfied an outstanding wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The `VX` register recorded when the wait began.
    pub register: usize,
    pub key: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Idle,
    Waiting { register: usize },
    Satisfied(KeyPress),
}

#[derive(Debug, Clone)]
pub struct Keypad {
    pressed: [bool; NUM_KEYS],
    latch: Latch,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            pressed: [false; NUM_KEYS],
            latch: Latch::Idle,
        }
    }

    /// Record a key transition. Indices outside `0..16` are ignored.
    ///
    /// Returns the [`KeyPress`] if this was a press (up to down) while a wait
    /// was outstanding. The latch stops waiting from that moment on.
    pub(crate) fn set_key(&mut self, index: usize, pressed: bool) -> Option<KeyPress> {
        let state = self.pressed.get_mut(index)?;
        let was_pressed = std::mem::replace(state, pressed);
        if !pressed || was_pressed {
            return None;
        }

        match self.latch {
            Latch::Waiting { register } => {
                let press = KeyPress {
                    register,
                    key: index as u8,
                };
                self.latch = Latch::Satisfied(press);
                Some(press)
            }
            _ => None,
        }
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed
            .get(key as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Start waiting for the next key press, to be stored in `register`.
    /// Keys already held down do not count.
    pub(crate) fn begin_wait(&mut self, register: usize) {
        self.latch = Latch::Waiting { register };
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.latch, Latch::Waiting { .. })
    }

    /// Consume a satisfied wait, returning the press that ended it.
    pub(crate) fn take_key_press(&mut self) -> Option<KeyPress> {
        match self.latch {
            Latch::Satisfied(press) => {
                self.latch = Latch::Idle;
                Some(press)
            }
            _ => None,
        }
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
