//! Delay and sound timers.
//!
//! Both timers count down at 60Hz of wall-clock time, independent of how
//! quickly instructions are executed. Each timer remembers when it last
//! decremented and decrements at most once per [`CountdownTimer::tick`], so a
//! host that stalls does not get a burst of catch-up decrements afterwards.
use std::time::Duration;

#[cfg(test)]
pub use mock_instant::Instant;
#[cfg(not(test))]
pub use std::time::Instant;

pub const TIMER_FREQUENCY_HZ: u64 = 60;
pub const DECREMENT_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / TIMER_FREQUENCY_HZ);

#[derive(Debug, Clone, Copy)]
pub struct CountdownTimer {
    value: u8,
    last_decrement: Instant,
}

impl CountdownTimer {
    pub fn new(now: Instant) -> Self {
        Self {
            value: 0,
            last_decrement: now,
        }
    }

    pub fn get(&self) -> u8 {
        self.value
    }

    /// Load a new value. The next decrement is a full period from `now`.
    pub fn set(&mut self, value: u8, now: Instant) {
        self.value = value;
        self.last_decrement = now;
    }

    /// Decrement once if a full period has passed since the last decrement.
    /// Returns `true` if the value changed.
    ///
    /// Periods are scheduled back to back, so the rate stays at 60Hz however
    /// often this is called. A caller more than one period late is resynced
    /// to `now` rather than owed the missed decrements.
    pub fn tick(&mut self, now: Instant) -> bool {
        let behind = now.saturating_duration_since(self.last_decrement);
        if behind < DECREMENT_PERIOD {
            return false;
        }
        self.last_decrement = if behind >= 2 * DECREMENT_PERIOD {
            now
        } else {
            self.last_decrement + DECREMENT_PERIOD
        };
        if self.value == 0 {
            return false;
        }
        self.value -= 1;
        true
    }
}

/// The pair of timers owned by a machine.
#[derive(Debug, Clone, Copy)]
pub struct Timers {
    pub delay: CountdownTimer,
    pub sound: CountdownTimer,
}

impl Timers {
    pub fn new(now: Instant) -> Self {
        Self {
            delay: CountdownTimer::new(now),
            sound: CountdownTimer::new(now),
        }
    }

    /// Advance both timers. Returns `true` when the sound timer has just
    /// reached zero, which is the signal for the host to stop the tone.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.delay.tick(now);
        self.sound.tick(now) && self.sound.get() == 0
    }

    pub fn is_tone_sounding(&self) -> bool {
        self.sound.get() > 0
    }
}
