/// Source of random bytes for the `CXNN` instruction.
#[cfg_attr(test, mockall::automock)]
pub trait Chip8Rng {
    fn random_u8(&self) -> u8;
}

impl Chip8Rng for fastrand::Rng {
    /// `fastrand::Rng::new` seeds from process entropy, so a fresh machine
    /// gets a fresh sequence.
    fn random_u8(&self) -> u8 {
        self.u8(..)
    }
}
