//! Machine configuration.

/// Selects which of the two historical behaviours the shift instructions
/// `8XY6` and `8XYE` follow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityMode {
    /// COSMAC VIP behaviour: `VY` is shifted and the result copied into `VX`.
    Legacy,
    /// CHIP-48 and later: `VX` is shifted in place and `VY` is ignored.
    #[default]
    Modern,
}

/// Default host pacing, in instructions per second.
pub const DEFAULT_STEPS_PER_SECOND: u32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub compatibility: CompatibilityMode,
    /// Consumed by the host loop only. `0` runs unthrottled.
    pub steps_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityMode::default(),
            steps_per_second: DEFAULT_STEPS_PER_SECOND,
        }
    }
}
