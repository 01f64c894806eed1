use crate::time::Hertz;

/// Number of status polls a wait loop may spend before the driver gives
/// up with [`Error::PollTimeout`](super::Error::PollTimeout).
///
/// At typical core clocks this is on the order of tens of milliseconds,
/// orders of magnitude above the longest legal transaction at 100 kHz.
pub const DEFAULT_POLL_BUDGET: u32 = 1_000_000;

/// A structure for specifying the I2C controller configuration
///
/// This structure uses the builder pattern to generate the configuration:
///
/// ```
/// use max32666_hal::i2c::Config;
/// use max32666_hal::prelude::*;
///
/// let config = Config::new(50.MHz()).poll_budget(10_000);
/// ```
#[derive(Copy, Clone)]
pub struct Config {
    /// APB clock feeding the I2C block.
    pub(crate) peripheral_clock: Hertz,
    /// Upper bound on polls per status wait.
    pub(crate) poll_budget: u32,
}

impl Config {
    /// Create a default configuration from the APB clock feeding the
    /// block.
    pub const fn new(peripheral_clock: Hertz) -> Self {
        Config {
            peripheral_clock,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }

    /// Bound every status wait to at most `polls` polls of the awaited
    /// flag, converting a stuck bus into an error instead of an indefinite
    /// hang.
    pub const fn poll_budget(mut self, polls: u32) -> Self {
        self.poll_budget = polls;
        self
    }
}
