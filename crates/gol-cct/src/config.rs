use std::time::Duration;

use gol_fifo::Capacity;

use crate::error::CctError;

/// Worker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CctConfig {
    /// Time between two periodic cycles while playing.
    pub cycle_period: Duration,
    /// Capacity of the command fifo.
    pub queue_capacity: Capacity,
    /// Start in the playing state instead of paused.
    pub start_playing: bool,
}

impl CctConfig {
    pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_secs(1);

    pub fn with_cycle_period(mut self, cycle_period: Duration) -> Self {
        self.cycle_period = cycle_period;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: Capacity) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn playing(mut self) -> Self {
        self.start_playing = true;
        self
    }

    pub fn validate(&self) -> Result<(), CctError> {
        if self.cycle_period.is_zero() {
            return Err(CctError::InvalidConfig("cycle_period must be non-zero"));
        }
        // The worker posts to its own fifo; a zero-capacity fifo could never take that.
        if self.queue_capacity == Capacity::Bounded(0) {
            return Err(CctError::InvalidConfig("queue_capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for CctConfig {
    fn default() -> Self {
        Self {
            cycle_period: Self::DEFAULT_CYCLE_PERIOD,
            queue_capacity: Capacity::Unbounded,
            start_playing: false,
        }
    }
}
