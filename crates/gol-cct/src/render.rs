//! Double-buffered hand-off of the alive cell list from the worker to readers.
//!
//! The worker fills a back frame it owns without holding any lock, then swaps it with the
//! front frame under [`RenderBuffers`]' mutex. Readers only ever see complete frames and hold
//! the lock only for the duration of their closure.

use std::time::Duration;

use parking_lot::Mutex;

use crate::command::Cell;

/// Counters published alongside every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    /// Cycles computed since the worker started.
    pub cycles: u64,
    /// Wall time spent in the last cycle.
    pub last_compute_time: Duration,
    /// Whether periodic cycles are running.
    pub playing: bool,
    /// Frames published so far, including the initial one.
    pub frames: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderFrame {
    pub cells: Vec<Cell>,
    pub stats: CycleStats,
}

#[derive(Debug, Default)]
pub struct RenderBuffers {
    front: Mutex<RenderFrame>,
}

impl RenderBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the current front frame.
    pub fn read<R>(&self, f: impl FnOnce(&RenderFrame) -> R) -> R {
        f(&*self.front.lock())
    }

    pub fn snapshot(&self) -> RenderFrame {
        self.front.lock().clone()
    }

    pub fn stats(&self) -> CycleStats {
        self.front.lock().stats
    }

    /// Makes `back` the front frame; `back` receives the previous front so its allocation is
    /// reused for the next frame.
    pub(crate) fn swap(&self, back: &mut RenderFrame) {
        let mut front = self.front.lock();
        std::mem::swap(&mut *front, back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_publishes_back_frame_and_returns_old_front() {
        let buffers = RenderBuffers::new();
        let mut back = RenderFrame {
            cells: vec![Cell::new(1, 2)],
            stats: CycleStats {
                frames: 1,
                ..CycleStats::default()
            },
        };

        buffers.swap(&mut back);
        assert!(back.cells.is_empty());
        assert_eq!(buffers.read(|f| f.cells.clone()), vec![Cell::new(1, 2)]);
        assert_eq!(buffers.stats().frames, 1);
    }
}
