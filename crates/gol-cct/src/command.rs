use std::collections::HashSet;
use std::time::Duration;

/// Grid coordinates of a cell. The grid is unbounded in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for Cell {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

/// Commands understood by the compute cycle thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CctCommand {
    /// Stop the worker loop. Anything queued behind it is discarded.
    Quit,
    /// Run one cycle now, whether playing or not.
    Compute,
    /// Start or stop periodic cycles.
    TogglePlay,
    /// Flip a single cell between alive and dead.
    ToggleCell(Cell),
    /// Change the time between two periodic cycles. Zero is ignored.
    SetCyclePeriod(Duration),
}

/// One generation step.
///
/// The worker owns the alive set and hands it to `advance`; the returned set becomes the next
/// generation.
pub trait Cycle: Send + 'static {
    fn advance(&mut self, alive: &HashSet<Cell>) -> HashSet<Cell>;
}

impl<F> Cycle for F
where
    F: FnMut(&HashSet<Cell>) -> HashSet<Cell> + Send + 'static,
{
    fn advance(&mut self, alive: &HashSet<Cell>) -> HashSet<Cell> {
        self(alive)
    }
}
