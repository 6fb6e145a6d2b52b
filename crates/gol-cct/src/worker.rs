use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gol_fifo::{Fifo, FifoError, Timeout};

use crate::command::{Cell, CctCommand, Cycle};
use crate::config::CctConfig;
use crate::error::CctError;
use crate::render::{CycleStats, RenderBuffers, RenderFrame};

/// What the worker leaves behind once it has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub stats: CycleStats,
    pub alive: HashSet<Cell>,
}

/// Cloneable sender for threads other than the owner of the [`CycleWorker`].
#[derive(Debug, Clone)]
pub struct CctHandle {
    fifo: Arc<Fifo<CctCommand>>,
}

impl CctHandle {
    pub fn send(&self, cmd: CctCommand) -> Result<(), CctError> {
        self.send_timeout(cmd, Timeout::Infinite)
    }

    pub fn send_timeout(&self, cmd: CctCommand, timeout: Timeout) -> Result<(), CctError> {
        Ok(self.fifo.enqueue(cmd, timeout)?)
    }
}

/// Owner of the compute cycle thread.
///
/// Dropping it without calling [`CycleWorker::shutdown`] closes the fifo and joins the thread.
#[derive(Debug)]
pub struct CycleWorker {
    fifo: Arc<Fifo<CctCommand>>,
    buffers: Arc<RenderBuffers>,
    thread: Option<JoinHandle<Result<WorkerReport, CctError>>>,
}

impl CycleWorker {
    pub fn spawn<C: Cycle>(
        config: CctConfig,
        cycle: C,
        initial: impl IntoIterator<Item = Cell>,
    ) -> Result<Self, CctError> {
        config.validate()?;

        let fifo = Arc::new(Fifo::create(config.queue_capacity)?);
        let buffers = Arc::new(RenderBuffers::new());

        let mut state = WorkerState {
            fifo: fifo.clone(),
            buffers: buffers.clone(),
            cycle,
            alive: initial.into_iter().collect(),
            back: RenderFrame::default(),
            stats: CycleStats {
                playing: config.start_playing,
                ..CycleStats::default()
            },
            cycle_period: config.cycle_period,
            last_cycle: Instant::now(),
        };
        // Readers get a frame before the first command is processed.
        state.publish();

        let thread = thread::Builder::new()
            .name("gol-cct".into())
            .spawn(move || state.run())
            .map_err(CctError::Spawn)?;

        tracing::debug!(?config, "compute cycle thread started");
        Ok(Self {
            fifo,
            buffers,
            thread: Some(thread),
        })
    }

    pub fn send(&self, cmd: CctCommand) -> Result<(), CctError> {
        Ok(self.fifo.enqueue(cmd, Timeout::Infinite)?)
    }

    pub fn handle(&self) -> CctHandle {
        CctHandle {
            fifo: self.fifo.clone(),
        }
    }

    pub fn buffers(&self) -> &Arc<RenderBuffers> {
        &self.buffers
    }

    /// Sends [`CctCommand::Quit`], joins the thread and destroys the fifo.
    ///
    /// If the thread already stopped, the fifo is closed and this only joins it, so a
    /// panicking [`Cycle`] is reported as [`CctError::WorkerPanicked`].
    ///
    /// Fails with [`FifoError::InUse`] if a [`CctHandle`] is still alive; the thread has
    /// already stopped at that point.
    pub fn shutdown(mut self) -> Result<WorkerReport, CctError> {
        match self.fifo.enqueue(CctCommand::Quit, Timeout::Infinite) {
            Ok(()) => {}
            Err(rejected) if matches!(rejected.error, FifoError::Closed) => {
                tracing::debug!("compute cycle thread already stopped");
            }
            Err(rejected) => return Err(rejected.into()),
        }
        let report = self.join()?;

        let fifo = self.fifo.clone();
        drop(self);
        let discarded = Fifo::destroy_shared(fifo)?;
        if !discarded.is_empty() {
            tracing::debug!(count = discarded.len(), "discarding commands queued after quit");
        }
        Ok(report)
    }

    fn join(&mut self) -> Result<WorkerReport, CctError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| CctError::WorkerPanicked)?,
            None => Err(CctError::Queue(FifoError::Closed)),
        }
    }
}

impl Drop for CycleWorker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.fifo.close();
            if let Err(err) = self.join() {
                tracing::warn!("compute cycle thread stopped with an error: {err}");
            }
        }
    }
}

struct WorkerState<C> {
    fifo: Arc<Fifo<CctCommand>>,
    buffers: Arc<RenderBuffers>,
    cycle: C,
    alive: HashSet<Cell>,
    back: RenderFrame,
    stats: CycleStats,
    cycle_period: Duration,
    last_cycle: Instant,
}

/// Closes the command fifo when the compute cycle thread exits, including by unwinding.
/// Blocked and later senders then fail with [`FifoError::Closed`] instead of waiting on a
/// fifo nobody reads.
struct CloseOnExit(Arc<Fifo<CctCommand>>);

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.0.close();
    }
}

impl<C: Cycle> WorkerState<C> {
    fn run(mut self) -> Result<WorkerReport, CctError> {
        let _close = CloseOnExit(self.fifo.clone());
        loop {
            let cmd = match self.fifo.dequeue(self.next_timeout()) {
                Ok(cmd) => cmd,
                // Only reachable while playing: the cycle period has elapsed.
                Err(err) if err.is_timeout() => CctCommand::Compute,
                Err(FifoError::Closed) => break,
                Err(err) => {
                    tracing::warn!("compute cycle thread failed to dequeue: {err}");
                    return Err(err.into());
                }
            };

            tracing::trace!(?cmd, "cct command");
            match cmd {
                CctCommand::Quit => break,
                CctCommand::Compute => self.compute(),
                CctCommand::TogglePlay => {
                    self.stats.playing = !self.stats.playing;
                    tracing::debug!(playing = self.stats.playing, "toggled play");
                    if self.stats.playing {
                        // Best effort: if the fifo is full the timeout path computes instead.
                        if let Err(rejected) =
                            self.fifo.enqueue(CctCommand::Compute, Timeout::Immediate)
                        {
                            tracing::trace!(
                                error = %rejected.error,
                                "could not queue compute after play"
                            );
                        }
                    }
                    self.publish();
                }
                CctCommand::ToggleCell(cell) => {
                    if !self.alive.remove(&cell) {
                        self.alive.insert(cell);
                    }
                    self.publish();
                }
                CctCommand::SetCyclePeriod(period) => {
                    if period.is_zero() {
                        tracing::warn!("ignoring zero cycle period");
                    } else {
                        self.cycle_period = period;
                    }
                }
            }
        }

        tracing::debug!(cycles = self.stats.cycles, "compute cycle thread stopping");
        Ok(WorkerReport {
            stats: self.stats,
            alive: self.alive,
        })
    }

    /// Paused: wait for a command. Playing: wait for what is left of the current period.
    fn next_timeout(&self) -> Timeout {
        if !self.stats.playing {
            return Timeout::Infinite;
        }
        let remaining = self.cycle_period.saturating_sub(self.last_cycle.elapsed());
        if remaining.is_zero() {
            Timeout::Immediate
        } else {
            Timeout::After(remaining)
        }
    }

    fn compute(&mut self) {
        let start = Instant::now();
        self.alive = self.cycle.advance(&self.alive);
        self.last_cycle = Instant::now();
        self.stats.cycles += 1;
        self.stats.last_compute_time = self.last_cycle - start;
        self.publish();
    }

    fn publish(&mut self) {
        self.stats.frames += 1;
        self.back.cells.clear();
        self.back.cells.extend(self.alive.iter().copied());
        self.back.stats = self.stats;
        self.buffers.swap(&mut self.back);
    }
}
