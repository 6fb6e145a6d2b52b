//! Compute cycle thread (CCT): a background worker driven by a [`gol_fifo::Fifo`].
//!
//! The owning thread sends [`CctCommand`]s; the worker keeps the set of alive cells, advances
//! it through a caller-supplied [`Cycle`] and publishes the result through [`RenderBuffers`],
//! a double buffer guarded by its own mutex (independent from the fifo lock).
//!
//! While playing, the worker dequeues with a timeout equal to the time left in the current
//! cycle period and treats an elapsed timeout as "compute now". While paused it blocks
//! indefinitely. Shutdown is a [`CctCommand::Quit`] followed by a join.

mod command;
mod config;
mod error;
mod render;
mod worker;

pub use command::{Cell, CctCommand, Cycle};
pub use config::CctConfig;
pub use error::CctError;
pub use render::{CycleStats, RenderBuffers, RenderFrame};
pub use worker::{CctHandle, CycleWorker, WorkerReport};
