//! Blocking fifo used to hand commands from a UI/main thread to a background worker.
//!
//! - [`Fifo`]: mutex + condvar queue, optionally bounded for backpressure
//! - [`Timeout`]: block forever, up to a duration, or not at all
//! - [`Message`]: default element (state tag + optional owned payloads)
//! - [`FifoError`] / [`Rejected`]: timeout vs closed vs generic failures
//!
//! There is no broadcast/poison on drop. To stop a consumer, send it a message its protocol
//! recognizes (see [`Message::quit`]) or [`Fifo::close`] the fifo.

mod error;
mod fifo;
mod message;
mod timeout;

pub use error::{ErrorKind, FifoError, Rejected, Result, WaitPhase};
pub use fifo::{Capacity, Fifo};
pub use message::Message;
pub use timeout::Timeout;

#[cfg(test)]
mod proptests;
