use gol_fifo::{FifoError, Rejected};
use thiserror::Error;

use crate::command::CctCommand;

#[derive(Debug, Error)]
pub enum CctError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Queue(#[from] FifoError),

    #[error("failed to spawn compute cycle thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("compute cycle thread panicked")]
    WorkerPanicked,
}

impl From<Rejected<CctCommand>> for CctError {
    fn from(rejected: Rejected<CctCommand>) -> Self {
        CctError::Queue(rejected.error)
    }
}
