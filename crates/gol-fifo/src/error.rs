use core::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FifoError>;

/// Where a blocking call ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Acquiring the internal lock.
    Lock,
    /// Waiting for a free slot in a bounded fifo.
    Space,
    /// Waiting for a message to arrive.
    Data,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitPhase::Lock => "acquiring the fifo lock",
            WaitPhase::Space => "waiting for free space",
            WaitPhase::Data => "waiting for a message",
        })
    }
}

/// Coarse classification of a [`FifoError`].
///
/// Callers that only care about "retry later" vs "give up" can switch on this instead of
/// matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The deadline elapsed; the fifo is still usable.
    Timeout,
    /// The fifo was closed and will not accept or produce any more messages.
    Closed,
    /// Anything else (allocation failure, misuse of a shared handle).
    Generic,
}

/// Errors returned by fifo operations.
#[derive(Debug, Error)]
pub enum FifoError {
    #[error("timed out while {0}")]
    Timeout(WaitPhase),

    #[error("fifo is closed")]
    Closed,

    #[error("could not reserve storage for {capacity} messages")]
    Init { capacity: usize },

    #[error("fifo is still referenced by {handles} other handle(s)")]
    InUse { handles: usize },
}

impl FifoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FifoError::Timeout(_) => ErrorKind::Timeout,
            FifoError::Closed => ErrorKind::Closed,
            FifoError::Init { .. } | FifoError::InUse { .. } => ErrorKind::Generic,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

/// A failed enqueue.
///
/// The message is handed back untouched so the caller keeps ownership of its payload and can
/// retry (or dispose of it) without cloning up front.
pub struct Rejected<T> {
    pub error: FifoError,
    pub message: T,
}

impl<T> Rejected<T> {
    pub fn into_inner(self) -> T {
        self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message rejected: {}", self.error)
    }
}

impl<T> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for FifoError {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}
