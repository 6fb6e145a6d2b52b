//! Mutex + condition-variable fifo.
//!
//! Locking protocol:
//! - every access to the buffered messages and to the waiter counters happens under `state`;
//! - consumers sleep on `not_empty`, producers of a bounded fifo sleep on `not_full`;
//! - a wait loop registers itself in `waiting_consumers` / `waiting_producers` for its whole
//!   duration, so the other side only signals when somebody can actually be woken;
//! - one deadline is computed per call and shared by lock acquisition and the wait that
//!   follows. A call that spends most of its budget contending for the lock gets a shorter
//!   wait window.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{FifoError, Rejected, Result, WaitPhase};
use crate::message::Message;
use crate::timeout::Timeout;

/// Maximum number of buffered messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
    /// Producers never wait for space.
    #[default]
    Unbounded,
    /// Producers wait while this many messages are buffered.
    ///
    /// `Bounded(0)` is accepted; every enqueue on it waits until its timeout.
    Bounded(usize),
}

impl Capacity {
    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Unbounded => None,
            Capacity::Bounded(n) => Some(n),
        }
    }

    pub fn is_bounded(self) -> bool {
        matches!(self, Capacity::Bounded(_))
    }
}

impl From<Option<usize>> for Capacity {
    fn from(limit: Option<usize>) -> Self {
        limit.map_or(Capacity::Unbounded, Capacity::Bounded)
    }
}

struct State<T> {
    queue: VecDeque<T>,
    waiting_consumers: usize,
    waiting_producers: usize,
    closed: bool,
}

/// Blocking multi-producer / multi-consumer fifo.
///
/// Share it between threads behind an `Arc`. Ownership of each message moves from the
/// producer into the fifo and then to whichever consumer dequeues it.
pub struct Fifo<T = Message> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Capacity,
}

impl<T> Fifo<T> {
    /// Creates an empty fifo.
    ///
    /// Storage for a bounded fifo is reserved up front; failing to reserve it is reported as
    /// [`FifoError::Init`].
    pub fn create(capacity: Capacity) -> Result<Self> {
        let mut queue = VecDeque::new();
        if let Capacity::Bounded(limit) = capacity {
            queue
                .try_reserve_exact(limit)
                .map_err(|_| FifoError::Init { capacity: limit })?;
        }

        Ok(Self {
            state: Mutex::new(State {
                queue,
                waiting_consumers: 0,
                waiting_producers: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    /// Tears the fifo down and returns the messages that were never dequeued.
    pub fn destroy(self) -> Vec<T> {
        let state = self.state.into_inner();
        if !state.queue.is_empty() {
            tracing::debug!(remaining = state.queue.len(), "destroying non-empty fifo");
        }
        Vec::from(state.queue)
    }

    /// [`Fifo::destroy`] for a shared fifo. Fails while any other handle is still alive,
    /// which also rules out destroying it under a blocked thread.
    pub fn destroy_shared(this: Arc<Self>) -> Result<Vec<T>> {
        match Arc::try_unwrap(this) {
            Ok(fifo) => Ok(fifo.destroy()),
            Err(this) => Err(FifoError::InUse {
                handles: Arc::strong_count(&this) - 1,
            }),
        }
    }

    /// Appends `message` at the tail.
    ///
    /// Waits (subject to `timeout`) for the lock and, on a full bounded fifo, for a free slot.
    /// On failure the message is returned inside [`Rejected`].
    pub fn enqueue(&self, message: T, timeout: Timeout) -> std::result::Result<(), Rejected<T>> {
        let deadline = timeout.deadline(Instant::now());

        let mut state = match self.lock(deadline) {
            Ok(state) => state,
            Err(error) => return Err(Rejected { error, message }),
        };

        if let Some(limit) = self.capacity.limit() {
            state.waiting_producers += 1;
            let waited = wait_while(
                &self.not_full,
                &mut state,
                deadline,
                WaitPhase::Space,
                |s| !s.closed && s.queue.len() >= limit,
            );
            state.waiting_producers -= 1;
            if let Err(error) = waited {
                return Err(Rejected { error, message });
            }
        }

        if state.closed {
            return Err(Rejected {
                error: FifoError::Closed,
                message,
            });
        }

        state.queue.push_back(message);

        if state.waiting_consumers > 0 {
            tracing::trace!(waiting = state.waiting_consumers, "waking a consumer");
            self.not_empty.notify_one();
        }
        Ok(())
    }

    /// Removes and returns the head message.
    ///
    /// Waits (subject to `timeout`) for the lock and for a message. A closed fifo keeps
    /// handing out what it still buffers and reports [`FifoError::Closed`] once drained.
    pub fn dequeue(&self, timeout: Timeout) -> Result<T> {
        let deadline = timeout.deadline(Instant::now());

        let mut state = self.lock(deadline)?;

        state.waiting_consumers += 1;
        let waited = wait_while(
            &self.not_empty,
            &mut state,
            deadline,
            WaitPhase::Data,
            |s| !s.closed && s.queue.is_empty(),
        );
        state.waiting_consumers -= 1;
        waited?;

        let message = state.queue.pop_front().ok_or(FifoError::Closed)?;

        if self.capacity.is_bounded() && state.waiting_producers > 0 {
            tracing::trace!(waiting = state.waiting_producers, "waking a producer");
            self.not_full.notify_one();
        }
        Ok(message)
    }

    /// Closes the fifo and wakes every blocked caller.
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        tracing::debug!(
            remaining = state.queue.len(),
            consumers = state.waiting_consumers,
            producers = state.waiting_producers,
            "closing fifo"
        );
        self.not_empty.notify_all();
        self.not_full.notify_all();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    /// Threads currently blocked in [`Fifo::dequeue`] (or about to be).
    pub fn waiting_consumers(&self) -> usize {
        self.state.lock().waiting_consumers
    }

    /// Threads currently blocked in [`Fifo::enqueue`] on a full fifo (or about to be).
    pub fn waiting_producers(&self) -> usize {
        self.state.lock().waiting_producers
    }

    fn lock(&self, deadline: Option<Instant>) -> Result<MutexGuard<'_, State<T>>> {
        match deadline {
            None => Ok(self.state.lock()),
            Some(deadline) => self.state.try_lock_until(deadline).ok_or_else(|| {
                tracing::debug!("timed out acquiring fifo lock");
                FifoError::Timeout(WaitPhase::Lock)
            }),
        }
    }
}

/// Sleeps on `cond` while `blocked` holds. Re-checks after every wake-up, so spurious wakes
/// and another thread winning the race for the slot/message both just loop.
fn wait_while<T>(
    cond: &Condvar,
    state: &mut MutexGuard<'_, State<T>>,
    deadline: Option<Instant>,
    phase: WaitPhase,
    mut blocked: impl FnMut(&State<T>) -> bool,
) -> Result<()> {
    while blocked(&**state) {
        match deadline {
            None => cond.wait(state),
            Some(deadline) => {
                if cond.wait_until(state, deadline).timed_out() && blocked(&**state) {
                    tracing::debug!(%phase, "fifo wait timed out");
                    return Err(FifoError::Timeout(phase));
                }
            }
        }
    }
    Ok(())
}

impl<T> fmt::Debug for Fifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Fifo");
        s.field("capacity", &self.capacity);
        if let Some(state) = self.state.try_lock() {
            s.field("len", &state.queue.len())
                .field("waiting_consumers", &state.waiting_consumers)
                .field("waiting_producers", &state.waiting_producers)
                .field("closed", &state.closed);
        }
        s.finish_non_exhaustive()
    }
}
