//! Throttled window creation.
//!
//! Bursts of new tickers are materialized one at a time with a fixed pause in
//! between, so adding a dozen favorites at once does not relayout the desktop
//! a dozen times in a single frame. The event loop is the single worker: it
//! calls [`CreationQueue::drain`] every tick and the queue decides whether the
//! head entry is due.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::constants::CREATION_DELAY;
use crate::error::DeskError;
use crate::registry::WidgetRegistry;
use crate::window::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpState {
    Idle,
    Busy,
    Cooling(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// A materialization is in flight or still inside its delay.
    Processing,
    Empty,
    Closed,
}

#[derive(Debug)]
pub enum Drained {
    Materialized(Ticker),
    /// The head entry already had a window, so nothing was created.
    AlreadyMounted(Ticker),
    Failed { ticker: Ticker, error: DeskError },
    Skipped(Skip),
}

impl Drained {
    pub fn ticker(&self) -> Option<&Ticker> {
        match self {
            Drained::Materialized(ticker)
            | Drained::AlreadyMounted(ticker)
            | Drained::Failed { ticker, .. } => Some(ticker),
            Drained::Skipped(_) => None,
        }
    }
}

/// Moves the pump out of `Busy` however the materialize step ends, including
/// by unwinding.
struct Release<'a> {
    state: &'a mut PumpState,
    until: Instant,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        *self.state = PumpState::Cooling(self.until);
    }
}

#[derive(Debug)]
pub struct CreationQueue {
    pending: VecDeque<Ticker>,
    state: PumpState,
    delay: Duration,
    closed: bool,
}

impl Default for CreationQueue {
    fn default() -> Self {
        Self::new(CREATION_DELAY)
    }
}

impl CreationQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            state: PumpState::Idle,
            delay,
            closed: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Append `ticker` unless it is already pending or already mounted.
    pub fn enqueue(&mut self, ticker: Ticker, registry: &WidgetRegistry) -> bool {
        if self.closed || self.is_pending(&ticker) || registry.has(&ticker) {
            return false;
        }
        tracing::debug!(ticker = %ticker, depth = self.pending.len() + 1, "queued window");
        self.pending.push_back(ticker);
        true
    }

    pub fn is_pending(&self, ticker: &Ticker) -> bool {
        self.pending.contains(ticker)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Ticker> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop a ticker that has not been materialized yet.
    pub fn cancel(&mut self, ticker: &Ticker) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t != ticker);
        let removed = self.pending.len() != before;
        if removed {
            tracing::debug!(ticker = %ticker, "dequeued pending window");
        }
        removed
    }

    /// Whether a drain started now would be skipped as re-entrant.
    pub fn is_processing(&self, now: Instant) -> bool {
        match self.state {
            PumpState::Idle => false,
            PumpState::Busy => true,
            PumpState::Cooling(until) => now < until,
        }
    }

    /// When the next entry becomes due, if anything is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.pending.is_empty() || self.closed {
            return None;
        }
        match self.state {
            PumpState::Cooling(until) => Some(until),
            PumpState::Idle | PumpState::Busy => None,
        }
    }

    /// Materialize the head entry if the pump is free.
    ///
    /// At most one entry is taken per call and at most one per `delay`. A
    /// failing `materialize` still starts the delay, so a bad entry can never
    /// wedge the queue. `DuplicateWindow` from `materialize` means the window
    /// was already there: it is reported as [`Drained::AlreadyMounted`] and
    /// leaves the pump idle, since nothing was laid out.
    pub fn drain<F>(&mut self, now: Instant, materialize: F) -> Drained
    where
        F: FnOnce(&Ticker) -> Result<(), DeskError>,
    {
        if self.closed {
            return Drained::Skipped(Skip::Closed);
        }
        if self.is_processing(now) {
            return Drained::Skipped(Skip::Processing);
        }
        let Some(ticker) = self.pending.pop_front() else {
            self.state = PumpState::Idle;
            return Drained::Skipped(Skip::Empty);
        };
        self.state = PumpState::Busy;
        let release = Release {
            state: &mut self.state,
            until: now + self.delay,
        };
        let result = materialize(&ticker);
        drop(release);
        match result {
            Ok(()) => Drained::Materialized(ticker),
            Err(DeskError::DuplicateWindow(_)) => {
                self.state = PumpState::Idle;
                tracing::debug!(ticker = %ticker, "already mounted, skipped");
                Drained::AlreadyMounted(ticker)
            }
            Err(error) => {
                tracing::warn!(ticker = %ticker, %error, "window materialization failed");
                Drained::Failed { ticker, error }
            }
        }
    }

    /// Stop the pump for good and discard everything still waiting.
    pub fn shutdown(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(dropped = self.pending.len(), "creation queue shut down");
        }
        self.pending.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
