//! Fetch state machine and the cross-thread cancellation flag.
//!
//! ```text
//! Idle ──fetch──▶ Running ──▶ Completed ──fetch──▶ Running
//!                    │            │
//!                    ▼            └──reset──▶ Idle
//!                Cancelled ──reset──▶ Idle
//! ```
//!
//! Only `stop` may be called from a thread other than the one running the
//! fetch. `reset` must wait until that thread has returned.
//!
//! Every fetch gets a generation number, packed next to the state in one
//! atomic word. A stop records the generation it observed as running, so a
//! stop that lands after its fetch ended cannot cancel the next one.

use crate::errors::StateError;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;

/// Observable state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FetchState {
    /// No fetch has run since construction or the last reset.
    Idle = 0,
    /// A fetch is in flight.
    Running = 1,
    /// The last fetch ran to the end, successfully or not.
    Completed = 2,
    /// The last fetch was abandoned after a stop request.
    Cancelled = 3,
}

impl FetchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => FetchState::Running,
            2 => FetchState::Completed,
            3 => FetchState::Cancelled,
            _ => FetchState::Idle,
        }
    }
}

/// State and generation of one transport, as a single packed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot(u64);

impl Snapshot {
    fn new(state: FetchState, generation: u64) -> Self {
        Snapshot((generation << STATE_BITS) | state as u64)
    }

    pub(crate) fn state(self) -> FetchState {
        FetchState::from_u8((self.0 & STATE_MASK) as u8)
    }

    pub(crate) fn generation(self) -> u64 {
        self.0 >> STATE_BITS
    }
}

#[derive(Debug)]
pub(crate) struct FetchControl {
    current: AtomicU64,
    /// Highest generation a stop was requested for.
    stop_generation: AtomicU64,
}

impl FetchControl {
    pub(crate) fn new() -> Self {
        Self {
            current: AtomicU64::new(Snapshot::new(FetchState::Idle, 0).0),
            stop_generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot(self.current.load(Ordering::Acquire))
    }

    pub(crate) fn state(&self) -> FetchState {
        self.snapshot().state()
    }

    /// Enters `Running` under a fresh generation.
    pub(crate) fn begin(&self) -> Result<RunningGuard<'_>, StateError> {
        loop {
            let current = self.snapshot();
            match current.state() {
                FetchState::Running => return Err(StateError::FetchInProgress),
                FetchState::Cancelled => return Err(StateError::ResetRequired),
                FetchState::Idle | FetchState::Completed => {}
            }

            let running = Snapshot::new(FetchState::Running, current.generation() + 1);
            if self
                .current
                .compare_exchange(current.0, running.0, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(RunningGuard {
                    control: self,
                    generation: running.generation(),
                    outcome: FetchState::Completed,
                });
            }
        }
    }

    /// Requests cancellation of the running fetch. No effect otherwise.
    pub(crate) fn stop(&self) {
        self.stop_observed(self.snapshot());
    }

    /// Stops the fetch `observed` was taken during, if it was running.
    fn stop_observed(&self, observed: Snapshot) {
        if observed.state() == FetchState::Running {
            self.stop_generation
                .fetch_max(observed.generation(), Ordering::AcqRel);
            debug!(generation = observed.generation(), "stop requested");
        }
    }

    /// True while running if a stop was requested for the current fetch.
    pub(crate) fn stop_requested(&self) -> bool {
        let current = self.snapshot();
        current.state() == FetchState::Running
            && self.stop_generation.load(Ordering::Acquire) == current.generation()
    }

    /// Returns to `Idle`. Refused while a fetch is running.
    pub(crate) fn reset(&self) {
        loop {
            let current = self.snapshot();
            if current.state() == FetchState::Running {
                warn!("reset_fetch called while a fetch is running; join the fetching thread first");
                return;
            }
            let idle = Snapshot::new(FetchState::Idle, current.generation());
            if self
                .current
                .compare_exchange(current.0, idle.0, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }
}

/// Leaves `Running` when dropped, so a panicking sink cannot wedge the transport.
pub(crate) struct RunningGuard<'a> {
    control: &'a FetchControl,
    generation: u64,
    outcome: FetchState,
}

impl RunningGuard<'_> {
    pub(crate) fn cancelled(&mut self) {
        self.outcome = FetchState::Cancelled;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        // Nothing else writes the word while it says `Running`.
        self.control.current.store(
            Snapshot::new(self.outcome, self.generation).0,
            Ordering::Release,
        );
    }
}
