//! Instrumentation and cancellation at phase boundaries
//!
//! A solver run is a digest phase followed by `k` collision rounds. The
//! solver reports the start and end of each phase to a [`RoundObserver`],
//! and checks a [`CancelToken`] before starting each one.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One phase of a solver run
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Hashing every candidate into the first table
    Digest,
    /// Collision round with the given zero-based index
    Collision(usize),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest => f.write_str("digest"),
            Self::Collision(round) => write!(f, "round {round}"),
        }
    }
}

/// Summary of a finished phase
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RoundReport {
    /// Which phase this describes
    pub phase: Phase,
    /// Entries stored in the phase's output table
    pub entries: usize,
    /// Entries dropped because their bucket was full
    pub overflow: u64,
    /// Wall time spent in the phase
    pub elapsed: Duration,
    /// Bucket occupancy histogram of the output table.
    ///
    /// Entry `c` counts the buckets holding exactly `c` entries, for `c`
    /// from zero up to the bucket depth.
    pub occupancy: Vec<u64>,
}

impl RoundReport {
    /// Fewest and most entries held by any one bucket
    pub fn occupancy_range(&self) -> Option<(usize, usize)> {
        let mut used = self
            .occupancy
            .iter()
            .enumerate()
            .filter(|(_, buckets)| **buckets > 0)
            .map(|(count, _)| count);
        let min = used.next()?;
        Some((min, used.last().unwrap_or(min)))
    }
}

/// Hook called by the solver around each phase
///
/// Both methods default to doing nothing. They run on the thread that called
/// the solver, outside of any parallel work.
pub trait RoundObserver: Send + Sync {
    /// A phase is about to start.
    fn phase_start(&self, _phase: Phase) {}

    /// A phase has finished and its output table is complete.
    fn phase_end(&self, _report: &RoundReport) {}
}

/// Observer which ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {}

/// Shared flag asking a solver run to stop
///
/// Clones share the same flag. The solver only looks at it between phases,
/// so a run stops after finishing the phase in progress.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token which has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run using this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
