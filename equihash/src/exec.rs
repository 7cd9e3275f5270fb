//! Execution contexts for the data-parallel phases
//!
//! The solver never spawns threads itself. Each phase is handed to an
//! [`Executor`] as a range of independent work units, and the executor
//! returns only after every unit has finished. That return is the barrier
//! between phases.

use crate::err::Error;
use rayon::prelude::*;
use std::fmt;

/// Runs a batch of independent work units
pub trait Executor: fmt::Debug + Send + Sync {
    /// Call `work` once for every value in `0..count`, in any order and
    /// from any thread, returning after all calls have completed.
    fn for_each(&self, count: usize, work: &(dyn Fn(usize) + Sync));
}

/// Runs every unit on the calling thread, in order
///
/// Runs with this executor are fully reproducible, including which entries
/// are dropped when buckets overflow.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl Executor for Sequential {
    fn for_each(&self, count: usize, work: &(dyn Fn(usize) + Sync)) {
        (0..count).for_each(work);
    }
}

/// Spreads units across a dedicated `rayon` thread pool
///
/// Units race for bucket slots, so when a bucket overflows the surviving
/// entries may differ from run to run. Without overflow the solutions found
/// are the same as with [`Sequential`].
#[derive(Debug)]
pub struct ThreadPoolExecutor {
    /// Worker threads
    pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
    /// Start a pool with `threads` workers, or one per CPU if `None`.
    pub fn new(threads: Option<usize>) -> Result<Self, Error> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("equihash-worker-{index}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        Ok(Self {
            pool: builder.build()?,
        })
    }

    /// Number of worker threads in the pool
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for ThreadPoolExecutor {
    fn for_each(&self, count: usize, work: &(dyn Fn(usize) + Sync)) {
        self.pool
            .install(|| (0..count).into_par_iter().for_each(|unit| work(unit)));
    }
}

/// Option for selecting the solver's execution context
#[derive(
    Default, Debug, Copy, Clone, Eq, PartialEq, Hash, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[non_exhaustive]
pub enum RuntimeOption {
    /// Run every phase on the calling thread.
    Sequential,
    /// Run phases on a `rayon` thread pool.
    /// (This is the default)
    #[default]
    Parallel,
}
