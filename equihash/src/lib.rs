#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![doc = include_str!("../README.md")]
// @@ begin lint list maintained by maint/add_warning @@
#![allow(renamed_and_removed_lints)] // @@REMOVE_WHEN(ci_arti_stable)
#![allow(unknown_lints)] // @@REMOVE_WHEN(ci_arti_nightly)
#![warn(missing_docs)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::cast_lossless)]
#![deny(clippy::checked_conversions)]
#![warn(clippy::cognitive_complexity)]
#![deny(clippy::debug_assert_with_mut_call)]
#![deny(clippy::expl_impl_clone_on_copy)]
#![deny(clippy::fallible_impl_from)]
#![deny(clippy::implicit_clone)]
#![deny(clippy::large_stack_arrays)]
#![warn(clippy::manual_ok_or)]
#![deny(clippy::missing_docs_in_private_items)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::option_option)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![warn(clippy::rc_buffer)]
#![deny(clippy::ref_option_ref)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::trait_duplication_in_bounds)]
#![deny(clippy::unchecked_duration_subtraction)]
#![deny(clippy::unnecessary_wraps)]
#![warn(clippy::unseparated_literal_suffix)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::mod_module_files)]
#![allow(clippy::let_unit_value)] // This can reasonably be done for explicitness
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_raw_string_hashes)] // complained-about code is fine, often best
//! <!-- @@ end lint list maintained by maint/add_warning @@ -->

mod bits;
mod bucket_array;
mod collision;
mod digest;
mod err;
mod exec;
mod header;
mod observe;
mod params;
mod solution;
mod solver;

use std::fmt;
use std::sync::Arc;

pub use bits::{BitString, MaskShift};
pub use digest::{DigestEngine, PERSONALIZATION_PREFIX};
pub use err::{Error, FormatError, ParameterError, VerifyError};
pub use exec::{Executor, RuntimeOption, Sequential, ThreadPoolExecutor};
pub use header::{Header, HEADER_LEN, NONCE_TAIL_LEN};
pub use observe::{CancelToken, NoopObserver, Phase, RoundObserver, RoundReport};
pub use params::{Params, DEFAULT_DEPTH, DEFAULT_K, DEFAULT_N, MAX_DEPTH};
pub use solution::{Solution, SolutionSet};
pub use solver::SolverMemory;

/// One configured Equihash solver and verifier
///
/// Holds validated parameters and the execution context chosen with
/// [`EquihashBuilder`]. Headers are supplied per call, so one instance can
/// serve any number of solve and verify requests.
#[derive(Clone)]
pub struct Equihash {
    /// Validated `(n, k)`
    params: Params,
    /// Slots per bucket
    depth: usize,
    /// Execution context for the parallel phases
    executor: Arc<dyn Executor>,
    /// Phase boundary hook
    observer: Arc<dyn RoundObserver>,
}

impl Equihash {
    /// Make a new [`Equihash`] instance for `(n, k)` with default options.
    pub fn new(n: u32, k: u32) -> Result<Self, Error> {
        EquihashBuilder::new().params(n, k).build()
    }

    /// Parameters this instance solves for
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of entry slots in each bucket
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Allocate solver memory suited to this instance.
    pub fn memory(&self) -> SolverMemory {
        SolverMemory::new(&self.params, self.depth)
    }

    /// Search for solutions to `header`.
    ///
    /// Memory for the solver is allocated dynamically and not reused.
    pub fn solve(&self, header: &Header) -> Result<SolutionSet, Error> {
        let mut mem = self.memory();
        self.solve_with_memory(header, &mut mem)
    }

    /// Search for solutions, using the provided [`SolverMemory`].
    ///
    /// Allows reuse of solver memory, which is preferred for callers that
    /// solve many headers in a row.
    pub fn solve_with_memory(
        &self,
        header: &Header,
        mem: &mut SolverMemory,
    ) -> Result<SolutionSet, Error> {
        solver::find_solutions(&self.context(None), header, mem)
    }

    /// Search for solutions, stopping early if `cancel` fires.
    ///
    /// The token is checked before each phase. A cancelled run returns
    /// [`Error::Cancelled`] and leaves `mem` ready for the next run.
    pub fn solve_cancellable(
        &self,
        header: &Header,
        mem: &mut SolverMemory,
        cancel: &CancelToken,
    ) -> Result<SolutionSet, Error> {
        solver::find_solutions(&self.context(Some(cancel)), header, mem)
    }

    /// Decode a hex header and search for solutions to it.
    ///
    /// Fails with [`Error::Format`] before doing any work if the header
    /// is malformed.
    pub fn solve_hex(&self, header: &str) -> Result<SolutionSet, Error> {
        self.solve(&Header::decode(header)?)
    }

    /// Check a list of indices against `header`.
    ///
    /// Returns either `Ok` or [`Error::Verify`] naming the first condition
    /// the indices fail.
    pub fn verify(&self, header: &Header, indices: &[u32]) -> Result<(), Error> {
        let solution = Solution::try_from_indices(&self.params, indices)?;
        self.verify_solution(header, &solution)
    }

    /// Check a well formed [`Solution`] against `header`.
    ///
    /// Having a [`Solution`] instance guarantees the length, range, order,
    /// and distinctness of its indices. This only checks the XOR conditions.
    pub fn verify_solution(&self, header: &Header, solution: &Solution) -> Result<(), Error> {
        if solution.indices().len() != self.params.solution_len() {
            return Err(VerifyError::WrongLength {
                expected: self.params.solution_len(),
                actual: solution.indices().len(),
            }
            .into());
        }
        let engine = DigestEngine::new(self.params, header);
        solution::check_tree_xor(&engine, &self.params.windows(), solution)?;
        Ok(())
    }

    /// Borrow this instance as a solver context.
    fn context<'a>(&'a self, cancel: Option<&'a CancelToken>) -> solver::SolverContext<'a> {
        solver::SolverContext {
            params: self.params,
            depth: self.depth,
            exec: self.executor.as_ref(),
            observer: self.observer.as_ref(),
            cancel,
        }
    }
}

impl fmt::Debug for Equihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equihash")
            .field("params", &self.params)
            .field("depth", &self.depth)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Builder for creating [`Equihash`] instances with custom settings
#[derive(Clone)]
pub struct EquihashBuilder {
    /// Requested bit string width
    n: u32,
    /// Requested round count
    k: u32,
    /// Requested bucket depth
    depth: usize,
    /// Built-in execution context, unless `executor` is set
    runtime: RuntimeOption,
    /// Worker count for [`RuntimeOption::Parallel`], or one per CPU
    threads: Option<usize>,
    /// Caller supplied execution context
    executor: Option<Arc<dyn Executor>>,
    /// Caller supplied phase hook
    observer: Option<Arc<dyn RoundObserver>>,
}

impl EquihashBuilder {
    /// Create a new [`EquihashBuilder`] with default settings.
    ///
    /// Immediately calling [`Self::build()`] gives the Zcash parameters
    /// `(200, 9)` with [`DEFAULT_DEPTH`] and a parallel runtime.
    pub fn new() -> Self {
        Self {
            n: DEFAULT_N,
            k: DEFAULT_K,
            depth: DEFAULT_DEPTH,
            runtime: RuntimeOption::default(),
            threads: None,
            executor: None,
            observer: None,
        }
    }

    /// Select the `(n, k)` parameters.
    pub fn params(&mut self, n: u32, k: u32) -> &mut Self {
        self.n = n;
        self.k = k;
        self
    }

    /// Select the number of entry slots per bucket.
    pub fn depth(&mut self, depth: usize) -> &mut Self {
        self.depth = depth;
        self
    }

    /// Select a new [`RuntimeOption`].
    pub fn runtime(&mut self, runtime: RuntimeOption) -> &mut Self {
        self.runtime = runtime;
        self
    }

    /// Select the worker count for [`RuntimeOption::Parallel`].
    pub fn threads(&mut self, threads: usize) -> &mut Self {
        self.threads = Some(threads);
        self
    }

    /// Use a custom [`Executor`], overriding the runtime option.
    pub fn executor(&mut self, executor: Arc<dyn Executor>) -> &mut Self {
        self.executor = Some(executor);
        self
    }

    /// Attach a [`RoundObserver`].
    pub fn observer(&mut self, observer: Arc<dyn RoundObserver>) -> &mut Self {
        self.observer = Some(observer);
        self
    }

    /// Validate the settings and build an [`Equihash`] instance.
    ///
    /// Fails with [`Error::Parameter`] on unusable parameters, or
    /// [`Error::ThreadPool`] if the worker pool can't start.
    pub fn build(&self) -> Result<Equihash, Error> {
        let params = Params::new(self.n, self.k)?;
        if self.depth == 0 {
            return Err(ParameterError::ZeroDepth.into());
        }
        if self.depth > MAX_DEPTH {
            return Err(ParameterError::DepthTooLarge(self.depth).into());
        }
        let executor: Arc<dyn Executor> = match (&self.executor, self.runtime) {
            (Some(executor), _) => executor.clone(),
            (None, RuntimeOption::Sequential) => Arc::new(Sequential),
            (None, RuntimeOption::Parallel) => Arc::new(ThreadPoolExecutor::new(self.threads)?),
        };
        let observer: Arc<dyn RoundObserver> = match &self.observer {
            Some(observer) => observer.clone(),
            None => Arc::new(NoopObserver),
        };
        Ok(Equihash {
            params,
            depth: self.depth,
            executor,
            observer,
        })
    }
}

impl Default for EquihashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EquihashBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquihashBuilder")
            .field("n", &self.n)
            .field("k", &self.k)
            .field("depth", &self.depth)
            .field("runtime", &self.runtime)
            .field("threads", &self.threads)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

/// Search for solutions to a hex encoded header, using default
/// [`EquihashBuilder`] options.
///
/// With the default Zcash parameters this allocates two tables of
/// `2^20 * DEFAULT_DEPTH` entries, plus nine layers of 8-byte links of the
/// same shape.
pub fn solve(header: &str) -> Result<SolutionSet, Error> {
    Equihash::new(DEFAULT_N, DEFAULT_K)?.solve_hex(header)
}

/// Check a list of indices against a hex encoded header under `(n, k)`.
///
/// Runs on the calling thread; verification hashes only `2^k` candidates.
pub fn verify(header: &str, n: u32, k: u32, indices: &[u32]) -> Result<(), Error> {
    let header = Header::decode(header)?;
    EquihashBuilder::new()
        .params(n, k)
        .runtime(RuntimeOption::Sequential)
        .build()?
        .verify(&header, indices)
}
