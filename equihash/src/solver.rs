//! Find Equihash solutions.
//!
//! This is Wagner's generalized birthday search in bucketized form. The
//! digest phase fills the first table with every candidate, bucketed on
//! window 0. Each of the `k` collision rounds then pairs up entries within
//! a bucket of one table and rebuckets the results into the other. After
//! the last round, entries whose XOR is entirely zero are solutions.

use crate::bits::MaskShift;
use crate::bucket_array::entry::{Entry, Link};
use crate::bucket_array::layer::LinkLayer;
use crate::bucket_array::table::BucketTable;
use crate::collision;
use crate::digest::DigestEngine;
use crate::err::Error;
use crate::exec::Executor;
use crate::header::Header;
use crate::observe::{CancelToken, Phase, RoundObserver, RoundReport};
use crate::params::Params;
use crate::solution::{Solution, SolutionSet};
use std::time::Instant;
use tracing::{debug, info};

/// Everything a run needs besides its header and memory
pub(crate) struct SolverContext<'a> {
    /// Validated parameters
    pub(crate) params: Params,
    /// Slots per bucket
    pub(crate) depth: usize,
    /// Where the parallel phases run
    pub(crate) exec: &'a dyn Executor,
    /// Phase boundary hook
    pub(crate) observer: &'a dyn RoundObserver,
    /// Checked before each phase, if present
    pub(crate) cancel: Option<&'a CancelToken>,
}

impl SolverContext<'_> {
    /// Fail with [`Error::Cancelled`] if cancellation was requested.
    fn checkpoint(&self, completed: usize) -> Result<(), Error> {
        match self.cancel {
            Some(token) if token.is_cancelled() => {
                let total = self.params.k() as usize + 1;
                debug!(completed, total, "solver cancelled");
                Err(Error::Cancelled { completed, total })
            }
            _ => Ok(()),
        }
    }

    /// Run one phase between observer notifications, returning its report.
    fn phase<F: FnOnce()>(&self, phase: Phase, output: &BucketTable, run: F) -> RoundReport {
        self.observer.phase_start(phase);
        let start = Instant::now();
        run();
        let report = RoundReport {
            phase,
            entries: output.len(),
            overflow: output.overflow(),
            elapsed: start.elapsed(),
            occupancy: output.occupancy(),
        };
        if report.overflow > 0 {
            debug!(%phase, overflow = report.overflow, "buckets overflowed");
        }
        debug!(%phase, entries = report.entries, elapsed = ?report.elapsed, "phase complete");
        self.observer.phase_end(&report);
        report
    }
}

/// Search for solutions to one header.
///
/// Returns the solutions together with per-phase reports, or
/// [`Error::Cancelled`] if the context's token fires between phases.
pub(crate) fn find_solutions(
    ctx: &SolverContext<'_>,
    header: &Header,
    mem: &mut SolverMemory,
) -> Result<SolutionSet, Error> {
    let params = ctx.params;
    let k = params.k() as usize;
    let windows = params.windows();
    mem.prepare(&params, ctx.depth);
    let SolverMemory { tables, layers } = mem;
    let mut reports = Vec::with_capacity(k + 1);

    ctx.checkpoint(0)?;
    let engine = DigestEngine::new(params, header);
    reports.push(ctx.phase(Phase::Digest, &tables[0], || {
        fill_digests(ctx.exec, &engine, &tables[0], &windows[0]);
    }));
    layers[0].capture(&tables[0]);

    for round in 0..k {
        ctx.checkpoint(round + 1)?;
        let (src, dst) = round_tables(tables, round);
        dst.clear();
        let dst = &*dst;
        let (current, next) = (&windows[round], &windows[round + 1]);
        reports.push(ctx.phase(Phase::Collision(round), dst, || {
            collision::run_round(ctx.exec, src, dst, current, next, round);
        }));
        if let Some(layer) = layers.get_mut(round + 1) {
            layer.capture(dst);
        }
    }

    let solutions = extract_solutions(&tables[k % 2], layers, &params);
    let result = SolutionSet::new(solutions, reports);
    info!(
        n = params.n(),
        k = params.k(),
        solutions = result.solutions().len(),
        overflow = result.overflow(),
        "solve complete"
    );
    Ok(result)
}

/// Hash every candidate into `table`, bucketed on `window`.
fn fill_digests(
    exec: &dyn Executor,
    engine: &DigestEngine,
    table: &BucketTable,
    window: &MaskShift,
) {
    let groups = engine.params().hash_groups() as usize;
    exec.for_each(groups, &|group| {
        let group = u32::try_from(group).expect("hash groups fit in 32 bits");
        for (index, bits) in engine.group(group) {
            let _ = table.insert(window.extract(&bits), Entry::leaf(bits, index));
        }
    });
}

/// Collect the entries of the final table which are complete solutions.
///
/// A zero bit string has a zero final window, so only bucket 0 can hold
/// solutions. Index lists are rebuilt from `layers` for those entries
/// alone, and any list with a repeated index is dropped.
fn extract_solutions(
    table: &BucketTable,
    layers: &[LinkLayer],
    params: &Params,
) -> Vec<Solution> {
    table
        .entries(0)
        .filter(|entry| entry.bits().is_zero())
        .filter_map(|entry| {
            let mut indices = Vec::with_capacity(params.solution_len());
            collect_leaves(layers, entry.link(), &mut indices);
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            let distinct = sorted.windows(2).all(|pair| pair[0] != pair[1]);
            distinct.then(|| Solution::from_tree(&indices))
        })
        .collect()
}

/// Append the candidate indices below `link` to `out`, in tree order.
///
/// `layers` ends with the layer `link` points into. Of each pair of
/// subtrees, the one with the smaller first index goes first.
fn collect_leaves(layers: &[LinkLayer], link: Link, out: &mut Vec<u32>) {
    let Some((layer, below)) = layers.split_last() else {
        out.push(link.index());
        return;
    };
    let loc = link.unpack();
    let start = out.len();
    collect_leaves(below, layer.get(loc.bucket, loc.left), out);
    let mid = out.len();
    collect_leaves(below, layer.get(loc.bucket, loc.right), out);
    if out[mid] < out[start] {
        out[start..].rotate_left(mid - start);
    }
}

/// Source and destination tables of a round.
fn round_tables(
    tables: &mut [BucketTable; 2],
    round: usize,
) -> (&BucketTable, &mut BucketTable) {
    let [even, odd] = tables;
    if round % 2 == 0 {
        (&*even, odd)
    } else {
        (&*odd, even)
    }
}

/// Temporary memory used by the Equihash solver
///
/// Holds the two bucket tables the rounds alternate between, plus one
/// [`LinkLayer`] for every table a later round still points back into.
/// Every slot is a fixed size, so the total is set by `(n, k)` and the
/// depth alone. It is allocated by [`SolverMemory::new()`], and the solver
/// provides a [`crate::Equihash::solve_with_memory()`] interface for
/// reusing this memory between runs. Memory sized for different parameters
/// or depth is replaced on use.
#[derive(Debug)]
pub struct SolverMemory {
    /// Double buffer, indexed by round parity
    tables: [BucketTable; 2],
    /// Links of the digest table and of every round but the last
    layers: Vec<LinkLayer>,
}

impl SolverMemory {
    /// Allocate empty tables for `params` with `depth` slots per bucket.
    ///
    /// Panics if `depth` is zero or above [`crate::MAX_DEPTH`].
    pub fn new(params: &Params, depth: usize) -> Self {
        assert!(depth <= crate::MAX_DEPTH);
        let buckets = params.num_buckets();
        Self {
            tables: [BucketTable::new(buckets, depth), BucketTable::new(buckets, depth)],
            layers: (0..params.k())
                .map(|_| LinkLayer::new(buckets, depth))
                .collect(),
        }
    }

    /// Total entry slots in each of the two tables
    pub fn capacity(&self) -> usize {
        self.tables[0].num_buckets() * self.tables[0].depth()
    }

    /// Size of the solver memory, in bytes
    pub fn size(&self) -> usize {
        let tables: usize = self.tables.iter().map(BucketTable::size).sum();
        let layers: usize = self.layers.iter().map(LinkLayer::size).sum();
        tables + layers
    }

    /// Check whether these tables have the shape a run needs.
    fn fits(&self, params: &Params, depth: usize) -> bool {
        self.tables[0].num_buckets() == params.num_buckets()
            && self.tables[0].depth() == depth
            && self.layers.len() == params.k() as usize
    }

    /// Get empty tables of the right shape, reallocating if needed.
    fn prepare(&mut self, params: &Params, depth: usize) {
        if self.fits(params, depth) {
            for table in &mut self.tables {
                table.clear();
            }
        } else {
            debug!(
                buckets = params.num_buckets(),
                depth, "reallocating solver memory"
            );
            *self = Self::new(params, depth);
        }
    }
}
