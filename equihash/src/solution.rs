//! Representation and validation of Equihash solutions
//!
//! A solution is a list of `2^k` candidate indices forming the leaves of a
//! binary tree. At merge level `r` the two sibling subtrees' digests XOR to
//! zero on window `r`, and the XOR of all leaves is zero. Siblings are
//! ordered so the subtree with the smaller first index comes first, which
//! makes the index order of a solution unique.

use crate::bits::{BitString, MaskShift};
use crate::digest::DigestEngine;
use crate::err::VerifyError;
use crate::observe::RoundReport;
use crate::params::Params;
use std::ops::Deref;

/// A list of candidate indices in canonical tree order
///
/// Holding a `Solution` guarantees the list is well formed for its
/// parameters: the right length, in range, tree ordered, and free of
/// duplicates. It does not guarantee the XOR conditions for any particular
/// header; that is checked by [`crate::Equihash::verify`].
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Solution {
    /// Leaf indices, left to right
    indices: Vec<u32>,
}

impl Solution {
    /// Check the structure of an index list and wrap it.
    pub fn try_from_indices(params: &Params, indices: &[u32]) -> Result<Self, VerifyError> {
        let expected = params.solution_len();
        if indices.len() != expected {
            return Err(VerifyError::WrongLength {
                expected,
                actual: indices.len(),
            });
        }
        let candidates = params.num_candidates();
        if let Some(index) = indices.iter().find(|i| u64::from(**i) >= candidates) {
            return Err(VerifyError::IndexOutOfRange(*index));
        }
        if !check_tree_order(indices) {
            return Err(VerifyError::OutOfOrder);
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(VerifyError::DuplicateIndices);
        }
        Ok(Self {
            indices: indices.to_vec(),
        })
    }

    /// Wrap an index list the solver built in tree order.
    pub(crate) fn from_tree(indices: &[u32]) -> Self {
        debug_assert!(check_tree_order(indices));
        Self {
            indices: indices.to_vec(),
        }
    }

    /// Leaf indices in tree order
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl AsRef<[u32]> for Solution {
    fn as_ref(&self) -> &[u32] {
        &self.indices
    }
}

impl From<Solution> for Vec<u32> {
    fn from(solution: Solution) -> Vec<u32> {
        solution.indices
    }
}

/// Everything returned by one solver run
///
/// Solutions are sorted and free of duplicates. A non-zero overflow count
/// means some entries were dropped from full buckets, so solutions may have
/// been missed; the ones returned are still valid.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SolutionSet {
    /// Solutions found, sorted
    solutions: Vec<Solution>,
    /// Total entries dropped across every phase
    overflow: u64,
    /// One report per completed phase
    reports: Vec<RoundReport>,
}

impl SolutionSet {
    /// Assemble a run result, sorting and deduplicating `solutions`.
    pub(crate) fn new(mut solutions: Vec<Solution>, reports: Vec<RoundReport>) -> Self {
        solutions.sort_unstable();
        solutions.dedup();
        Self {
            solutions,
            overflow: reports.iter().map(|report| report.overflow).sum(),
            reports,
        }
    }

    /// Solutions found
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Entries dropped from full buckets over the whole run
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// True if no bucket overflowed, so no solution can have been missed.
    pub fn is_complete(&self) -> bool {
        self.overflow == 0
    }

    /// Per-phase reports, digest phase first
    pub fn reports(&self) -> &[RoundReport] {
        &self.reports
    }
}

impl Deref for SolutionSet {
    type Target = [Solution];

    fn deref(&self) -> &[Solution] {
        &self.solutions
    }
}

impl IntoIterator for SolutionSet {
    type Item = Solution;
    type IntoIter = std::vec::IntoIter<Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.into_iter()
    }
}

impl<'a> IntoIterator for &'a SolutionSet {
    type Item = &'a Solution;
    type IntoIter = std::slice::Iter<'a, Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}

/// Check tree ordering recursively.
///
/// At every node the left subtree must start with a smaller index than the
/// right subtree.
fn check_tree_order(indices: &[u32]) -> bool {
    if indices.len() < 2 {
        return true;
    }
    let (left, right) = indices.split_at(indices.len() / 2);
    left[0] < right[0] && check_tree_order(left) && check_tree_order(right)
}

/// Check the XOR conditions of a well formed solution.
///
/// `windows` is the table from [`Params::windows`] for the engine's
/// parameters.
pub(crate) fn check_tree_xor(
    engine: &DigestEngine,
    windows: &[MaskShift],
    solution: &Solution,
) -> Result<(), VerifyError> {
    if tree_xor(engine, windows, solution.indices())?.is_zero() {
        Ok(())
    } else {
        Err(VerifyError::NonZeroRoot)
    }
}

/// XOR of a subtree's digests, checking the window of every merge on the way.
///
/// A subtree of `2^(r+1)` leaves merges at level `r` and must be zero on
/// window `r`. Lower windows are already zero in both children.
fn tree_xor(
    engine: &DigestEngine,
    windows: &[MaskShift],
    indices: &[u32],
) -> Result<BitString, VerifyError> {
    if let [index] = indices {
        return Ok(engine.digest(*index));
    }
    let (left, right) = indices.split_at(indices.len() / 2);
    let bits = tree_xor(engine, windows, left)? ^ tree_xor(engine, windows, right)?;
    let round = indices.len().trailing_zeros() as usize - 1;
    if windows[round].extract(&bits) != 0 {
        return Err(VerifyError::Collision { round });
    }
    Ok(bits)
}
