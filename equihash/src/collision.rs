//! One round of the collision search
//!
//! Entries which share a bucket agree on the round's collision window, so
//! the XOR of any two of them clears that window. Every such pair becomes
//! an entry of the next table, bucketed on the following window, with a
//! link back to the two slots it came from.

use crate::bits::MaskShift;
use crate::bucket_array::entry::{Entry, Location};
use crate::bucket_array::table::BucketTable;
use crate::exec::Executor;
use tracing::trace;

/// Pair up the entries of every bucket in `src`, inserting results into `dst`.
///
/// `current` is the window `src` was bucketed on and `next` the window used
/// to place results in `dst`. Buckets are independent units of work for
/// `exec`; within a bucket each unordered pair of distinct slots is visited
/// once. Returns when every insert into `dst` has completed.
///
/// From round 1 on, pairs merged from a common parent slot are skipped.
/// Overlap further down the tree isn't visible here and is caught when
/// solutions are rebuilt.
pub(crate) fn run_round(
    exec: &dyn Executor,
    src: &BucketTable,
    dst: &BucketTable,
    current: &MaskShift,
    next: &MaskShift,
    round: usize,
) {
    trace!(round, entries = src.len(), "pairing entries");
    let merged = round > 0;
    exec.for_each(src.num_buckets(), &|bucket| {
        search_bucket(src, dst, bucket, current, next, merged);
    });
}

/// Combine all pairs within one source bucket.
#[inline(always)]
fn search_bucket(
    src: &BucketTable,
    dst: &BucketTable,
    bucket: usize,
    current: &MaskShift,
    next: &MaskShift,
    merged: bool,
) {
    let count = src.count(bucket);
    for left in 0..count {
        let first = src.entry(bucket, left);
        for right in (left + 1)..count {
            let second = src.entry(bucket, right);
            if merged
                && first
                    .link()
                    .unpack()
                    .shares_parent(&second.link().unpack())
            {
                continue;
            }
            let bits = *first.bits() ^ *second.bits();
            debug_assert_eq!(current.extract(&bits), 0);
            let loc = Location {
                bucket,
                left,
                right,
            };
            let _ = dst.insert(next.extract(&bits), Entry::pair(bits, &loc));
        }
    }
}
