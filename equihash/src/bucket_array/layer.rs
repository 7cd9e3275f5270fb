//! Back-references kept after a table is reused

use super::entry::Link;
use super::table::BucketTable;

/// The links of one finished table, laid out slot for slot
///
/// The solver only has two tables, so each one is overwritten two phases
/// after it was filled. Its links are copied out first, since later
/// layers still point into it.
#[derive(Debug)]
pub(crate) struct LinkLayer {
    /// Slots per bucket
    depth: usize,
    /// Bucket `b` owns `links[b * depth..(b + 1) * depth]`
    links: Box<[Link]>,
}

impl LinkLayer {
    /// Allocate room for the links of a `num_buckets` by `depth` table.
    pub(crate) fn new(num_buckets: usize, depth: usize) -> Self {
        Self {
            depth,
            links: vec![Link::leaf(0); num_buckets * depth].into_boxed_slice(),
        }
    }

    /// Copy the links of every stored entry of `table`.
    ///
    /// Slots past each bucket's count keep whatever they held before; no
    /// stored link points at them.
    pub(crate) fn capture(&mut self, table: &BucketTable) {
        assert_eq!(table.depth(), self.depth);
        assert_eq!(table.num_buckets() * self.depth, self.links.len());
        for bucket in 0..table.num_buckets() {
            let start = bucket * self.depth;
            for (slot, entry) in table.entries(bucket).enumerate() {
                self.links[start + slot] = entry.link();
            }
        }
    }

    /// Link of the entry that was stored at `slot` of `bucket`.
    #[inline(always)]
    pub(crate) fn get(&self, bucket: usize, slot: usize) -> Link {
        self.links[bucket * self.depth + slot]
    }

    /// Bytes of link storage
    pub(crate) fn size(&self) -> usize {
        self.links.len() * std::mem::size_of::<Link>()
    }
}
