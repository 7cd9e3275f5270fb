//! Table entries and the back-references that record their provenance
//!
//! An entry never carries its leaf indices. A digest phase entry names its
//! candidate index, and a round entry names the two slots of the previous
//! layer it was merged from. Every entry is the same size whatever round
//! produced it; index lists are rebuilt by walking the links back through
//! each layer, and only for entries that turn out to be solutions.

use crate::bits::BitString;
use crate::params::MAX_DEPTH;

/// Bits used for each slot field of a packed [`Link`]
const SLOT_BITS: usize = MAX_DEPTH.trailing_zeros() as usize;

/// Two slots of one bucket in the previous layer
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Location {
    /// Bucket holding both parents
    pub(crate) bucket: usize,
    /// Slot of the first parent
    pub(crate) left: usize,
    /// Slot of the second parent
    pub(crate) right: usize,
}

impl Location {
    /// True if both locations use the same parent slot.
    ///
    /// Two such entries have a leaf index in common, so merging them can
    /// never lead to a solution.
    #[inline(always)]
    pub(crate) fn shares_parent(&self, other: &Self) -> bool {
        self.bucket == other.bucket
            && (self.left == other.left
                || self.left == other.right
                || self.right == other.left
                || self.right == other.right)
    }
}

/// Packed provenance of one entry
///
/// Holds either a candidate index, for digest phase entries, or a
/// [`Location`] bitfield. Which one is known from the layer the entry
/// lives in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Link(u64);

impl Link {
    /// Link to a single candidate.
    #[inline(always)]
    pub(crate) fn leaf(index: u32) -> Self {
        Self(u64::from(index))
    }

    /// Pack a [`Location`] into a bitfield.
    ///
    /// Panics if a slot doesn't fit in [`MAX_DEPTH`] or the bucket doesn't
    /// fit in the remaining bits.
    #[inline(always)]
    pub(crate) fn pack(loc: &Location) -> Self {
        assert!(loc.left < MAX_DEPTH && loc.right < MAX_DEPTH);
        assert!((loc.bucket as u64) >> (u64::BITS as usize - 2 * SLOT_BITS) == 0);
        let bucket = (loc.bucket as u64) << (2 * SLOT_BITS);
        let left = (loc.left as u64) << SLOT_BITS;
        let right = loc.right as u64;
        Self(bucket | left | right)
    }

    /// Candidate index of a digest phase link
    #[inline(always)]
    pub(crate) fn index(self) -> u32 {
        u32::try_from(self.0).expect("leaf links hold a 32-bit index")
    }

    /// Unpack a round link into its [`Location`].
    #[inline(always)]
    pub(crate) fn unpack(self) -> Location {
        let slot_mask = (1u64 << SLOT_BITS) - 1;
        Location {
            bucket: (self.0 >> (2 * SLOT_BITS)) as usize,
            left: ((self.0 >> SLOT_BITS) & slot_mask) as usize,
            right: (self.0 & slot_mask) as usize,
        }
    }
}

/// One partial result of the search
///
/// `bits` is the XOR of the digests of every leaf below `link`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Entry {
    /// Accumulated XOR of the leaf digests
    bits: BitString,
    /// Where this entry came from
    link: Link,
}

impl Entry {
    /// A digest phase entry for a single candidate.
    pub(crate) fn leaf(bits: BitString, index: u32) -> Self {
        Self {
            bits,
            link: Link::leaf(index),
        }
    }

    /// A round entry merged from the two slots at `loc`.
    pub(crate) fn pair(bits: BitString, loc: &Location) -> Self {
        Self {
            bits,
            link: Link::pack(loc),
        }
    }

    /// Accumulated XOR
    #[inline(always)]
    pub(crate) fn bits(&self) -> &BitString {
        &self.bits
    }

    /// Provenance in the previous layer
    #[inline(always)]
    pub(crate) fn link(&self) -> Link {
        self.link
    }
}
