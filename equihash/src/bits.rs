//! Fixed width bit strings and collision window extraction
//!
//! Every digest is kept in a [`BitString`] of four 64-bit words. Only the
//! first `n` bits (counting from the most significant bit of word 0) carry
//! digest data; the rest stay zero so whole-word XOR never disturbs them.
//!
//! A [`MaskShift`] describes one collision window as a mask and a signed
//! shift per word. Windows which straddle two words become two masked
//! fragments, shifted so they land next to each other in the low bits of
//! the result.

use std::ops::{BitXor, BitXorAssign};

/// Number of 64-bit words in a [`BitString`]
pub(crate) const WORDS: usize = 4;

/// A 256-bit string, stored as big-endian words
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct BitString([u64; WORDS]);

impl BitString {
    /// Capacity in bits
    pub const BITS: usize = 64 * WORDS;

    /// The all-zero bit string
    pub const ZERO: Self = Self([0; WORDS]);

    /// Build a bit string from its words, word 0 first.
    pub fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    /// Load up to 32 bytes, most significant first.
    ///
    /// Missing trailing bytes are zero. Panics if `bytes` is longer than the
    /// bit string.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() <= Self::BITS / 8);
        let mut padded = [0u8; Self::BITS / 8];
        padded[..bytes.len()].copy_from_slice(bytes);
        let mut words = [0u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(padded.chunks_exact(8)) {
            *word = u64::from_be_bytes(chunk.try_into().expect("chunks are 8 bytes"));
        }
        Self(words)
    }

    /// The packed bytes, most significant first.
    pub fn to_be_bytes(&self) -> [u8; Self::BITS / 8] {
        let mut bytes = [0u8; Self::BITS / 8];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Inner words, word 0 first
    pub fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    /// True if every bit is clear.
    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }
}

impl BitXor for BitString {
    type Output = Self;

    #[inline(always)]
    fn bitxor(mut self, rhs: Self) -> Self {
        self ^= rhs;
        self
    }
}

impl BitXorAssign for BitString {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        for (word, other) in self.0.iter_mut().zip(rhs.0) {
            *word ^= other;
        }
    }
}

/// Selects one collision window of a [`BitString`] as a bucket index
///
/// For each word, `mask` picks the bits that belong to the window and
/// `shift` moves them into place: positive values shift right, negative
/// values shift left.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct MaskShift {
    /// Per-word window bits
    mask: [u64; WORDS],
    /// Per-word normalization shift
    shift: [i32; WORDS],
}

impl MaskShift {
    /// Describe the window of `width` bits starting `start` bits from the
    /// most significant end.
    ///
    /// Panics unless `0 < width < 64` and the window fits in a [`BitString`].
    pub fn for_bits(start: usize, width: usize) -> Self {
        assert!(width > 0 && width < 64);
        assert!(start + width <= BitString::BITS);

        let mut mask = [0u64; WORDS];
        let mut shift = [0i32; WORDS];
        let first = start / 64;
        let last = (start + width - 1) / 64;
        let offset = start % 64;

        if first == last {
            let right = 64 - offset - width;
            mask[first] = low_bits(width) << right;
            shift[first] = right as i32;
        } else {
            // Tail of the first word becomes the high part of the index,
            // head of the next word fills in the low part.
            let high = 64 - offset;
            let low = width - high;
            mask[first] = low_bits(high);
            shift[first] = -(low as i32);
            mask[last] = low_bits(low) << (64 - low);
            shift[last] = (64 - low) as i32;
        }
        Self { mask, shift }
    }

    /// Per-word masks
    pub fn mask(&self) -> &[u64; WORDS] {
        &self.mask
    }

    /// Per-word shifts, positive meaning right
    pub fn shift(&self) -> &[i32; WORDS] {
        &self.shift
    }

    /// Extract this window from a bit string.
    #[inline(always)]
    pub fn extract(&self, bits: &BitString) -> usize {
        let mut value = 0u64;
        for ((word, mask), shift) in bits.0.iter().zip(&self.mask).zip(&self.shift) {
            let masked = word & mask;
            value |= if *shift >= 0 {
                masked >> shift
            } else {
                masked << -shift
            };
        }
        value as usize
    }
}

/// A word with the low `count` bits set, for `count < 64`
#[inline(always)]
fn low_bits(count: usize) -> u64 {
    (1u64 << count) - 1
}

#[cfg(test)]
mod test {
    use super::{BitString, MaskShift};
    use crate::Params;
    use proptest::prelude::*;

    /// Read `width` bits starting at `start` one bit at a time.
    fn naive_window(bits: &BitString, start: usize, width: usize) -> usize {
        let bytes = bits.to_be_bytes();
        (start..start + width).fold(0, |acc, pos| {
            let bit = (bytes[pos / 8] >> (7 - pos % 8)) & 1;
            (acc << 1) | bit as usize
        })
    }

    #[test]
    fn zcash_window_table() {
        // The hand written table for n = 200, k = 9 covered only the first
        // six windows; the derived table has to agree with all of them.
        let masks: [[u64; 2]; 6] = [
            [0xfffff00000000000, 0],
            [0x00000fffff000000, 0],
            [0x0000000000fffff0, 0],
            [0x000000000000000f, 0xffff000000000000],
            [0, 0x0000fffff0000000],
            [0, 0x000000000fffff00],
        ];
        let shifts: [[i32; 2]; 6] = [[44, 0], [24, 0], [4, 0], [-16, 48], [0, 28], [0, 8]];

        let windows = Params::default().windows();
        for (round, window) in windows.iter().take(6).enumerate() {
            assert_eq!(window.mask()[..2], masks[round], "round {round}");
            assert_eq!(window.shift()[..2], shifts[round], "round {round}");
            assert_eq!(window.mask()[2..], [0u64, 0]);
        }

        // The last window straddles words 2 and 3 and ends at bit 200
        assert_eq!(windows[9].mask(), &[0, 0, 0xfff, 0xff00000000000000]);
        assert_eq!(windows[9].shift(), &[0, 0, -8, 56]);
    }

    #[test]
    fn byte_layout() {
        let bits = BitString::from_be_bytes(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0xff]);
        assert_eq!(bits.words(), &[0x123456789abcdef0, 0xff00000000000000, 0, 0]);
        assert_eq!(MaskShift::for_bits(0, 12).extract(&bits), 0x123);
        assert_eq!(MaskShift::for_bits(60, 8).extract(&bits), 0x0f);
        assert_eq!(&bits.to_be_bytes()[..9], &[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0xff]);
    }

    #[test]
    fn xor_to_zero() {
        let a = BitString::from_words([1, 2, 3, 4]);
        let b = BitString::from_words([1, 2, 3, 5]);
        assert!(!(a ^ b).is_zero());
        assert!((a ^ a).is_zero());
        assert_eq!(a ^ b, BitString::from_words([0, 0, 0, 1]));
        assert_eq!(BitString::default(), BitString::ZERO);
    }

    proptest! {
        #[test]
        fn extract_matches_bitwise(
            words in any::<[u64; 4]>(),
            start in 0usize..256,
            width in 1usize..32,
        ) {
            prop_assume!(start + width <= BitString::BITS);
            let bits = BitString::from_words(words);
            let window = MaskShift::for_bits(start, width);
            prop_assert_eq!(window.extract(&bits), naive_window(&bits, start, width));
            prop_assert!(window.extract(&bits) < 1 << width);
        }
    }
}
