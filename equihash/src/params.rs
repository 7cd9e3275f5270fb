//! Equihash `(n, k)` parameters and the table sizes derived from them

use crate::bits::{BitString, MaskShift};
use crate::err::ParameterError;

/// Default bit string width, as used by Zcash
pub const DEFAULT_N: u32 = 200;

/// Default number of collision rounds, as used by Zcash
pub const DEFAULT_K: u32 = 9;

/// Default number of entry slots in each bucket
pub const DEFAULT_DEPTH: usize = 12;

/// Largest supported number of entry slots in each bucket
pub const MAX_DEPTH: usize = 1 << 16;

/// Validated Equihash parameters
///
/// `n` is the number of digest bits that must XOR to zero and `k` is the
/// number of collision rounds. Each round consumes one window of
/// `n / (k + 1)` bits; the last window is checked when solutions are
/// extracted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Params {
    /// Bit string width
    n: u32,
    /// Round count
    k: u32,
}

impl Params {
    /// Check a pair of parameters, returning a [`ParameterError`] describing
    /// the first requirement they fail.
    ///
    /// We place the following requirements on the parameters:
    /// - n and k are positive.
    /// - n is a multiple of 8, so the digest has an exact byte length.
    /// - n fits in one [`BitString`].
    /// - n is a multiple of k + 1, so we have an integer collision bit length.
    /// - candidate indices, of which there are `2^(n/(k+1)+1)`, fit in a `u32`.
    /// - there are at least `2^k` candidates to build a solution from.
    pub fn new(n: u32, k: u32) -> Result<Self, ParameterError> {
        if n == 0 || k == 0 {
            return Err(ParameterError::Zero { n, k });
        }
        if n % 8 != 0 {
            return Err(ParameterError::NotByteAligned(n));
        }
        if n as usize > BitString::BITS {
            return Err(ParameterError::TooWide(n));
        }
        if k >= n || n % (k + 1) != 0 {
            return Err(ParameterError::Indivisible { n, k });
        }
        let window = n / (k + 1);
        if window + 1 > u32::BITS {
            return Err(ParameterError::IndexOverflow(window));
        }
        if k > window + 1 {
            return Err(ParameterError::TooManyRounds {
                k,
                candidates: 1u64 << (window + 1),
            });
        }
        Ok(Self { n, k })
    }

    /// Bit string width
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Number of collision rounds
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Width of each collision window, `n / (k + 1)`
    pub fn collision_bit_length(&self) -> usize {
        (self.n / (self.k + 1)) as usize
    }

    /// Number of buckets in each hash table, one per possible window value
    pub fn num_buckets(&self) -> usize {
        1 << self.collision_bit_length()
    }

    /// Number of candidate indices hashed in the digest phase.
    ///
    /// This oversamples the bucket count by a factor of two, which evens out
    /// bucket occupancy against the ideal uniform load.
    pub fn num_candidates(&self) -> u64 {
        1 << (self.collision_bit_length() + 1)
    }

    /// Number of indices in each solution, `2^k`
    pub fn solution_len(&self) -> usize {
        1 << self.k
    }

    /// How many bit strings are cut from one BLAKE2b output
    pub fn indices_per_hash_output(&self) -> u32 {
        512 / self.n
    }

    /// BLAKE2b output length in bytes
    pub fn hash_output(&self) -> usize {
        (self.indices_per_hash_output() * self.n / 8) as usize
    }

    /// Length in bytes of one bit string's digest slice
    pub fn bitstring_bytes(&self) -> usize {
        (self.n / 8) as usize
    }

    /// Number of BLAKE2b invocations needed to cover every candidate
    pub fn hash_groups(&self) -> u64 {
        self.num_candidates()
            .div_ceil(u64::from(self.indices_per_hash_output()))
    }

    /// Derive the [`MaskShift`] of every collision window.
    ///
    /// Returns `k + 1` entries. Entry `r` buckets the input of round `r`,
    /// and entry `k` buckets the output of the final round.
    pub fn windows(&self) -> Vec<MaskShift> {
        let width = self.collision_bit_length();
        (0..=self.k as usize)
            .map(|round| MaskShift::for_bits(round * width, width))
            .collect()
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            k: DEFAULT_K,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Params;
    use crate::err::ParameterError;

    #[test]
    fn zcash_sizes() {
        let p = Params::default();
        assert_eq!(p, Params::new(200, 9).unwrap());
        assert_eq!(p.collision_bit_length(), 20);
        assert_eq!(p.num_buckets(), 1 << 20);
        assert_eq!(p.num_candidates(), 1 << 21);
        assert_eq!(p.solution_len(), 512);
        assert_eq!(p.indices_per_hash_output(), 2);
        assert_eq!(p.hash_output(), 50);
        assert_eq!(p.bitstring_bytes(), 25);
        assert_eq!(p.hash_groups(), 1 << 20);
        assert_eq!(p.windows().len(), 10);
    }

    #[test]
    fn small_sizes() {
        let p = Params::new(48, 3).unwrap();
        assert_eq!(p.collision_bit_length(), 12);
        assert_eq!(p.indices_per_hash_output(), 10);
        assert_eq!(p.hash_output(), 60);
        // 8192 candidates don't divide evenly into groups of 10
        assert_eq!(p.hash_groups(), 820);
    }

    #[test]
    fn valid_params() {
        for (n, k) in [(200, 9), (144, 5), (96, 5), (48, 3), (24, 2), (128, 7)] {
            assert!(Params::new(n, k).is_ok(), "({n}, {k})");
        }
    }

    #[test]
    fn invalid_params() {
        assert_eq!(Params::new(0, 9), Err(ParameterError::Zero { n: 0, k: 9 }));
        assert_eq!(
            Params::new(200, 0),
            Err(ParameterError::Zero { n: 200, k: 0 })
        );
        assert_eq!(Params::new(20, 1), Err(ParameterError::NotByteAligned(20)));
        assert_eq!(Params::new(264, 10), Err(ParameterError::TooWide(264)));
        assert_eq!(
            Params::new(200, 8),
            Err(ParameterError::Indivisible { n: 200, k: 8 })
        );
        assert_eq!(Params::new(64, 1), Err(ParameterError::IndexOverflow(32)));
        assert_eq!(
            Params::new(16, 15),
            Err(ParameterError::TooManyRounds {
                k: 15,
                candidates: 4
            })
        );
    }
}
