//! Personalized BLAKE2b digests of candidate indices
//!
//! Equihash hashes the block header once per group of candidates. With the
//! Zcash layout, the message is the full header followed by a little-endian
//! 32-bit group counter, and one BLAKE2b output is cut into `512 / n`
//! consecutive bit strings of `n / 8` bytes each.

use crate::bits::BitString;
use crate::header::Header;
use crate::params::Params;
use arrayvec::ArrayVec;

/// Protocol tag at the start of the BLAKE2b personalization
pub const PERSONALIZATION_PREFIX: &[u8; 8] = b"ZcashPoW";

/// Upper bound on bit strings cut from one hash, reached for `n = 8`
const MAX_GROUP: usize = 64;

/// Candidates produced by one BLAKE2b invocation, tagged with their index
pub(crate) type DigestGroup = ArrayVec<(u32, BitString), MAX_GROUP>;

/// Digest generator for one header and parameter set
///
/// Holds a BLAKE2b state that has already absorbed the header, so each
/// group only pays for the counter and finalization. The engine is never
/// mutated after construction and may be shared between threads.
#[derive(Debug, Clone)]
pub struct DigestEngine {
    /// Parameters selecting the output length and personalization
    params: Params,
    /// Personalized state with the header absorbed
    base: blake2b_simd::State,
}

impl DigestEngine {
    /// Prepare digests of `header` under `params`.
    pub fn new(params: Params, header: &Header) -> Self {
        let mut base = blake2b_simd::Params::new()
            .hash_length(params.hash_output())
            .personal(&personalization(&params))
            .to_state();
        base.update(header.as_bytes());
        Self { params, base }
    }

    /// Parameters this engine hashes for
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Full BLAKE2b output for one group counter.
    fn hash_group(&self, group: u32) -> blake2b_simd::Hash {
        let mut state = self.base.clone();
        state.update(&group.to_le_bytes());
        state.finalize()
    }

    /// Compute every candidate of one group.
    ///
    /// Candidates past the end of the index space are left out, which only
    /// happens in the last group when `512 / n` doesn't divide the
    /// candidate count.
    pub(crate) fn group(&self, group: u32) -> DigestGroup {
        let per_hash = self.params.indices_per_hash_output();
        let first = u64::from(group) * u64::from(per_hash);
        let end = self.params.num_candidates();
        let hash = self.hash_group(group);

        hash.as_bytes()
            .chunks_exact(self.params.bitstring_bytes())
            .zip(first..end)
            .map(|(chunk, index)| {
                let index = u32::try_from(index).expect("candidate indices fit in 32 bits");
                (index, BitString::from_be_bytes(chunk))
            })
            .collect()
    }

    /// Digest of a single candidate index.
    pub fn digest(&self, index: u32) -> BitString {
        let per_hash = self.params.indices_per_hash_output();
        let len = self.params.bitstring_bytes();
        let start = (index % per_hash) as usize * len;
        let hash = self.hash_group(index / per_hash);
        BitString::from_be_bytes(&hash.as_bytes()[start..start + len])
    }
}

/// The 16-byte personalization `"ZcashPoW" || le32(n) || le32(k)`
fn personalization(params: &Params) -> [u8; 16] {
    let mut personal = [0u8; 16];
    personal[..8].copy_from_slice(PERSONALIZATION_PREFIX);
    personal[8..12].copy_from_slice(&params.n().to_le_bytes());
    personal[12..].copy_from_slice(&params.k().to_le_bytes());
    personal
}
