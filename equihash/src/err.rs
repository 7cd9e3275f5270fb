//! Error types for the `equihash` crate

use std::sync::Arc;

/// Errors applicable to configuring, running, and verifying Equihash searches
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The block header could not be decoded.
    ///
    /// Raised before any hashing happens; nothing has been computed.
    #[error("malformed block header: {0}")]
    Format(#[from] FormatError),

    /// The `(n, k)` parameters or the bucket depth are unusable.
    #[error("invalid Equihash parameters: {0}")]
    Parameter(#[from] ParameterError),

    /// A candidate solution failed verification.
    #[error("invalid Equihash solution: {0}")]
    Verify(#[from] VerifyError),

    /// The worker thread pool for [`crate::RuntimeOption::Parallel`]
    /// could not be started.
    #[error("failed to start solver thread pool: {0}")]
    ThreadPool(#[source] Arc<rayon::ThreadPoolBuildError>),

    /// The run was stopped through its [`crate::CancelToken`].
    ///
    /// Cancellation is only observed between phases, so `completed` counts
    /// whole phases (the digest phase plus finished collision rounds).
    #[error("solver cancelled after {completed} of {total} phases")]
    Cancelled {
        /// Phases which ran to completion
        completed: usize,
        /// Phases the run would have executed
        total: usize,
    },
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(Arc::new(err))
    }
}

/// Problems with a hex encoded block header
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    /// Hex input has an odd number of digits.
    #[error("header must be an even number of hex digits, got {0}")]
    OddLength(usize),

    /// Decoded header is not exactly [`crate::HEADER_LEN`] bytes.
    #[error("header must be a {expected}-byte full header, got {0} bytes", expected = crate::HEADER_LEN)]
    WrongLength(usize),

    /// Input contains something other than hex digits.
    #[error("invalid hex character {character:?} at offset {offset}")]
    InvalidHex {
        /// The offending character
        character: char,
        /// Its position in the input string
        offset: usize,
    },

    /// The reserved nonce tail of the header is not zero.
    #[error(
        "last {tail} bytes of the header must be zero, found a non-zero byte at offset {0}",
        tail = crate::NONCE_TAIL_LEN
    )]
    NonZeroNonceTail(usize),
}

/// Reasons an `(n, k, depth)` configuration is rejected
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ParameterError {
    /// `n` or `k` is zero.
    #[error("n and k must both be positive (n = {n}, k = {k})")]
    Zero {
        /// Bit string width
        n: u32,
        /// Round count
        k: u32,
    },

    /// `n` is not a whole number of bytes.
    #[error("n = {0} is not a multiple of 8")]
    NotByteAligned(u32),

    /// `n` can't be split into `k + 1` equal collision windows.
    #[error("n = {n} is not divisible by k + 1 = {}", .k + 1)]
    Indivisible {
        /// Bit string width
        n: u32,
        /// Round count
        k: u32,
    },

    /// `n` exceeds the width of [`crate::BitString`].
    #[error("n = {0} is wider than the {max}-bit bit string", max = crate::BitString::BITS)]
    TooWide(u32),

    /// Candidate indices would not fit in 32 bits.
    #[error("collision window of {0} bits needs candidate indices wider than 32 bits")]
    IndexOverflow(u32),

    /// There are fewer candidates than indices in one solution.
    #[error("k = {k} needs 2^{k} distinct indices but only {candidates} candidates exist")]
    TooManyRounds {
        /// Round count
        k: u32,
        /// Number of candidate indices
        candidates: u64,
    },

    /// Buckets with no capacity can't hold anything.
    #[error("bucket depth must be at least 1")]
    ZeroDepth,

    /// Slot numbers wouldn't fit in an entry's back-references.
    #[error("bucket depth {0} is above the maximum of {max}", max = crate::MAX_DEPTH)]
    DepthTooLarge(usize),
}

/// Reasons a candidate solution is rejected by [`crate::Equihash::verify`]
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum VerifyError {
    /// The solution doesn't hold exactly `2^k` indices.
    #[error("expected {expected} indices, got {actual}")]
    WrongLength {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// An index lies outside the candidate range.
    #[error("index {0} is outside the candidate range")]
    IndexOutOfRange(u32),

    /// Sibling subtrees are not in canonical order.
    #[error("index tree incorrectly ordered")]
    OutOfOrder,

    /// The same index appears twice.
    #[error("duplicate indices")]
    DuplicateIndices,

    /// Two sibling subtrees don't collide on their round's window.
    #[error("sibling subtrees do not collide on the window of round {round}")]
    Collision {
        /// Round whose window was non-zero
        round: usize,
    },

    /// All windows collided but the full XOR isn't zero.
    #[error("root of the index tree does not XOR to zero")]
    NonZeroRoot,
}
