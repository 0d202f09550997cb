//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by key generation, encoding, homomorphic operations and
/// the wire codec. Nothing is clamped or truncated silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Zero participants, zero bit sizes, plaintext out of range, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `|x · 2^scale_bits|` does not fit the signed plaintext ring.
    #[error("encoding overflow: {value} at scale 2^{scale_bits} exceeds the {mod_bits}-bit plaintext ring")]
    EncodingOverflow {
        value: f64,
        scale_bits: u32,
        mod_bits: u32,
    },

    /// Wire string is empty or contains characters outside the radix alphabet.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Big-integer or key-set storage could not be reserved.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// The OS entropy source could not seed the generator.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// A ciphertext does not lie in `[0, n²)` of the key it is used with.
    #[error("ciphertext is not in [0, n^2) for this public key")]
    KeyMismatch,
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
