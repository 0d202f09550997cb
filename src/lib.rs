//! Secure aggregation over Paillier ― zero-sum aggregation keys, fixed-point
//! encoding with depth tracking, and the homomorphic operation set.
//!
//! Participants encrypt under one public key, mask with their aggregation key
//! for the current round, and an aggregator multiplies the ciphertexts
//! together. The masks cancel; only the holder of the private key can read
//! the resulting sum.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, missing_docs)]

pub mod error;
pub mod params;
pub mod keys;
pub mod cipher;
pub mod scheme;
pub mod encoding;
pub mod agg_keys;
pub mod algebra;
pub mod wire;

pub use agg_keys::AggregationKey;
pub use algebra::PaillierAlgebra;
pub use cipher::Cipher;
pub use error::{Error, Result};
pub use keys::{keygen, keygen_with_rng, PrivateKey, PublicKey};
pub use params::EncodingParams;
pub use scheme::{decrypt, decrypt_and_decode, encode_and_encrypt, encrypt};
pub use wire::WireFormat;
