//! Fixed-point encoding parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::PublicKey;

/// Default bit-length of the plaintext ring used by the codec.
pub const MOD_BITS: u32 = 128;
/// Default number of fractional bits per encoding level.
pub const FRAC_BITS: u32 = 32;
/// Extra bits the Paillier modulus must carry beyond a product of two
/// encodings, so that up to `2^32` terms can be summed without wrapping `n`.
pub const HEADROOM_BITS: u64 = 32;

/// `(mod_bits, frac_bits)` pair shared by every participant of a deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingParams {
    /// Bit-length of the plaintext ring `2^mod_bits`.
    pub mod_bits: u32,
    /// Fractional bits added per depth level.
    pub frac_bits: u32,
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            mod_bits: MOD_BITS,
            frac_bits: FRAC_BITS,
        }
    }
}

impl EncodingParams {
    pub fn new(mod_bits: u32, frac_bits: u32) -> Result<Self> {
        let params = Self { mod_bits, frac_bits };
        params.validate()?;
        Ok(params)
    }

    /// Rejects zero sizes and a fractional part that leaves no integer bits.
    pub fn validate(&self) -> Result<()> {
        if self.mod_bits == 0 || self.frac_bits == 0 {
            return Err(Error::InvalidArgument(format!(
                "bit sizes must be positive (mod_bits = {}, frac_bits = {})",
                self.mod_bits, self.frac_bits
            )));
        }
        if self.frac_bits >= self.mod_bits {
            return Err(Error::InvalidArgument(format!(
                "frac_bits ({}) must be smaller than mod_bits ({})",
                self.frac_bits, self.mod_bits
            )));
        }
        Ok(())
    }

    /// Power of two applied at `depth`: `frac_bits * (depth + 1)`.
    pub fn scale_bits(&self, depth: u32) -> Result<u32> {
        depth
            .checked_add(1)
            .and_then(|levels| levels.checked_mul(self.frac_bits))
            .ok_or_else(|| Error::InvalidArgument(format!("depth {depth} overflows the scale")))
    }

    /// Checks that `pubkey.n` is wide enough for one scalar product of two
    /// encodings plus summation headroom.
    pub fn check_key(&self, pubkey: &PublicKey) -> Result<()> {
        self.check_key_at_depth(pubkey, 1)
    }

    /// Checks that a plaintext at `depth` never wraps `n`.
    ///
    /// Every scalar product multiplies the integer by up to `2^mod_bits`
    /// (negative operands are ring complements), so a depth-`d` value is
    /// bounded by `2^((d + 1)·mod_bits)` before summation headroom.
    pub fn check_key_at_depth(&self, pubkey: &PublicKey, depth: u32) -> Result<()> {
        let needed = (u64::from(depth) + 1) * u64::from(self.mod_bits) + HEADROOM_BITS;
        if pubkey.n.bits() <= needed {
            return Err(Error::InvalidArgument(format!(
                "{}-bit Paillier modulus cannot carry {}-bit encodings at depth {} (needs > {} bits)",
                pubkey.n.bits(),
                self.mod_bits,
                depth,
                needed
            )));
        }
        Ok(())
    }
}
