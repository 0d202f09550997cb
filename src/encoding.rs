//! Fixed-point codec between `f64` and the plaintext ring `ℤ / 2^mod_bits`.
//!
//! A value encoded at depth `d` carries the scale `2^(frac_bits·(d+1))`.
//! Negative values use the ring complement, so the signed range is
//! `[-2^(mod_bits-1), 2^(mod_bits-1))`. One homomorphic product of a depth-`d`
//! ciphertext by a depth-0 scalar yields a depth-`d+1` value; the caller keeps
//! track of the depth and decodes with it.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::params::EncodingParams;

/// Encodes `x` at `depth` as a non-negative ring element `< 2^mod_bits`.
pub fn encode(x: f64, depth: u32, params: &EncodingParams) -> Result<BigUint> {
    params.validate()?;
    let scale_bits = params.scale_bits(depth)?;
    let overflow = || Error::EncodingOverflow {
        value: x,
        scale_bits,
        mod_bits: params.mod_bits,
    };

    if !x.is_finite() {
        return Err(overflow());
    }
    let scaled = ldexp(x, i64::from(scale_bits)).round();
    if !scaled.is_finite() {
        return Err(overflow());
    }
    let value = BigInt::from_f64(scaled).ok_or_else(overflow)?;

    let half = BigInt::one() << (params.mod_bits - 1);
    if value >= half || value < -&half {
        return Err(overflow());
    }

    let representative = if value.sign() == Sign::Minus {
        (BigInt::one() << params.mod_bits) + value
    } else {
        value
    };
    // non-negative by construction
    representative.to_biguint().ok_or_else(overflow)
}

/// Decodes a plaintext produced at `depth`.
///
/// The input is first reduced modulo `2^mod_bits`, so sums and scalar
/// products of encodings decrypted from a wider Paillier modulus decode
/// correctly. Decoding at a depth other than the one the value carries gives
/// a meaningless result.
pub fn decode(e: &BigUint, depth: u32, params: &EncodingParams) -> Result<f64> {
    params.validate()?;
    let scale_bits = params.scale_bits(depth)?;

    let modulus = BigUint::one() << params.mod_bits;
    let half = BigUint::one() << (params.mod_bits - 1);
    let residue = e % &modulus;
    let signed = if residue >= half {
        BigInt::from(residue) - BigInt::from(modulus)
    } else {
        BigInt::from(residue)
    };

    if signed.is_zero() {
        return Ok(0.0);
    }
    let value = signed.to_f64().ok_or_else(|| {
        Error::InvalidArgument(format!("{}-bit plaintext does not fit an f64", signed.bits()))
    })?;
    Ok(ldexp(value, -i64::from(scale_bits)))
}

/// `v · 2^exp`, split into steps so the power of two never overflows.
fn ldexp(mut v: f64, mut exp: i64) -> f64 {
    const STEP: i32 = 1000;
    while exp > i64::from(STEP) {
        v *= 2f64.powi(STEP);
        exp -= i64::from(STEP);
    }
    while exp < -i64::from(STEP) {
        v *= 2f64.powi(-STEP);
        exp += i64::from(STEP);
    }
    // |exp| <= STEP here
    v * 2f64.powi(exp as i32)
}
