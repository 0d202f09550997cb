//! Paillier ciphertext container.

use num_bigint::BigUint;
use num_traits::One;

use crate::error::{Error, Result};
use crate::keys::PublicKey;

/// A residue `c ∈ [0, n²)`. Depth is tracked by the caller, not stored here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cipher {
    pub c: BigUint,
}

impl Cipher {
    /// Trivial encryption of zero (`c = 1`), the seed for running sums.
    pub fn zero() -> Self {
        Self { c: BigUint::one() }
    }

    /// Wraps a raw residue after checking it belongs to `pubkey`'s ciphertext space.
    pub fn from_raw(pubkey: &PublicKey, c: BigUint) -> Result<Self> {
        let ct = Self { c };
        ct.check(pubkey)?;
        Ok(ct)
    }

    pub(crate) fn check(&self, pubkey: &PublicKey) -> Result<()> {
        if pubkey.contains(&self.c) {
            Ok(())
        } else {
            Err(Error::KeyMismatch)
        }
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::zero()
    }
}
