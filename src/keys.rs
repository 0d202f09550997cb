//! Paillier key material.
//!
//! `keygen` produces a public modulus `n` and the matching private
//! `(λ, μ)` with the simplified generator `g = n + 1`.

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_prime::nt_funcs::is_prime;
use num_prime::PrimalityTestConfig;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Smallest modulus size accepted by `keygen`.
pub const MIN_KEY_BITS: u64 = 16;

/// Public key: `n`, `n²`, `g = n + 1` and the bit-length of `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub n_squared: BigUint,
    pub g: BigUint,
    pub bits: u64,
}

impl PublicKey {
    /// Rebuilds every derived field from the modulus alone.
    pub fn from_modulus(n: BigUint) -> Result<Self> {
        if n <= BigUint::one() || n.is_even() {
            return Err(Error::InvalidArgument(
                "Paillier modulus must be an odd integer greater than one".into(),
            ));
        }
        let n_squared = &n * &n;
        let g = &n + BigUint::one();
        let bits = n.bits();
        Ok(Self {
            n,
            n_squared,
            g,
            bits,
        })
    }

    /// `true` when `c` is a residue in `[0, n²)`.
    pub fn contains(&self, c: &BigUint) -> bool {
        c < &self.n_squared
    }
}

/// Private key: `λ = (p-1)(q-1)` and `μ = λ⁻¹ mod n`. Wiped on drop.
pub struct PrivateKey {
    pub(crate) lambda: BigUint,
    pub(crate) mu: BigUint,
    pub(crate) pubkey: PublicKey,
}

impl PrivateKey {
    /// Public half this key decrypts for.
    pub fn public_key(&self) -> &PublicKey {
        &self.pubkey
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.pubkey.bits)
            .finish_non_exhaustive()
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        wipe(&mut self.lambda);
        wipe(&mut self.mu);
    }
}

/// Overwrites every limb of `v` in place with ones, then sets it to zero.
///
/// `assign_from_slice` refills the existing digit buffer without
/// reallocating, so the secret limbs are gone before the memory is freed.
pub(crate) fn wipe(v: &mut BigUint) {
    let limbs = usize::try_from(v.bits().div_ceil(32)).unwrap_or(0);
    if limbs > 0 {
        v.assign_from_slice(&vec![u32::MAX; limbs]);
        std::hint::black_box(&*v);
    }
    v.set_zero();
}

/// Generates a `bits`-bit Paillier key pair from OS entropy.
pub fn keygen(bits: u64) -> Result<(PublicKey, PrivateKey)> {
    keygen_with_rng(bits, &mut OsRng)
}

/// Same as [`keygen`] with an explicit cryptographic generator.
#[instrument(level = "info", skip(rng))]
pub fn keygen_with_rng<R: RngCore + CryptoRng + ?Sized>(
    bits: u64,
    rng: &mut R,
) -> Result<(PublicKey, PrivateKey)> {
    if bits < MIN_KEY_BITS || bits % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "Paillier modulus size must be an even number of bits >= {MIN_KEY_BITS}, got {bits}"
        )));
    }
    let half = bits / 2;
    let mut p = gen_prime(half, rng);
    let mut q = loop {
        let q = gen_prime(half, rng);
        if q != p {
            break q;
        }
    };

    let n = &p * &q;
    let lambda = (&p - BigUint::one()) * (&q - BigUint::one());
    let mu = lambda.modinv(&n);
    wipe(&mut p);
    wipe(&mut q);
    let mu = mu.ok_or_else(|| Error::InvalidArgument("λ is not invertible modulo n".into()))?;
    let pubkey = PublicKey::from_modulus(n)?;
    debug!(bits = pubkey.bits, "generated Paillier key pair");

    Ok((
        pubkey.clone(),
        PrivateKey {
            lambda,
            mu,
            pubkey,
        },
    ))
}

/// Random prime of exactly `bits` bits with its two top bits set, so the
/// product of two such primes has exactly `2 * bits` bits.
fn gen_prime<R: RngCore + CryptoRng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    let top = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));
    let mut tries = 0u32;
    loop {
        tries += 1;
        let cand = rng.gen_biguint(bits) | &top | BigUint::one();
        if is_prime(&cand, Some(PrimalityTestConfig::default())).probably() {
            debug!(bits, tries, "found prime");
            return cand;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_keygen_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let (pk, sk) = keygen_with_rng(128, &mut rng).unwrap();
        assert_eq!(pk.bits, 128);
        assert_eq!(pk.n.bits(), 128);
        assert_eq!(pk.n_squared, &pk.n * &pk.n);
        assert_eq!(pk.g, &pk.n + 1u32);
        assert_eq!(sk.public_key(), &pk);
        // λ·μ ≡ 1 (mod n)
        assert_eq!((&sk.lambda * &sk.mu) % &pk.n, BigUint::one());
    }

    #[test]
    fn test_keygen_rejects_bad_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(keygen_with_rng(0, &mut rng), Err(Error::InvalidArgument(_))));
        assert!(matches!(keygen_with_rng(8, &mut rng), Err(Error::InvalidArgument(_))));
        assert!(matches!(keygen_with_rng(129, &mut rng), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_from_modulus_rederives_fields() {
        let mut rng = StdRng::seed_from_u64(3);
        let (pk, _) = keygen_with_rng(64, &mut rng).unwrap();
        let rebuilt = PublicKey::from_modulus(pk.n.clone()).unwrap();
        assert_eq!(rebuilt, pk);
        assert!(PublicKey::from_modulus(BigUint::from(10u32)).is_err());
        assert!(PublicKey::from_modulus(BigUint::one()).is_err());
    }

    #[test]
    fn test_wipe_clears_value() {
        let mut v = (BigUint::one() << 200u32) + 12345u32;
        wipe(&mut v);
        assert!(v.is_zero());

        let mut zero = BigUint::zero();
        wipe(&mut zero);
        assert!(zero.is_zero());
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let mut rng = StdRng::seed_from_u64(5);
        let (_, sk) = keygen_with_rng(64, &mut rng).unwrap();
        let shown = format!("{sk:?}");
        assert!(!shown.contains("lambda"));
        assert!(!shown.contains(&sk.mu.to_string()));
    }
}
