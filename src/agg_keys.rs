//! Aggregation keys: additive shares of zero modulo `n²`.
//!
//! A dealer holding only the public key draws `P - 1` uniform residues and
//! sets the last share to the negated sum, so `Σ k_i ≡ 0 (mod n²)`. Each
//! participant masks its ciphertexts with its own share; the masks cancel
//! once every participant's ciphertext has been combined.

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use tracing::{debug, instrument, trace};

use crate::error::{Error, Result};
use crate::keys::{wipe, PublicKey};

/// One participant's share `k ∈ [0, n²)`. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct AggregationKey {
    pub(crate) k: BigUint,
}

impl AggregationKey {
    pub fn from_raw(pubkey: &PublicKey, k: BigUint) -> Result<Self> {
        if !pubkey.contains(&k) {
            return Err(Error::InvalidArgument(
                "aggregation key must be below n²".into(),
            ));
        }
        Ok(Self { k })
    }

    pub fn value(&self) -> &BigUint {
        &self.k
    }
}

impl fmt::Debug for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationKey").finish_non_exhaustive()
    }
}

impl Drop for AggregationKey {
    fn drop(&mut self) {
        wipe(&mut self.k);
    }
}

/// Generates `participants` shares from a generator freshly seeded with OS entropy.
pub fn generate(pubkey: &PublicKey, participants: usize) -> Result<Vec<AggregationKey>> {
    let mut rng =
        StdRng::from_rng(OsRng).map_err(|e| Error::EntropyUnavailable(e.to_string()))?;
    generate_with_rng(pubkey, participants, &mut rng)
}

/// Generates `participants` shares summing to zero modulo `n²`.
///
/// The generator is borrowed mutably for the whole call, so concurrent
/// dealers can never draw from the same random state.
#[instrument(level = "info", skip(pubkey, rng), fields(bits = pubkey.bits))]
pub fn generate_with_rng<R: RngCore + CryptoRng + ?Sized>(
    pubkey: &PublicKey,
    participants: usize,
    rng: &mut R,
) -> Result<Vec<AggregationKey>> {
    if participants == 0 {
        return Err(Error::InvalidArgument(
            "at least one participant is required".into(),
        ));
    }
    let mut keys: Vec<AggregationKey> = Vec::new();
    keys.try_reserve_exact(participants)
        .map_err(|e| Error::AllocationFailure(format!("{participants} aggregation keys: {e}")))?;

    let mut rejected = 0u64;
    for _ in 1..participants {
        let (k, misses) = sample_below(&pubkey.n_squared, 2 * pubkey.bits, rng);
        rejected += misses;
        keys.push(AggregationKey { k });
    }
    let last = balancing_share(
        keys.iter().map(AggregationKey::value),
        &pubkey.n_squared,
    );
    keys.push(AggregationKey { k: last });

    debug!(participants, rejected, "generated aggregation keys");
    Ok(keys)
}

/// `true` when the shares sum to zero modulo `n²`.
pub fn sums_to_zero(pubkey: &PublicKey, keys: &[AggregationKey]) -> bool {
    let total: BigUint = keys.iter().map(AggregationKey::value).sum();
    (total % &pubkey.n_squared).is_zero()
}

/// Uniform draw from `[0, 2^bits)` repeated until it falls below `bound`.
/// Returns the value and the number of rejected draws.
fn sample_below<R: RngCore + CryptoRng + ?Sized>(
    bound: &BigUint,
    bits: u64,
    rng: &mut R,
) -> (BigUint, u64) {
    let mut misses = 0u64;
    loop {
        let k = rng.gen_biguint(bits);
        if &k < bound {
            return (k, misses);
        }
        misses += 1;
        trace!(misses, "rejected aggregation key sample");
    }
}

/// The share that makes `shares` sum to zero: `-Σ shares mod modulus`.
fn balancing_share<'a>(shares: impl Iterator<Item = &'a BigUint>, modulus: &BigUint) -> BigUint {
    let sum: BigUint = shares.sum::<BigUint>() % modulus;
    if sum.is_zero() {
        sum
    } else {
        modulus - sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::tests::test_keys;

    #[test]
    fn test_zero_sum_for_various_sizes() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(21);
        for participants in [1usize, 2, 5, 50] {
            let keys = generate_with_rng(pk, participants, &mut rng).unwrap();
            assert_eq!(keys.len(), participants);
            assert!(keys.iter().all(|k| pk.contains(k.value())));
            assert!(sums_to_zero(pk, &keys), "participants = {participants}");
        }
    }

    #[test]
    fn test_single_participant_gets_zero() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(22);
        let keys = generate_with_rng(pk, 1, &mut rng).unwrap();
        assert!(keys[0].value().is_zero());
    }

    #[test]
    fn test_zero_participants_rejected() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(23);
        assert!(matches!(
            generate_with_rng(pk, 0, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_os_entropy_generation() {
        let (pk, _) = test_keys();
        let a = generate(pk, 3).unwrap();
        let b = generate(pk, 3).unwrap();
        assert!(sums_to_zero(pk, &a));
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn test_sample_below_respects_bound() {
        let mut rng = StdRng::seed_from_u64(24);
        // 2^8 draws against a bound of 200 reject roughly a fifth of the time
        let bound = BigUint::from(200u32);
        for _ in 0..100 {
            let (k, _) = sample_below(&bound, 8, &mut rng);
            assert!(k < bound);
        }
    }

    #[test]
    fn test_balancing_share() {
        let m = BigUint::from(97u32);
        let shares = [BigUint::from(50u32), BigUint::from(60u32)];
        assert_eq!(balancing_share(shares.iter(), &m), BigUint::from(84u32));
        assert!(balancing_share(std::iter::empty(), &m).is_zero());
    }

    #[test]
    fn test_from_raw_range() {
        let (pk, _) = test_keys();
        assert!(AggregationKey::from_raw(pk, pk.n_squared.clone()).is_err());
        assert!(AggregationKey::from_raw(pk, BigUint::zero()).is_ok());
    }

    #[test]
    fn test_debug_hides_share() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(25);
        let keys = generate_with_rng(pk, 2, &mut rng).unwrap();
        let shown = format!("{:?}", keys[0]);
        assert!(!shown.contains(&keys[0].value().to_string()));
    }
}
