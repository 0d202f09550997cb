//! Encryption & decryption.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use tracing::trace;

use crate::cipher::Cipher;
use crate::encoding::{decode, encode};
use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::params::EncodingParams;

/// `g^m mod n²` for `g = n + 1`, which collapses to `1 + m·n mod n²`.
pub(crate) fn plaintext_term(pubkey: &PublicKey, m: &BigUint) -> BigUint {
    (BigUint::one() + (m % &pubkey.n) * &pubkey.n) % &pubkey.n_squared
}

/// Encrypts `m ∈ [0, n)` as `g^m · r^n mod n²` with fresh randomness `r`.
pub fn encrypt<R: RngCore + CryptoRng + ?Sized>(
    pubkey: &PublicKey,
    m: &BigUint,
    rng: &mut R,
) -> Result<Cipher> {
    if m >= &pubkey.n {
        return Err(Error::InvalidArgument(format!(
            "{}-bit plaintext is not below the {}-bit modulus",
            m.bits(),
            pubkey.bits
        )));
    }
    let r = loop {
        let r = rng.gen_biguint_range(&BigUint::one(), &pubkey.n);
        if r.gcd(&pubkey.n).is_one() {
            break r;
        }
    };
    let blind = r.modpow(&pubkey.n, &pubkey.n_squared);
    let c = (plaintext_term(pubkey, m) * blind) % &pubkey.n_squared;
    trace!(bits = pubkey.bits, "encrypted plaintext");
    Ok(Cipher { c })
}

/// Recovers `m = L(c^λ mod n²) · μ mod n`, with `L(u) = (u - 1) / n`.
pub fn decrypt(prvkey: &PrivateKey, ct: &Cipher) -> Result<BigUint> {
    let pubkey = prvkey.public_key();
    ct.check(pubkey)?;
    let u = ct.c.modpow(&prvkey.lambda, &pubkey.n_squared);
    if u.is_zero() {
        return Err(Error::KeyMismatch);
    }
    let l = (u - BigUint::one()) / &pubkey.n;
    Ok((l * &prvkey.mu) % &pubkey.n)
}

/// Encodes `x` at `depth` and encrypts the resulting ring element.
pub fn encode_and_encrypt<R: RngCore + CryptoRng + ?Sized>(
    pubkey: &PublicKey,
    x: f64,
    depth: u32,
    params: &EncodingParams,
    rng: &mut R,
) -> Result<Cipher> {
    params.check_key(pubkey)?;
    let m = encode(x, depth, params)?;
    encrypt(pubkey, &m, rng)
}

/// Decrypts `ct` and decodes the plaintext at `depth`.
pub fn decrypt_and_decode(
    prvkey: &PrivateKey,
    ct: &Cipher,
    depth: u32,
    params: &EncodingParams,
) -> Result<f64> {
    let m = decrypt(prvkey, ct)?;
    decode(&m, depth, params)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::keys::keygen_with_rng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 512-bit key pair shared by the tests of this crate.
    pub(crate) fn test_keys() -> &'static (PublicKey, PrivateKey) {
        static KEYS: OnceLock<(PublicKey, PrivateKey)> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(0x5eed);
            keygen_with_rng(512, &mut rng).expect("key generation")
        })
    }

    #[test]
    fn test_encrypt_decrypt_integers() {
        let (pk, sk) = test_keys();
        let mut rng = StdRng::seed_from_u64(11);
        for m in [0u64, 1, 42, u64::MAX] {
            let m = BigUint::from(m);
            let ct = encrypt(pk, &m, &mut rng).unwrap();
            assert!(pk.contains(&ct.c));
            assert_eq!(decrypt(sk, &ct).unwrap(), m);
        }
        let top = &pk.n - 1u32;
        let ct = encrypt(pk, &top, &mut rng).unwrap();
        assert_eq!(decrypt(sk, &ct).unwrap(), top);
    }

    #[test]
    fn test_encryption_is_probabilistic() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(12);
        let m = BigUint::from(9u32);
        let a = encrypt(pk, &m, &mut rng).unwrap();
        let b = encrypt(pk, &m, &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_plaintext_out_of_range() {
        let (pk, _) = test_keys();
        let mut rng = StdRng::seed_from_u64(13);
        assert!(matches!(
            encrypt(pk, &pk.n, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_seed_decrypts_to_zero() {
        let (_, sk) = test_keys();
        assert!(decrypt(sk, &Cipher::zero()).unwrap().is_zero());
    }

    #[test]
    fn test_decrypt_rejects_foreign_ciphertext() {
        let (pk, sk) = test_keys();
        let outside = Cipher {
            c: pk.n_squared.clone(),
        };
        assert_eq!(decrypt(sk, &outside), Err(Error::KeyMismatch));
    }

    #[test]
    fn test_encode_and_encrypt_round_trip() {
        let (pk, sk) = test_keys();
        let params = EncodingParams::default();
        let mut rng = StdRng::seed_from_u64(14);
        for x in [0.0, 1.5, -1.5, 123.456] {
            let ct = encode_and_encrypt(pk, x, 0, &params, &mut rng).unwrap();
            let back = decrypt_and_decode(sk, &ct, 0, &params).unwrap();
            assert!((back - x).abs() <= 2f64.powi(-32));
        }
    }

    #[test]
    fn test_encode_and_encrypt_rejects_small_key() {
        let mut rng = StdRng::seed_from_u64(15);
        let (small, _) = keygen_with_rng(128, &mut rng).unwrap();
        let params = EncodingParams::default();
        assert!(matches!(
            encode_and_encrypt(&small, 1.0, 0, &params, &mut rng),
            Err(Error::InvalidArgument(_))
        ));
    }
}
