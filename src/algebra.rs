//! Homomorphic add / scalar ops / round masking. Public key only.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use tracing::{instrument, trace};

use crate::agg_keys::AggregationKey;
use crate::cipher::Cipher;
use crate::encoding::encode;
use crate::error::{Error, Result};
use crate::keys::PublicKey;
use crate::params::EncodingParams;
use crate::scheme::plaintext_term;

const ROUND_MASK_DOMAIN: &[u8] = b"paillier-agg/round-mask";

/// Holds the public key & encoding parameters every operation needs.
#[derive(Clone, Copy, Debug)]
pub struct PaillierAlgebra<'a> {
    pubkey: &'a PublicKey,
    params: EncodingParams,
}

impl<'a> PaillierAlgebra<'a> {
    /// Fails when the parameters are invalid or `n` is too narrow for them.
    pub fn new(pubkey: &'a PublicKey, params: EncodingParams) -> Result<Self> {
        params.validate()?;
        params.check_key(pubkey)?;
        Ok(Self { pubkey, params })
    }

    pub fn public_key(&self) -> &'a PublicKey {
        self.pubkey
    }

    pub fn params(&self) -> &EncodingParams {
        &self.params
    }

    /// `a · b mod n²`, an encryption of the sum of both plaintexts.
    pub fn add_ciphertexts(&self, a: &Cipher, b: &Cipher) -> Result<Cipher> {
        a.check(self.pubkey)?;
        b.check(self.pubkey)?;
        Ok(Cipher {
            c: (&a.c * &b.c) % &self.pubkey.n_squared,
        })
    }

    /// Folds any number of ciphertexts, starting from the encryption of zero.
    pub fn sum_ciphertexts<'c, I>(&self, cts: I) -> Result<Cipher>
    where
        I: IntoIterator<Item = &'c Cipher>,
    {
        cts.into_iter()
            .try_fold(Cipher::zero(), |acc, ct| self.add_ciphertexts(&acc, ct))
    }

    /// Adds the plaintext `x`, encoded at the ciphertext's `depth`.
    pub fn add_scalar(&self, ct: &Cipher, x: f64, depth: u32) -> Result<Cipher> {
        let m = encode(x, depth, &self.params)?;
        self.add_plaintext(ct, &m)
    }

    /// Multiplies by `x`. `x` is encoded at depth 0, so a `depth`-`d`
    /// ciphertext comes back at depth `d + 1` and must be decoded there.
    /// Fails when the deeper plaintext could wrap the Paillier modulus.
    pub fn mult_scalar(&self, ct: &Cipher, x: f64, depth: u32) -> Result<Cipher> {
        ct.check(self.pubkey)?;
        let result_depth = depth
            .checked_add(1)
            .ok_or_else(|| Error::InvalidArgument(format!("depth {depth} cannot grow")))?;
        let scale_bits = self.params.scale_bits(result_depth)?;
        if scale_bits >= self.params.mod_bits {
            return Err(Error::EncodingOverflow {
                value: x,
                scale_bits,
                mod_bits: self.params.mod_bits,
            });
        }
        self.params.check_key_at_depth(self.pubkey, result_depth)?;
        let m = encode(x, 0, &self.params)?;
        trace!(depth, "scalar multiplication");
        Ok(Cipher {
            c: ct.c.modpow(&m, &self.pubkey.n_squared),
        })
    }

    /// Masks `ct` with this round's share of zero.
    ///
    /// The mask is `k · H(stamp) mod n²`. It is linear in `k`, so the masks of
    /// all participants for one `stamp` sum to zero and vanish from the
    /// aggregate, while a different `stamp` yields an unrelated mask.
    #[instrument(level = "debug", skip(self, ct, aggkey))]
    pub fn apply_round_mask(
        &self,
        ct: &Cipher,
        aggkey: &AggregationKey,
        stamp: u64,
    ) -> Result<Cipher> {
        let mask = (aggkey.value() * round_factor(self.pubkey, stamp)) % &self.pubkey.n_squared;
        self.add_plaintext(ct, &mask)
    }

    fn add_plaintext(&self, ct: &Cipher, m: &BigUint) -> Result<Cipher> {
        ct.check(self.pubkey)?;
        let term = plaintext_term(self.pubkey, m);
        Ok(Cipher {
            c: (&ct.c * term) % &self.pubkey.n_squared,
        })
    }
}

/// Public per-round scalar `H(stamp)`, bound to the modulus.
pub fn round_factor(pubkey: &PublicKey, stamp: u64) -> BigUint {
    let digest = Sha256::new()
        .chain_update(ROUND_MASK_DOMAIN)
        .chain_update(pubkey.n.to_bytes_be())
        .chain_update(stamp.to_be_bytes())
        .finalize();
    BigUint::from_bytes_be(&digest)
}
