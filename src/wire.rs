//! Text codec for keys & ciphertexts crossing a process boundary.
//!
//! Each value is the single big integer it wraps (`n`, the share `k`, or
//! `c`) written in base `SERIALISATION_RADIX` without prefix, sign or
//! separators. Framing belongs to the transport.

use std::fmt;

use num_bigint::BigUint;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::agg_keys::AggregationKey;
use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::keys::PublicKey;

/// Radix of every wire string (lower-case hex).
pub const SERIALISATION_RADIX: u32 = 16;

/// Bits carried by one wire digit.
const DIGIT_BITS: u32 = SERIALISATION_RADIX.trailing_zeros();

/// Hex digits per 64-bit limb.
const LIMB_DIGITS: usize = (u64::BITS / DIGIT_BITS) as usize;

// the limb-wise writer below formats with `{:x}`
const _: () = assert!(SERIALISATION_RADIX == 16);

/// Fixed-radix text form of a value carrying one big integer.
pub trait WireFormat: Sized {
    /// The integer that goes on the wire.
    fn wire_value(&self) -> &BigUint;

    /// Rebuilds the value from its integer.
    fn from_wire_value(v: BigUint) -> Result<Self>;

    /// Appends the encoding to a caller-owned buffer, limb by limb, without
    /// building an intermediate string.
    fn write_wire<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut limbs = self.wire_value().iter_u64_digits().rev();
        match limbs.next() {
            None => out.write_char('0'),
            Some(top) => {
                write!(out, "{top:x}")?;
                limbs.try_for_each(|limb| write!(out, "{limb:0width$x}", width = LIMB_DIGITS))
            }
        }
    }

    /// Exact number of characters `write_wire` emits, for sizing buffers.
    fn wire_len(&self) -> usize {
        let bits = self.wire_value().bits().max(1);
        usize::try_from(bits.div_ceil(u64::from(DIGIT_BITS))).unwrap_or(usize::MAX)
    }

    fn to_wire(&self) -> String {
        self.wire_value().to_str_radix(SERIALISATION_RADIX)
    }

    fn from_wire(s: &str) -> Result<Self> {
        Self::from_wire_value(parse_radix(s)?)
    }
}

/// Parses a non-empty string of radix digits; anything else is rejected
/// before a big integer is built.
fn parse_radix(s: &str) -> Result<BigUint> {
    if s.is_empty() {
        return Err(Error::MalformedEncoding("empty string".into()));
    }
    if let Some((pos, ch)) = s.char_indices().find(|(_, ch)| !ch.is_digit(SERIALISATION_RADIX)) {
        return Err(Error::MalformedEncoding(format!(
            "character {ch:?} at offset {pos} is not a base-{SERIALISATION_RADIX} digit"
        )));
    }
    BigUint::parse_bytes(s.as_bytes(), SERIALISATION_RADIX)
        .ok_or_else(|| Error::MalformedEncoding(format!("cannot parse {} digits", s.len())))
}

impl WireFormat for PublicKey {
    fn wire_value(&self) -> &BigUint {
        &self.n
    }

    fn from_wire_value(n: BigUint) -> Result<Self> {
        PublicKey::from_modulus(n).map_err(|e| Error::MalformedEncoding(e.to_string()))
    }
}

impl WireFormat for AggregationKey {
    fn wire_value(&self) -> &BigUint {
        self.value()
    }

    fn from_wire_value(k: BigUint) -> Result<Self> {
        Ok(AggregationKey { k })
    }
}

impl WireFormat for Cipher {
    fn wire_value(&self) -> &BigUint {
        &self.c
    }

    fn from_wire_value(c: BigUint) -> Result<Self> {
        Ok(Cipher { c })
    }
}

macro_rules! wire_serde {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_wire())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                <$ty>::from_wire(&s).map_err(de::Error::custom)
            }
        }
    )*};
}

wire_serde!(PublicKey, AggregationKey, Cipher);
