//! # BitString
//!
//! The protocol's working currency: ordered sequences of classical bits.
//! Round records, selector strings, and session keys are all bit-strings
//! of length λ, and the classical wire format carries them as plain
//! `'0'`/`'1'` text. This module gives them one owned type instead of
//! letting `Vec<u8>`, `String`, and `&[bool]` fight it out at every
//! call site.
//!
//! Internally each bit occupies one byte holding exactly `0` or `1`.
//! λ is tens of bits, not millions — clarity wins over packing.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// An ordered sequence of bits, each stored as `0u8` or `1u8`.
///
/// `Display` and `FromStr` use the wire form: one ASCII `'0'` or `'1'`
/// per bit, most significant (round 0) first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString(Vec<u8>);

impl BitString {
    /// Create an empty bit-string with room for `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Sample `len` independent uniform bits from `rng`.
    ///
    /// Used by the TTP to draw the per-session round records (`bit[]` and
    /// `basis[]`). Each session samples fresh strings; nothing is reused.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        Self((0..len).map(|_| u8::from(rng.gen::<bool>())).collect())
    }

    /// Build from raw 0/1 values. Panics in debug builds if a value is
    /// neither 0 nor 1; callers own that invariant.
    pub fn from_bits(bits: Vec<u8>) -> Self {
        debug_assert!(bits.iter().all(|&b| b <= 1));
        Self(bits)
    }

    /// Append one bit.
    pub fn push(&mut self, bit: u8) {
        debug_assert!(bit <= 1);
        self.0.push(bit);
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the string holds no bits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the bits as `u8` values.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// The underlying slice of 0/1 bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Index<usize> for BitString {
    type Output = u8;

    fn index(&self, i: usize) -> &u8 {
        &self.0[i]
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

impl FromStr for BitString {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(0u8),
                '1' => Ok(1u8),
                other => Err(ProtocolError::MalformedMessage(format!(
                    "non-binary character '{}' in bit-string",
                    other
                ))),
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn display_and_parse_roundtrip() {
        let bits = BitString::from_bits(vec![0, 1, 1, 0, 1]);
        assert_eq!(bits.to_string(), "01101");
        let parsed: BitString = "01101".parse().unwrap();
        assert_eq!(parsed, bits);
    }

    #[test]
    fn parse_rejects_non_binary() {
        let result = "0120".parse::<BitString>();
        assert!(matches!(result, Err(ProtocolError::MalformedMessage(_))));
    }

    #[test]
    fn random_has_requested_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let bits = BitString::random(&mut rng, 64);
        assert_eq!(bits.len(), 64);
        assert!(bits.iter().all(|b| b <= 1));
    }

    #[test]
    fn empty_string_parses_empty() {
        let parsed: BitString = "".parse().unwrap();
        assert!(parsed.is_empty());
    }
}
