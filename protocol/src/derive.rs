//! # Selector-String Derivation
//!
//! The keyed pseudorandom bit-string at the heart of the protocol. Both
//! the Client (before any round, to pick measurement bases) and the TTP
//! (after settlement, to pick which rounds count) derive
//! `m = derive_selector(secret, merchant_identifier, λ)` independently;
//! the string itself never touches a channel.
//!
//! The construction is HMAC-SHA256 with the shared secret as key over the
//! merchant identifier, read out MSB-first and truncated to λ bits.
//! Conceptually: prepend a non-zero marker digit to the digest's hex
//! value so leading zero bits survive the integer round-trip, expand to
//! binary, drop the marker, keep the first λ bits. Working on the digest
//! bytes directly produces the identical string without the detour
//! through a bignum.
//!
//! ## The intentional weakness
//!
//! Truncating to small λ makes the derivation collide: for λ = 8 an
//! attacker needs ~2⁸ candidate identifiers to find an `id'` with
//! `derive(secret, id') == derive(secret, id)`. A merchant holding such
//! an identifier can rebind an authorized transaction to a different
//! merchant identity and the TTP's check will not notice. This module
//! exposes the search ([`find_colliding_identifier`]) precisely so the
//! gap stays visible and tested rather than latent.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::bits::BitString;
use crate::config::MAX_LAMBDA;
use crate::error::ProtocolError;

type HmacSha256 = Hmac<Sha256>;

/// Derive the selector string for `(secret, identifier)`, truncated to
/// `length` bits.
///
/// Deterministic: identical inputs always yield the identical string.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidLength`] when `length` exceeds the
/// 256-bit digest capacity.
pub fn derive_selector(
    secret: &[u8],
    identifier: &[u8],
    length: usize,
) -> Result<BitString, ProtocolError> {
    if length > MAX_LAMBDA {
        return Err(ProtocolError::InvalidLength {
            requested: length,
            max: MAX_LAMBDA,
        });
    }

    // HMAC accepts keys of any length; new_from_slice only fails for
    // variable-output MACs, which SHA-256 is not.
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ProtocolError::MalformedMessage(format!("hmac key setup: {}", e)))?;
    mac.update(identifier);
    let digest = mac.finalize().into_bytes();

    let mut bits = BitString::with_capacity(length);
    for i in 0..length {
        let byte = digest[i / 8];
        let bit = (byte >> (7 - (i % 8))) & 1;
        bits.push(bit);
    }
    Ok(bits)
}

/// Brute-force a distinct identifier whose selector string collides with
/// `target_identifier`'s under the same secret and length.
///
/// This is the dishonest merchant's oracle. Candidates are enumerated
/// deterministically (`forged-0`, `forged-1`, ...), so a found collision
/// is reproducible. Expected work is 2^length attempts; callers choose
/// `max_attempts` accordingly and get `None` when the budget runs out or
/// the length is out of range.
pub fn find_colliding_identifier(
    secret: &[u8],
    target_identifier: &[u8],
    length: usize,
    max_attempts: usize,
) -> Option<String> {
    let target = derive_selector(secret, target_identifier, length).ok()?;
    for n in 0..max_attempts {
        let candidate = format!("forged-{}", n);
        if candidate.as_bytes() == target_identifier {
            continue;
        }
        // Length was validated by the target derivation above.
        let derived = derive_selector(secret, candidate.as_bytes(), length).ok()?;
        if derived == target {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"\xde\xad\xbe\xef";
    const MERCHANT: &[u8] = b"BiedronkaSpZoo2137";

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_selector(SECRET, MERCHANT, 64).unwrap();
        let b = derive_selector(SECRET, MERCHANT, 64).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn truncation_is_a_prefix() {
        let long = derive_selector(SECRET, MERCHANT, 256).unwrap();
        let short = derive_selector(SECRET, MERCHANT, 20).unwrap();
        assert_eq!(short.as_slice(), &long.as_slice()[..20]);
    }

    #[test]
    fn distinct_identifiers_diverge() {
        // Avalanche in spirit: at full length, two identifiers differing
        // in one character must not collide (probability 2^-256).
        let a = derive_selector(SECRET, b"BiedronkaSpZoo2137", 256).unwrap();
        let b = derive_selector(SECRET, b"BiedronkaSpZoo2138", 256).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_secrets_diverge() {
        let a = derive_selector(b"\x00\x01", MERCHANT, 256).unwrap();
        let b = derive_selector(b"\x00\x02", MERCHANT, 256).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn over_capacity_length_rejected() {
        let result = derive_selector(SECRET, MERCHANT, 257);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidLength { requested: 257, max: 256 })
        ));
    }

    #[test]
    fn collision_search_finds_one_at_small_length() {
        // λ = 5: 32 possible selector strings, so 4096 deterministic
        // candidates find a collision with overwhelming probability.
        let forged = find_colliding_identifier(SECRET, MERCHANT, 5, 4096)
            .expect("collision within budget");
        assert_ne!(forged.as_bytes(), MERCHANT);
        let original = derive_selector(SECRET, MERCHANT, 5).unwrap();
        let colliding = derive_selector(SECRET, forged.as_bytes(), 5).unwrap();
        assert_eq!(original, colliding);
    }

    #[test]
    fn collision_search_respects_budget() {
        // A 256-bit collision will not appear in two attempts.
        assert_eq!(find_colliding_identifier(SECRET, MERCHANT, 256, 2), None);
    }
}
