//! # Protocol Configuration & Constants
//!
//! Every tunable of a TRIAD session lives here: the round count λ, the
//! acceptable error rate ε, and the TTP's registry of client secrets.
//!
//! The registry is deliberately a plain value that the caller constructs
//! and hands to the TTP at session start. There is no module-level state:
//! whoever owns the process (or the test fixture) owns the secrets, and
//! two concurrent sessions can carry two different registries without
//! stepping on each other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Capacity of the selector-string derivation in bits. HMAC-SHA256
/// produces a 256-bit digest, so λ cannot exceed this.
pub const MAX_LAMBDA: usize = 256;

/// Default session length when the caller does not specify one.
/// Matches the reference deployment's choice.
pub const DEFAULT_LAMBDA: usize = 20;

/// Default acceptable quantum bit error rate. Zero: on a noiseless
/// transport the honest path produces no errors at all, so anything
/// above zero is already suspicious.
pub const DEFAULT_EPSILON: f64 = 0.0;

/// Tag carried by per-round correction messages on the classical channel.
pub const CORRECTIONS_TAG: &str = "Corrections";

// ---------------------------------------------------------------------------
// SessionParams
// ---------------------------------------------------------------------------

/// The two knobs of a session: round count and error tolerance.
///
/// λ is a security parameter — the number of teleported rounds and thus
/// the length of the one-time key. ε is the QBER threshold the TTP
/// applies when deciding whether to authorize the settled transaction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Number of protocol rounds (and bits of session key). Positive,
    /// at most [`MAX_LAMBDA`].
    pub lambda: usize,
    /// Acceptable error rate over basis-matched rounds, in `[0, 1]`.
    pub epsilon: f64,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SessionParams {
    /// Construct validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidLength`] when `lambda` is zero or
    /// exceeds the derivation capacity, or [`ProtocolError::MalformedMessage`]
    /// when `epsilon` falls outside `[0, 1]` (or is NaN).
    pub fn new(lambda: usize, epsilon: f64) -> Result<Self, ProtocolError> {
        if lambda == 0 || lambda > MAX_LAMBDA {
            return Err(ProtocolError::InvalidLength {
                requested: lambda,
                max: MAX_LAMBDA,
            });
        }
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ProtocolError::MalformedMessage(format!(
                "epsilon must lie in [0, 1], got {}",
                epsilon
            )));
        }
        Ok(Self { lambda, epsilon })
    }
}

// ---------------------------------------------------------------------------
// SecretRegistry
// ---------------------------------------------------------------------------

/// The TTP's mapping from public client identifiers to long-term shared
/// secrets.
///
/// Immutable for the lifetime of a session. The secrets never leave the
/// TTP and the client that owns them; merchants see only public IDs.
#[derive(Clone, Debug, Default)]
pub struct SecretRegistry {
    secrets: HashMap<String, Vec<u8>>,
}

impl SecretRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client's shared secret, replacing any previous entry
    /// for the same ID.
    pub fn register(&mut self, client_id: impl Into<String>, secret: impl Into<Vec<u8>>) {
        self.secrets.insert(client_id.into(), secret.into());
    }

    /// Look up the secret for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownClient`] when no secret is
    /// registered under that ID.
    pub fn lookup(&self, client_id: &str) -> Result<&[u8], ProtocolError> {
        self.secrets
            .get(client_id)
            .map(Vec::as_slice)
            .ok_or_else(|| ProtocolError::UnknownClient(client_id.to_string()))
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// True when no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_validate_lambda_bounds() {
        assert!(SessionParams::new(0, 0.0).is_err());
        assert!(SessionParams::new(MAX_LAMBDA + 1, 0.0).is_err());
        assert!(SessionParams::new(1, 0.0).is_ok());
        assert!(SessionParams::new(MAX_LAMBDA, 0.0).is_ok());
    }

    #[test]
    fn params_validate_epsilon_range() {
        assert!(SessionParams::new(8, -0.01).is_err());
        assert!(SessionParams::new(8, 1.01).is_err());
        assert!(SessionParams::new(8, f64::NAN).is_err());
        assert!(SessionParams::new(8, 1.0).is_ok());
    }

    #[test]
    fn registry_lookup_hit_and_miss() {
        let mut registry = SecretRegistry::new();
        registry.register("AdamMickiewicz44", *b"\xde\xad\xbe\xef");
        assert_eq!(
            registry.lookup("AdamMickiewicz44").unwrap(),
            b"\xde\xad\xbe\xef"
        );
        let miss = registry.lookup("nobody");
        assert!(matches!(miss, Err(ProtocolError::UnknownClient(id)) if id == "nobody"));
    }
}
