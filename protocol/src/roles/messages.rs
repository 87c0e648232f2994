//! # Classical Wire Messages
//!
//! Everything the three parties say to each other over the ordered,
//! reliable classical channels. Two shapes exist:
//!
//! - per-round correction messages (TTP → Client), tagged
//!   [`CORRECTIONS_TAG`](crate::config::CORRECTIONS_TAG) with a `"m1,m2"`
//!   payload;
//! - the transaction, pipe-delimited text that grows one field per hop:
//!   `ClientId|Key` leaving the Client, `ClientId|Key|MerchantId`
//!   leaving the Merchant.
//!
//! Parsing is strict; anything that does not match the shape is
//! [`ProtocolError::MalformedMessage`] and kills the session. There is no
//! protocol-level recovery from a garbled transaction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bits::BitString;
use crate::config::CORRECTIONS_TAG;
use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

/// Per-round teleportation corrections from the TTP's Bell measurement.
///
/// The round index is carried so the Client can detect ordering
/// violations instead of silently decoding round i with round j's
/// corrections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corrections {
    /// Round these corrections belong to.
    pub round: usize,
    /// Phase-flip correction bit.
    pub m1: u8,
    /// Bit-flip correction bit.
    pub m2: u8,
}

impl Corrections {
    /// The structured-message payload, `"m1,m2"`.
    pub fn payload(&self) -> String {
        format!("{},{}", self.m1, self.m2)
    }

    /// Parse a `"m1,m2"` payload received for `round`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedMessage`] when the payload is not two
    /// comma-separated bits.
    pub fn from_payload(round: usize, payload: &str) -> Result<Self, ProtocolError> {
        let malformed = || {
            ProtocolError::MalformedMessage(format!(
                "corrections payload must be 'm1,m2' with bit values, got '{}'",
                payload
            ))
        };
        let (m1, m2) = payload.split_once(',').ok_or_else(malformed)?;
        let parse_bit = |s: &str| match s.trim() {
            "0" => Ok(0u8),
            "1" => Ok(1u8),
            _ => Err(malformed()),
        };
        Ok(Self {
            round,
            m1: parse_bit(m1)?,
            m2: parse_bit(m2)?,
        })
    }
}

impl fmt::Display for Corrections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", CORRECTIONS_TAG, self.round, self.payload())
    }
}

impl FromStr for Corrections {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            ProtocolError::MalformedMessage(format!(
                "corrections message must be '{}[round]: m1,m2', got '{}'",
                CORRECTIONS_TAG, s
            ))
        };
        let rest = s.strip_prefix(CORRECTIONS_TAG).ok_or_else(malformed)?;
        let rest = rest.strip_prefix('[').ok_or_else(malformed)?;
        let (round, rest) = rest.split_once(']').ok_or_else(malformed)?;
        let round: usize = round.parse().map_err(|_| malformed())?;
        let payload = rest.strip_prefix(':').ok_or_else(malformed)?;
        Self::from_payload(round, payload.trim())
    }
}

// ---------------------------------------------------------------------------
// TransactionRequest (Client → Merchant)
// ---------------------------------------------------------------------------

/// The Client's half-built transaction: its public ID and the session key
/// it decoded. The Merchant completes it by appending an identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Public client identifier (the registry key on the TTP side).
    pub client_id: String,
    /// The λ decoded session-key bits.
    pub key: BitString,
}

impl fmt::Display for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.client_id, self.key)
    }
}

impl FromStr for TransactionRequest {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('|');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(client_id), Some(key), None) if !client_id.is_empty() => Ok(Self {
                client_id: client_id.to_string(),
                key: key.parse()?,
            }),
            _ => Err(ProtocolError::MalformedMessage(format!(
                "transaction request must be 'ClientId|Key', got '{}'",
                s
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionForward (Merchant → TTP)
// ---------------------------------------------------------------------------

/// The completed transaction as the TTP receives it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionForward {
    /// Public client identifier.
    pub client_id: String,
    /// Client-reported session key.
    pub key: BitString,
    /// The identifier the Merchant chose to append. An honest merchant
    /// appends its true identity; nothing in the protocol forces it to.
    pub merchant_id: String,
}

impl TransactionForward {
    /// Complete a request with a merchant identifier.
    pub fn from_request(request: TransactionRequest, merchant_id: String) -> Self {
        Self {
            client_id: request.client_id,
            key: request.key,
            merchant_id,
        }
    }
}

impl fmt::Display for TransactionForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.client_id, self.key, self.merchant_id)
    }
}

impl FromStr for TransactionForward {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('|');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(client_id), Some(key), Some(merchant_id), None)
                if !client_id.is_empty() && !merchant_id.is_empty() =>
            {
                Ok(Self {
                    client_id: client_id.to_string(),
                    key: key.parse()?,
                    merchant_id: merchant_id.to_string(),
                })
            }
            _ => Err(ProtocolError::MalformedMessage(format!(
                "forwarded transaction must be 'ClientId|Key|MerchantId', got '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrections_payload_roundtrip() {
        let c = Corrections { round: 3, m1: 1, m2: 0 };
        assert_eq!(c.payload(), "1,0");
        assert_eq!(Corrections::from_payload(3, "1,0").unwrap(), c);
    }

    #[test]
    fn corrections_reject_non_bits() {
        assert!(Corrections::from_payload(0, "2,0").is_err());
        assert!(Corrections::from_payload(0, "1").is_err());
        assert!(Corrections::from_payload(0, "a,b").is_err());
    }

    #[test]
    fn corrections_wire_roundtrip() {
        let c = Corrections { round: 12, m1: 0, m2: 1 };
        let wire = c.to_string();
        assert_eq!(wire, "Corrections[12]: 0,1");
        assert_eq!(wire.parse::<Corrections>().unwrap(), c);
    }

    #[test]
    fn corrections_reject_malformed_wire() {
        assert!("Fixups[0]: 1,0".parse::<Corrections>().is_err());
        assert!("Corrections: 1,0".parse::<Corrections>().is_err());
        assert!("Corrections[x]: 1,0".parse::<Corrections>().is_err());
        assert!("Corrections[0] 1,0".parse::<Corrections>().is_err());
        assert!("Corrections[0]: 1".parse::<Corrections>().is_err());
    }

    #[test]
    fn request_wire_roundtrip() {
        let request = TransactionRequest {
            client_id: "AdamMickiewicz44".to_string(),
            key: "01101".parse().unwrap(),
        };
        let wire = request.to_string();
        assert_eq!(wire, "AdamMickiewicz44|01101");
        assert_eq!(wire.parse::<TransactionRequest>().unwrap(), request);
    }

    #[test]
    fn forward_appends_one_field() {
        let request = TransactionRequest {
            client_id: "AdamMickiewicz44".to_string(),
            key: "01101".parse().unwrap(),
        };
        let forward =
            TransactionForward::from_request(request, "BiedronkaSpZoo2137".to_string());
        let wire = forward.to_string();
        assert_eq!(wire, "AdamMickiewicz44|01101|BiedronkaSpZoo2137");
        assert_eq!(wire.parse::<TransactionForward>().unwrap(), forward);
    }

    #[test]
    fn malformed_transactions_rejected() {
        assert!("justoneid".parse::<TransactionRequest>().is_err());
        assert!("a|b|c".parse::<TransactionRequest>().is_err());
        assert!("|0101".parse::<TransactionRequest>().is_err());
        assert!("a|0101".parse::<TransactionForward>().is_err());
        assert!("a|0101|m|extra".parse::<TransactionForward>().is_err());
        assert!("a|01x1|m".parse::<TransactionForward>().is_err());
    }
}
