//! # TTP Role
//!
//! The trusted third party drives the session: it samples the per-round
//! record, encodes and teleports λ states to the Client, and — once the
//! Merchant forwards the settled transaction — decides whether to
//! authorize it.
//!
//! Lifecycle: `Init → Encoding(0..λ) → AwaitingTransaction → Decided`.
//! The phases run in strict order inside [`TtpRole::run`]; the
//! per-round acknowledgement from the Client is what keeps the TTP from
//! racing ahead of the transport.

use std::str::FromStr;
use std::sync::Arc;

use rand::thread_rng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::authorize::{authorize, Verdict};
use crate::bits::BitString;
use crate::config::{SecretRegistry, SessionParams};
use crate::derive::derive_selector;
use crate::error::ProtocolError;
use crate::roles::messages::{Corrections, TransactionForward};
use crate::transport::{StateLabel, TransportAdapter};

/// The TTP's session state: parameters, the client-secret registry, and
/// the freshly sampled round record.
///
/// The round record (`bits`, `bases`) is drawn once at construction and
/// never mutated; a new session means a new `TtpRole`.
pub struct TtpRole {
    params: SessionParams,
    registry: SecretRegistry,
    bits: BitString,
    bases: BitString,
}

impl TtpRole {
    /// Create a TTP for one session, sampling `bit[]` and `basis[]`
    /// uniformly at random.
    pub fn new(params: SessionParams, registry: SecretRegistry) -> Self {
        let mut rng = thread_rng();
        let bits = BitString::random(&mut rng, params.lambda);
        let bases = BitString::random(&mut rng, params.lambda);
        Self::with_round_record(params, registry, bits, bases)
    }

    /// Create a TTP with a caller-chosen round record. Tests use this to
    /// pin down exact scenarios; `new` is the production path.
    pub fn with_round_record(
        params: SessionParams,
        registry: SecretRegistry,
        bits: BitString,
        bases: BitString,
    ) -> Self {
        debug_assert_eq!(bits.len(), params.lambda);
        debug_assert_eq!(bases.len(), params.lambda);
        Self {
            params,
            registry,
            bits,
            bases,
        }
    }

    /// The sampled payload bits (read-only; used by diagnostics).
    pub fn bits(&self) -> &BitString {
        &self.bits
    }

    /// The sampled encoding bases.
    pub fn bases(&self) -> &BitString {
        &self.bases
    }

    /// Drive the whole TTP side of a session.
    ///
    /// Encodes λ rounds over `transport`, sending each round's tagged
    /// correction message down `corrections_tx` and waiting for the
    /// Client's ack on `ack_rx` before the next round; then blocks on
    /// `settlement_rx` for the forwarded transaction and decides.
    ///
    /// # Errors
    ///
    /// Any [`ProtocolError`] is fatal: transport desync, a closed
    /// channel, malformed settlement text, or an unregistered client.
    pub async fn run(
        self,
        transport: Arc<dyn TransportAdapter>,
        corrections_tx: mpsc::Sender<String>,
        mut ack_rx: mpsc::Receiver<usize>,
        mut settlement_rx: mpsc::Receiver<String>,
    ) -> Result<Verdict, ProtocolError> {
        // Encoding phase.
        for round in 0..self.params.lambda {
            let label = StateLabel::from_round(self.bits[round], self.bases[round]);
            let (m1, m2) = transport.prepare_and_transmit(round, label)?;
            debug!(round, m1, m2, "round teleported");

            corrections_tx
                .send(Corrections { round, m1, m2 }.to_string())
                .await
                .map_err(|_| ProtocolError::ChannelClosed("corrections"))?;

            // Round synchrony: do not prepare round i+1 until the Client
            // confirms round i's correction was applied.
            let acked = ack_rx
                .recv()
                .await
                .ok_or(ProtocolError::ChannelClosed("round ack"))?;
            if acked != round {
                return Err(ProtocolError::Desync {
                    expected: round,
                    got: acked,
                });
            }
        }

        // AwaitingTransaction phase.
        let wire = settlement_rx
            .recv()
            .await
            .ok_or(ProtocolError::ChannelClosed("settlement"))?;
        let forward = TransactionForward::from_str(&wire)?;
        info!(
            client_id = %forward.client_id,
            merchant_id = %forward.merchant_id,
            "transaction settled"
        );

        // Decided.
        self.decide(&forward)
    }

    /// The authorization decision, separated from the async plumbing so
    /// it can be exercised directly.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnknownClient`] when the forwarded client ID has
    /// no registered secret — a rejection with a name, never ignored.
    /// [`ProtocolError::MalformedMessage`] when the forwarded key does
    /// not carry exactly λ bits: the merchant hop is attacker-controlled,
    /// and a shortened key would shrink the error-rate sample to however
    /// few rounds survive the truncation.
    pub fn decide(&self, forward: &TransactionForward) -> Result<Verdict, ProtocolError> {
        if forward.key.len() != self.params.lambda {
            return Err(ProtocolError::MalformedMessage(format!(
                "session key must carry exactly {} bits, got {}",
                self.params.lambda,
                forward.key.len()
            )));
        }
        let secret = self.registry.lookup(&forward.client_id)?;
        let m = derive_selector(secret, forward.merchant_id.as_bytes(), self.params.lambda)?;
        let verdict = authorize(
            &self.bits,
            &self.bases,
            &forward.key,
            &m,
            self.params.epsilon,
        );
        info!(
            accepted = verdict.accepted,
            qber = verdict.qber,
            matched = verdict.matched_rounds,
            "verdict"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SecretRegistry {
        let mut r = SecretRegistry::new();
        r.register("AdamMickiewicz44", *b"\xde\xad\xbe\xef");
        r
    }

    fn bits(s: &str) -> BitString {
        s.parse().unwrap()
    }

    #[test]
    fn new_samples_full_length_record() {
        let params = SessionParams::new(32, 0.0).unwrap();
        let ttp = TtpRole::new(params, registry());
        assert_eq!(ttp.bits().len(), 32);
        assert_eq!(ttp.bases().len(), 32);
    }

    #[test]
    fn decide_accepts_perfect_settlement() {
        // The merchant identifier determines m; pick the record to agree
        // with it everywhere, and report a key equal to the bits.
        let params = SessionParams::new(5, 0.0).unwrap();
        let m = derive_selector(b"\xde\xad\xbe\xef", b"BiedronkaSpZoo2137", 5).unwrap();
        let ttp = TtpRole::with_round_record(params, registry(), bits("01101"), m.clone());
        let forward = TransactionForward {
            client_id: "AdamMickiewicz44".to_string(),
            key: bits("01101"),
            merchant_id: "BiedronkaSpZoo2137".to_string(),
        };
        let verdict = ttp.decide(&forward).unwrap();
        assert!(verdict.accepted);
        assert_eq!(verdict.qber, 0.0);
        assert_eq!(verdict.matched_rounds, 5);
    }

    #[test]
    fn decide_rejects_wrong_length_key() {
        // A dishonest merchant could relay a shortened key so that only
        // its surviving bits are scored. Align the bases with the
        // selector string so the one remaining round *would* match and
        // agree — the length check must fire before any scoring does.
        let params = SessionParams::new(8, 0.0).unwrap();
        let m = derive_selector(b"\xde\xad\xbe\xef", b"BiedronkaSpZoo2137", 8).unwrap();
        let record = bits("01101001");
        let ttp = TtpRole::with_round_record(params, registry(), record.clone(), m);

        let truncated = TransactionForward {
            client_id: "AdamMickiewicz44".to_string(),
            key: bits("0"),
            merchant_id: "BiedronkaSpZoo2137".to_string(),
        };
        assert!(matches!(
            ttp.decide(&truncated),
            Err(ProtocolError::MalformedMessage(_))
        ));

        let padded = TransactionForward {
            client_id: "AdamMickiewicz44".to_string(),
            key: bits("011010010"),
            merchant_id: "BiedronkaSpZoo2137".to_string(),
        };
        assert!(matches!(
            ttp.decide(&padded),
            Err(ProtocolError::MalformedMessage(_))
        ));

        // The exact-length key still goes through to a verdict.
        let exact = TransactionForward {
            client_id: "AdamMickiewicz44".to_string(),
            key: record,
            merchant_id: "BiedronkaSpZoo2137".to_string(),
        };
        assert!(ttp.decide(&exact).is_ok());
    }

    #[test]
    fn decide_rejects_unknown_client() {
        let params = SessionParams::new(5, 0.0).unwrap();
        let ttp = TtpRole::with_round_record(
            params,
            registry(),
            bits("01101"),
            bits("00110"),
        );
        let forward = TransactionForward {
            client_id: "JulianTuwim00".to_string(),
            key: bits("01101"),
            merchant_id: "BiedronkaSpZoo2137".to_string(),
        };
        let result = ttp.decide(&forward);
        assert!(matches!(result, Err(ProtocolError::UnknownClient(_))));
    }
}
