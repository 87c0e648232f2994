//! # Client Role
//!
//! The client decodes the one-time key the TTP teleports to it, one bit
//! per round, then hands the assembled transaction to the Merchant.
//!
//! Lifecycle: `Init → Decoding(0..λ) → Finalizing → Done`. Before any
//! round the client derives its selector string from its long-term
//! secret and the merchant identifier it *believes* it is paying — that
//! identifier never leaves the client; it only chooses which rounds get
//! the extra measurement rotation. If the Merchant later claims a
//! different identity to the TTP, the two independently derived selector
//! strings diverge, and the QBER check catches it — unless the claimed
//! identity collides under the deriver, which is the protocol's
//! documented gap.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bits::BitString;
use crate::config::SessionParams;
use crate::derive::derive_selector;
use crate::error::ProtocolError;
use crate::roles::messages::{Corrections, TransactionRequest};
use crate::transport::TransportAdapter;

/// The client's session identity: what it is called, what it knows, and
/// who it thinks it is paying.
#[derive(Clone, Debug)]
pub struct ClientIdentity {
    /// Public identifier the TTP's registry is keyed by.
    pub public_id: String,
    /// Long-term secret shared with the TTP. Never transmitted.
    pub secret: Vec<u8>,
    /// The merchant identifier the client assumes. Never transmitted;
    /// only feeds the selector-string derivation.
    pub assumed_merchant_id: String,
}

/// The client side of one session.
pub struct ClientRole {
    params: SessionParams,
    identity: ClientIdentity,
}

impl ClientRole {
    /// Create a client for one session.
    pub fn new(params: SessionParams, identity: ClientIdentity) -> Self {
        Self { params, identity }
    }

    /// Drive the whole client side of a session.
    ///
    /// Decodes λ rounds — each strictly after its tagged correction
    /// message arrives on `corrections_rx` and strictly before the next
    /// is acknowledged on `ack_tx` — then sends the `ClientId|Key`
    /// transaction text to the Merchant and returns the session key.
    ///
    /// # Errors
    ///
    /// Fatal on selector derivation failure, corrections that do not
    /// parse ([`ProtocolError::MalformedMessage`]) or name the wrong
    /// round ([`ProtocolError::Desync`]), transport desync, or a closed
    /// channel.
    pub async fn run(
        self,
        transport: Arc<dyn TransportAdapter>,
        mut corrections_rx: mpsc::Receiver<String>,
        ack_tx: mpsc::Sender<usize>,
        merchant_tx: mpsc::Sender<String>,
    ) -> Result<BitString, ProtocolError> {
        // Derived once, before any round.
        let m = derive_selector(
            &self.identity.secret,
            self.identity.assumed_merchant_id.as_bytes(),
            self.params.lambda,
        )?;

        // Decoding phase.
        let mut key = BitString::with_capacity(self.params.lambda);
        for round in 0..self.params.lambda {
            let wire = corrections_rx
                .recv()
                .await
                .ok_or(ProtocolError::ChannelClosed("corrections"))?;
            let corrections = Corrections::from_str(&wire)?;
            if corrections.round != round {
                return Err(ProtocolError::Desync {
                    expected: round,
                    got: corrections.round,
                });
            }

            // Selector bit 0 means the round was encoded in the rotated
            // basis; undo the rotation before measuring.
            let extra_rotation = m[round] == 0;
            let outcome = transport.receive_and_correct(
                round,
                corrections.m1,
                corrections.m2,
                extra_rotation,
            )?;
            key.push(outcome);
            debug!(round, outcome, "round decoded");

            ack_tx
                .send(round)
                .await
                .map_err(|_| ProtocolError::ChannelClosed("round ack"))?;
        }

        // Finalizing.
        let request = TransactionRequest {
            client_id: self.identity.public_id.clone(),
            key: key.clone(),
        };
        merchant_tx
            .send(request.to_string())
            .await
            .map_err(|_| ProtocolError::ChannelClosed("merchant"))?;
        info!(client_id = %self.identity.public_id, "transaction sent");

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{IdealTransport, StateLabel};

    fn identity() -> ClientIdentity {
        ClientIdentity {
            public_id: "AdamMickiewicz44".to_string(),
            secret: b"\xde\xad\xbe\xef".to_vec(),
            assumed_merchant_id: "BiedronkaSpZoo2137".to_string(),
        }
    }

    #[tokio::test]
    async fn out_of_order_correction_is_desync() {
        let params = SessionParams::new(4, 0.0).unwrap();
        let client = ClientRole::new(params, identity());
        let transport = Arc::new(IdealTransport::with_seed(3));

        let (corr_tx, corr_rx) = mpsc::channel(4);
        let (ack_tx, _ack_rx) = mpsc::channel(4);
        let (merchant_tx, _merchant_rx) = mpsc::channel(1);

        corr_tx
            .send(Corrections { round: 2, m1: 0, m2: 0 }.to_string())
            .await
            .unwrap();

        let result = client.run(transport, corr_rx, ack_tx, merchant_tx).await;
        assert!(matches!(
            result,
            Err(ProtocolError::Desync { expected: 0, got: 2 })
        ));
    }

    #[tokio::test]
    async fn garbled_correction_is_fatal() {
        let params = SessionParams::new(4, 0.0).unwrap();
        let client = ClientRole::new(params, identity());
        let transport = Arc::new(IdealTransport::with_seed(9));

        let (corr_tx, corr_rx) = mpsc::channel(4);
        let (ack_tx, _ack_rx) = mpsc::channel(4);
        let (merchant_tx, _merchant_rx) = mpsc::channel(1);

        corr_tx.send("Corrections[0]: 7,0".to_string()).await.unwrap();

        let result = client.run(transport, corr_rx, ack_tx, merchant_tx).await;
        assert!(matches!(result, Err(ProtocolError::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn decodes_bits_where_bases_agree() {
        // Drive the TTP half by hand with a record matching the client's
        // selector string, so every decoded bit is deterministic.
        let lambda = 8;
        let params = SessionParams::new(lambda, 0.0).unwrap();
        let id = identity();
        let m = derive_selector(&id.secret, id.assumed_merchant_id.as_bytes(), lambda).unwrap();
        let bits = BitString::from_bits((0..lambda).map(|i| (i % 2) as u8).collect());

        let transport = Arc::new(IdealTransport::with_seed(11));
        let (corr_tx, corr_rx) = mpsc::channel(1);
        let (ack_tx, mut ack_rx) = mpsc::channel(1);
        let (merchant_tx, mut merchant_rx) = mpsc::channel(1);

        let client = ClientRole::new(params, id.clone());
        let client_task = tokio::spawn(client.run(
            Arc::clone(&transport) as Arc<dyn TransportAdapter>,
            corr_rx,
            ack_tx,
            merchant_tx,
        ));

        for round in 0..lambda {
            let label = StateLabel::from_round(bits[round], m[round]);
            let (m1, m2) = transport.prepare_and_transmit(round, label).unwrap();
            corr_tx
                .send(Corrections { round, m1, m2 }.to_string())
                .await
                .unwrap();
            assert_eq!(ack_rx.recv().await, Some(round));
        }

        let key = client_task.await.unwrap().unwrap();
        assert_eq!(key, bits);

        let wire = merchant_rx.recv().await.unwrap();
        assert_eq!(wire, format!("{}|{}", id.public_id, key));
    }
}
