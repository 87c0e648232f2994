//! # Merchant Role
//!
//! The merchant is a single-shot relay: it receives the client's
//! `ClientId|Key` text, appends a merchant identifier of its own
//! choosing, and forwards the completed transaction to the TTP. It keeps
//! no state afterward.
//!
//! "Of its own choosing" is the operative phrase. Nothing binds the
//! appended identifier to the merchant the client thought it was paying —
//! this hop is the protocol's attack surface. The identifier choice is a
//! [`ForwardStrategy`] value so the honest relay and the forging relay
//! are both first-class, independently testable behaviors rather than a
//! hidden coin flip.

use std::str::FromStr;

use tokio::sync::mpsc;
use tracing::info;

use crate::error::ProtocolError;
use crate::roles::messages::{TransactionForward, TransactionRequest};

/// How the merchant picks the identifier it appends.
pub trait ForwardStrategy: Send {
    /// The identifier to append to this request.
    fn merchant_identifier(&self, request: &TransactionRequest) -> String;
}

/// The honest merchant: appends its true identity.
#[derive(Clone, Debug)]
pub struct HonestForward {
    /// The merchant's real identifier.
    pub merchant_id: String,
}

impl ForwardStrategy for HonestForward {
    fn merchant_identifier(&self, _request: &TransactionRequest) -> String {
        self.merchant_id.clone()
    }
}

/// The dishonest merchant: substitutes a precomputed identifier.
///
/// The interesting case is a forged identifier found via
/// [`crate::derive::find_colliding_identifier`] — one whose selector
/// string collides with the honest identifier's under the client's
/// secret. The TTP's check then passes and the transaction is rebound to
/// a different merchant identity. Any non-colliding substitute instead
/// sends the QBER to ~1/4 in expectation and gets rejected at tight ε.
#[derive(Clone, Debug)]
pub struct ForgedForward {
    /// The substituted identifier.
    pub forged_id: String,
}

impl ForwardStrategy for ForgedForward {
    fn merchant_identifier(&self, _request: &TransactionRequest) -> String {
        self.forged_id.clone()
    }
}

/// The merchant side of one session.
pub struct MerchantRole {
    strategy: Box<dyn ForwardStrategy>,
}

impl MerchantRole {
    /// Create a merchant with the given forwarding strategy.
    pub fn new(strategy: Box<dyn ForwardStrategy>) -> Self {
        Self { strategy }
    }

    /// Relay exactly one transaction: receive from the client, append an
    /// identifier, forward to the TTP.
    ///
    /// # Errors
    ///
    /// Fatal on malformed request text or a closed channel.
    pub async fn run(
        self,
        mut client_rx: mpsc::Receiver<String>,
        ttp_tx: mpsc::Sender<String>,
    ) -> Result<(), ProtocolError> {
        let wire = client_rx
            .recv()
            .await
            .ok_or(ProtocolError::ChannelClosed("client"))?;
        let request = TransactionRequest::from_str(&wire)?;

        let merchant_id = self.strategy.merchant_identifier(&request);
        info!(client_id = %request.client_id, merchant_id = %merchant_id, "forwarding");

        let forward = TransactionForward::from_request(request, merchant_id);
        ttp_tx
            .send(forward.to_string())
            .await
            .map_err(|_| ProtocolError::ChannelClosed("settlement"))?;
        Ok(())
    }
}
