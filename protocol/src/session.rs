//! # Session Runner
//!
//! One complete protocol run: three roles spawned as independent tokio
//! tasks, coordinated purely through channels and the shared transport.
//!
//! ```text
//!   TTP ──corrections──▶ Client ──request──▶ Merchant
//!    ▲◀──round ack──────────┘                   │
//!    └────────────settlement────────────────────┘
//! ```
//!
//! All channels have capacity 1 — the protocol is strictly
//! round-synchronous and single-shot past the rounds, so buffering would
//! only hide ordering bugs. Sessions share nothing: each call gets its
//! own roles and should get its own transport, which is what makes
//! running many sessions concurrently (parameter sweeps) safe.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::instrument;

use crate::authorize::Verdict;
use crate::bits::BitString;
use crate::config::{SecretRegistry, SessionParams};
use crate::error::ProtocolError;
use crate::roles::{ClientIdentity, ClientRole, ForwardStrategy, MerchantRole, TtpRole};
use crate::transport::TransportAdapter;

/// Everything a session leaves behind.
#[derive(Clone, Debug)]
pub struct SessionOutcome {
    /// The TTP's terminal authorization decision.
    pub verdict: Verdict,
    /// The session key the client decoded (diagnostics; a deployed
    /// client would obviously not publish this).
    pub client_key: BitString,
}

/// Run one session end to end and return the TTP's verdict.
///
/// The TTP samples a fresh round record; the Client decodes against
/// `identity.assumed_merchant_id`; the Merchant forwards whatever its
/// `strategy` dictates.
///
/// # Errors
///
/// The first fatal [`ProtocolError`] raised by any role, in causal
/// preference order (client, merchant, TTP) so that a downstream
/// `ChannelClosed` does not mask the failure that caused it.
#[instrument(skip_all, fields(lambda = params.lambda, epsilon = params.epsilon))]
pub async fn run_session(
    params: SessionParams,
    registry: SecretRegistry,
    identity: ClientIdentity,
    strategy: Box<dyn ForwardStrategy>,
    transport: Arc<dyn TransportAdapter>,
) -> Result<SessionOutcome, ProtocolError> {
    let (corrections_tx, corrections_rx) = mpsc::channel(1);
    let (ack_tx, ack_rx) = mpsc::channel(1);
    let (merchant_tx, merchant_rx) = mpsc::channel(1);
    let (settlement_tx, settlement_rx) = mpsc::channel(1);

    let ttp = TtpRole::new(params, registry);
    let client = ClientRole::new(params, identity);
    let merchant = MerchantRole::new(strategy);

    let ttp_task = tokio::spawn(ttp.run(
        Arc::clone(&transport),
        corrections_tx,
        ack_rx,
        settlement_rx,
    ));
    let client_task = tokio::spawn(client.run(transport, corrections_rx, ack_tx, merchant_tx));
    let merchant_task = tokio::spawn(merchant.run(merchant_rx, settlement_tx));

    let (ttp_res, client_res, merchant_res) =
        tokio::join!(ttp_task, client_task, merchant_task);

    let ttp_res = flatten(ttp_res);
    let client_res = flatten(client_res);
    let merchant_res = flatten(merchant_res);

    if ttp_res.is_err() || client_res.is_err() || merchant_res.is_err() {
        let errors: Vec<ProtocolError> = [client_res.err(), merchant_res.err(), ttp_res.err()]
            .into_iter()
            .flatten()
            .collect();
        return Err(root_cause(errors));
    }

    Ok(SessionOutcome {
        verdict: ttp_res?,
        client_key: client_res?,
    })
}

/// Collapse a join result and a role result into one error type.
fn flatten<T>(
    joined: Result<Result<T, ProtocolError>, tokio::task::JoinError>,
) -> Result<T, ProtocolError> {
    joined.map_err(|e| ProtocolError::TaskFailed(e.to_string()))?
}

/// Pick the error to surface. A `ChannelClosed` is collateral of some
/// other role dying first, so any other error takes precedence.
fn root_cause(mut errors: Vec<ProtocolError>) -> ProtocolError {
    debug_assert!(!errors.is_empty());
    let pos = errors
        .iter()
        .position(|e| !matches!(e, ProtocolError::ChannelClosed(_)))
        .unwrap_or(0);
    errors.swap_remove(pos)
}
