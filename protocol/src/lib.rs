// Copyright (c) 2026 TRIAD Contributors. MIT License.
// See LICENSE for details.

//! # TRIAD Protocol — Core Library
//!
//! TRIAD is a three-party transaction-authorization protocol: a trusted
//! third party (TTP) teleports a one-time authorization key to a Client
//! over a quantum transport, the Client asks a Merchant to settle a
//! purchase with that key, and the TTP approves or rejects the settled
//! transaction with a statistical error-rate test.
//!
//! The binding between key and merchant is a keyed derivation: both the
//! Client and the TTP independently compute a selector bit-string from
//! the client's long-term secret and a merchant identifier. The Client's
//! copy picks its measurement bases round by round; the TTP's copy picks
//! which rounds count toward the error rate. If the Merchant forwards the
//! identity the Client assumed, the two strings agree and a noiseless
//! session scores a QBER of exactly zero. If the Merchant lies, they
//! diverge and the score collapses toward coin-flipping.
//!
//! **Except** — and this is deliberate — the derivation is truncated to
//! λ bits, so at small λ a motivated merchant can brute-force a second
//! identifier that derives to the *same* selector string and rebind the
//! transaction unnoticed. The gap is modeled, exposed, and tested
//! (`derive::find_colliding_identifier`, `roles::ForgedForward`), not
//! papered over: this crate exists to study the protocol, weakness
//! included.
//!
//! ## Architecture
//!
//! - **config** — session parameters (λ, ε) and the TTP's secret registry.
//! - **error** — the exhaustive, session-fatal failure taxonomy.
//! - **bits** — the `BitString` the whole protocol trades in.
//! - **derive** — HMAC-SHA256 selector-string derivation + collision search.
//! - **transport** — the quantum transport seam and the noiseless
//!   reference simulation.
//! - **roles** — TTP, Client, Merchant state machines and their wire
//!   messages.
//! - **session** — one run: three tasks, four channels, one verdict.
//! - **authorize** — the pure QBER threshold decision.
//! - **analysis** — closed-form acceptance probability for cross-checking
//!   sweeps.

pub mod analysis;
pub mod authorize;
pub mod bits;
pub mod config;
pub mod derive;
pub mod error;
pub mod roles;
pub mod session;
pub mod transport;

pub use authorize::{authorize, Verdict};
pub use bits::BitString;
pub use config::{SecretRegistry, SessionParams};
pub use derive::{derive_selector, find_colliding_identifier};
pub use error::ProtocolError;
pub use roles::{ClientIdentity, ForgedForward, ForwardStrategy, HonestForward};
pub use session::{run_session, SessionOutcome};
pub use transport::{IdealTransport, StateLabel, TransportAdapter};
