//! The three communicating parties and their wire messages.
//!
//! Each role is a self-contained state machine driven by one `run`
//! method; the only coupling between them is the message types in
//! [`messages`] and the [`crate::transport::TransportAdapter`] the TTP
//! and Client share. [`crate::session`] wires them together.

pub mod client;
pub mod merchant;
pub mod messages;
pub mod ttp;

pub use client::{ClientIdentity, ClientRole};
pub use merchant::{ForgedForward, ForwardStrategy, HonestForward, MerchantRole};
pub use messages::{Corrections, TransactionForward, TransactionRequest};
pub use ttp::TtpRole;
