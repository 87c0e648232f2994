//! Error types for the TRIAD authorization protocol.
//!
//! Every fallible protocol operation returns a [`ProtocolError`]. The enum
//! is exhaustive over the failure modes of a session: all of them are fatal
//! to the session in which they occur — a transaction is single-use, so
//! nothing here is safe to retry automatically.
//!
//! Note what is *absent*: the authorization decision itself never fails.
//! Every valid `(bits, bases, key, m, epsilon)` combination yields a
//! well-defined [`crate::authorize::Verdict`], including the degenerate
//! zero-basis-match case.

use thiserror::Error;

/// Errors that can occur during a TRIAD session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The TTP has no registered secret for the client named in the
    /// transaction. Surfaced as a rejection at the session boundary,
    /// never swallowed.
    #[error("unknown client: no secret registered for '{0}'")]
    UnknownClient(String),

    /// A derived selector string was requested beyond the capacity of the
    /// underlying keyed hash. This is a configuration error, not a
    /// runtime condition.
    #[error("invalid selector length: requested {requested} bits, derivation capacity is {max}")]
    InvalidLength {
        /// Number of bits requested.
        requested: usize,
        /// Maximum the deriver can produce.
        max: usize,
    },

    /// A role observed a message or transport unit for a round index it
    /// did not expect. Indicates a transport or ordering violation;
    /// the session cannot continue.
    #[error("protocol desync: expected round {expected}, got round {got}")]
    Desync {
        /// The round the role was prepared to handle.
        expected: usize,
        /// The round carried by the offending message.
        got: usize,
    },

    /// Classical wire text that does not parse as the expected message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A peer role hung up mid-session. The name identifies which channel
    /// closed (for the log line, not for recovery — there is none).
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// A role task panicked or was cancelled before producing its result.
    #[error("role task failed: {0}")]
    TaskFailed(String),
}
