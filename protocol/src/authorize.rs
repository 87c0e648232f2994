//! # Authorization Engine
//!
//! The TTP's final decision: compare the client-reported session key
//! against the recorded round bits, but only at positions where the
//! merchant-derived selector string agrees with the recorded encoding
//! basis. Rounds measured in the wrong basis carry no information, so
//! they are excluded from the count rather than averaged in as noise.
//!
//! The decision is a plain threshold test on the resulting error rate
//! (QBER). It is pure and total: every input combination yields a
//! verdict, never an error. The degenerate case — zero basis-matched
//! rounds — is scored as QBER 1.0, which rejects under any ε < 1.0.
//! That conservatism is inherited behavior and is preserved exactly.

use serde::{Deserialize, Serialize};

use crate::bits::BitString;

/// The terminal output of a session: accept/reject plus the measured
/// error rate and the counts it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the transaction is authorized.
    pub accepted: bool,
    /// Measured error rate over basis-matched rounds; 1.0 when no round
    /// matched.
    pub qber: f64,
    /// Number of rounds where the selector agreed with the encoding basis.
    pub matched_rounds: usize,
    /// Number of matched rounds whose key bit disagreed with the
    /// encoded bit.
    pub error_rounds: usize,
}

/// Decide whether to authorize a settled transaction.
///
/// * `bits` / `bases` — the TTP's recorded round record.
/// * `key` — the session key the client reported.
/// * `m` — the selector string the TTP derived from the forwarded
///   merchant identifier.
/// * `epsilon` — acceptable error rate.
///
/// Positions beyond the shortest input are ignored; in a well-formed
/// session all four strings have length λ.
pub fn authorize(
    bits: &BitString,
    bases: &BitString,
    key: &BitString,
    m: &BitString,
    epsilon: f64,
) -> Verdict {
    let rounds = bits
        .len()
        .min(bases.len())
        .min(key.len())
        .min(m.len());

    let mut matched_rounds = 0usize;
    let mut error_rounds = 0usize;
    for i in 0..rounds {
        if m[i] == bases[i] {
            matched_rounds += 1;
            if key[i] != bits[i] {
                error_rounds += 1;
            }
        }
    }

    let qber = if matched_rounds > 0 {
        error_rounds as f64 / matched_rounds as f64
    } else {
        1.0
    };

    Verdict {
        accepted: qber <= epsilon,
        qber,
        matched_rounds,
        error_rounds,
    }
}
