//! # Transport Adapter
//!
//! The seam between the protocol core and whatever actually moves qubits.
//! The TTP hands the adapter a 2-bit preparation label per round and gets
//! back the two classical correction bits its teleportation measurement
//! produced; the Client later hands those corrections back (plus its own
//! basis choice) and gets one measured bit. That is the entire contract —
//! the core neither knows nor cares whether entangled pairs, a network
//! simulator, or the in-memory model below sits behind it.
//!
//! Rounds are strictly synchronous: a prepared unit must be consumed
//! before the next `prepare_and_transmit`, and consumed for the round it
//! was prepared for. The adapter polices both; a violation is
//! [`ProtocolError::Desync`] and kills the session.
//!
//! [`IdealTransport`] is the noiseless reference implementation: a
//! single-qubit simulation over real amplitudes (the four BB84 states and
//! every operator here — X, Z, H — keep amplitudes real, so complex
//! arithmetic would be dead weight).

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// StateLabel
// ---------------------------------------------------------------------------

/// The four preparation instructions, one per `(bit, basis)` combination.
///
/// The wire encoding is two classical bits: `00` identity, `01`
/// basis-rotate, `10` bit-flip, `11` bit-flip then basis-rotate. Basis 1
/// is the computational basis, basis 0 the rotated (Hadamard) one, hence
/// the inverted-looking mapping in [`StateLabel::from_round`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateLabel {
    /// `00` — prepare `|0⟩` as-is (bit 0, computational basis).
    Identity,
    /// `01` — rotate: `|+⟩` (bit 0, rotated basis).
    Rotate,
    /// `10` — flip: `|1⟩` (bit 1, computational basis).
    Flip,
    /// `11` — flip then rotate: `|−⟩` (bit 1, rotated basis).
    FlipRotate,
}

impl StateLabel {
    /// Map a round's `(bit, basis)` pair to its preparation instruction.
    pub fn from_round(bit: u8, basis: u8) -> Self {
        match (bit, basis) {
            (0, 0) => StateLabel::Rotate,
            (0, _) => StateLabel::Identity,
            (_, 0) => StateLabel::FlipRotate,
            (_, _) => StateLabel::Flip,
        }
    }

    /// The 2-bit wire code `(flip, rotate)`.
    pub fn code(self) -> (u8, u8) {
        match self {
            StateLabel::Identity => (0, 0),
            StateLabel::Rotate => (0, 1),
            StateLabel::Flip => (1, 0),
            StateLabel::FlipRotate => (1, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// TransportAdapter
// ---------------------------------------------------------------------------

/// Round-synchronous quantum transport between TTP and Client.
///
/// Both calls are synchronous; a round is complete only after its
/// `receive_and_correct` returns, and no later round may begin before
/// that.
pub trait TransportAdapter: Send + Sync {
    /// TTP side: prepare the state named by `label`, teleport it, and
    /// return the two classical correction bits from the local Bell
    /// measurement.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Desync`] when called out of round order or while
    /// a previous unit is still pending.
    fn prepare_and_transmit(
        &self,
        round: usize,
        label: StateLabel,
    ) -> Result<(u8, u8), ProtocolError>;

    /// Client side: apply the corrections to the transported unit — the
    /// `m2` bit-flip first, then the `m1` phase flip; the composition is
    /// only correct in that order — optionally rotate the measurement
    /// basis, measure, and return the outcome bit.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Desync`] when no unit is pending or `round` does
    /// not name the pending unit.
    fn receive_and_correct(
        &self,
        round: usize,
        m1: u8,
        m2: u8,
        extra_rotation: bool,
    ) -> Result<u8, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Single-qubit state
// ---------------------------------------------------------------------------

/// A pure single-qubit state with real amplitudes `(a|0⟩ + b|1⟩)`.
#[derive(Clone, Copy, Debug)]
struct Qubit {
    a: f64,
    b: f64,
}

impl Qubit {
    const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

    fn zero() -> Self {
        Self { a: 1.0, b: 0.0 }
    }

    /// Pauli-X (bit flip).
    fn x(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }

    /// Pauli-Z (phase flip).
    fn z(&mut self) {
        self.b = -self.b;
    }

    /// Hadamard (basis rotation).
    fn h(&mut self) {
        let (a, b) = (self.a, self.b);
        self.a = (a + b) * Self::FRAC_1_SQRT_2;
        self.b = (a - b) * Self::FRAC_1_SQRT_2;
    }

    /// Projective measurement in the computational basis.
    fn measure<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        let p0 = self.a * self.a;
        u8::from(rng.gen::<f64>() >= p0)
    }
}

// ---------------------------------------------------------------------------
// IdealTransport
// ---------------------------------------------------------------------------

struct PendingUnit {
    round: usize,
    qubit: Qubit,
}

struct TransportState {
    rng: StdRng,
    pending: Option<PendingUnit>,
    /// Round index the next `prepare_and_transmit` must carry.
    next_round: usize,
}

/// Noiseless in-memory transport.
///
/// Teleportation is modeled faithfully up to the byproduct algebra: the
/// Bell measurement outcome is two uniform bits `(m1, m2)` and the
/// transported half is left in `X^m2 Z^m1 |ψ⟩`, so the receiver must
/// undo X before Z. Feeding back the wrong corrections therefore
/// scrambles the state exactly as it would on real hardware.
///
/// One unit slot: the single pending unit doubles as the round-synchrony
/// enforcement demanded by the protocol.
pub struct IdealTransport {
    state: Mutex<TransportState>,
}

impl IdealTransport {
    /// Transport seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic transport for reproducible tests and sweeps.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(TransportState {
                rng,
                pending: None,
                next_round: 0,
            }),
        }
    }
}

impl Default for IdealTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportAdapter for IdealTransport {
    fn prepare_and_transmit(
        &self,
        round: usize,
        label: StateLabel,
    ) -> Result<(u8, u8), ProtocolError> {
        let mut state = self.state.lock();

        if let Some(pending) = &state.pending {
            return Err(ProtocolError::Desync {
                expected: pending.round,
                got: round,
            });
        }
        if round != state.next_round {
            return Err(ProtocolError::Desync {
                expected: state.next_round,
                got: round,
            });
        }

        let mut qubit = Qubit::zero();
        match label {
            StateLabel::Identity => {}
            StateLabel::Rotate => qubit.h(),
            StateLabel::Flip => qubit.x(),
            StateLabel::FlipRotate => {
                qubit.x();
                qubit.h();
            }
        }

        // Bell measurement byproduct: two uniform bits, state picks up
        // X^m2 Z^m1.
        let m1 = u8::from(state.rng.gen::<bool>());
        let m2 = u8::from(state.rng.gen::<bool>());
        if m1 == 1 {
            qubit.z();
        }
        if m2 == 1 {
            qubit.x();
        }

        state.pending = Some(PendingUnit { round, qubit });
        Ok((m1, m2))
    }

    fn receive_and_correct(
        &self,
        round: usize,
        m1: u8,
        m2: u8,
        extra_rotation: bool,
    ) -> Result<u8, ProtocolError> {
        let mut state = self.state.lock();

        let pending = state.pending.take().ok_or(ProtocolError::Desync {
            expected: state.next_round,
            got: round,
        })?;
        if pending.round != round {
            // Put nothing back: a cross-round receive is unrecoverable.
            return Err(ProtocolError::Desync {
                expected: pending.round,
                got: round,
            });
        }

        let mut qubit = pending.qubit;
        if m2 == 1 {
            qubit.x();
        }
        if m1 == 1 {
            qubit.z();
        }
        if extra_rotation {
            qubit.h();
        }

        let outcome = qubit.measure(&mut state.rng);
        state.next_round = round + 1;
        Ok(outcome)
    }
}
