//! # Analytical Acceptance Model
//!
//! Closed-form probability that a session whose merchant identifier was
//! substituted with a *random* value is nonetheless accepted. Used to
//! cross-check the empirical sweep: the two curves should agree within
//! sampling noise.
//!
//! Model: a random identifier gives a uniformly random selector string
//! `m'` on the TTP side, so each round is basis-matched with probability
//! 1/2. At a matched round the client's key bit is wrong with probability
//! 1/4 (its own measurement basis agreed with the encoding basis half the
//! time; a wrong-basis measurement is a coin flip). Summing over the
//! number of matched rounds `k` and tolerated errors `j`:
//!
//! ```text
//! P(accept) = Σ_{k=1..λ} C(λ,k) (1/2)^λ · Σ_{j=0..⌊k·ε⌋} C(k,j) (1/4)^j (3/4)^(k-j)
//! ```
//!
//! The `k = 0` term is absent: zero matched rounds scores QBER 1.0 and
//! rejects for any ε < 1.0.

/// Binomial coefficient as `f64`, computed multiplicatively. Exact for
/// the magnitudes a sweep uses; good to ~15 significant digits beyond.
fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0f64;
    for i in 0..k {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc
}

/// Probability that a forged (uniformly random) merchant identifier is
/// accepted at session length `lambda` and threshold `epsilon`.
pub fn forged_acceptance_probability(lambda: usize, epsilon: f64) -> f64 {
    let half_pow = 0.5f64.powi(lambda as i32);
    let mut total = 0.0;
    for k in 1..=lambda {
        let tolerated = (k as f64 * epsilon).floor() as usize;
        let mut inner = 0.0;
        for j in 0..=tolerated.min(k) {
            inner += binomial(k, j) * 0.25f64.powi(j as i32) * 0.75f64.powi((k - j) as i32);
        }
        total += binomial(lambda, k) * half_pow * inner;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_small_values() {
        assert_eq!(binomial(5, 0), 1.0);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(5, 5), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
    }

    #[test]
    fn single_round_strict_threshold() {
        // λ = 1, ε = 0: accept iff the round matches (1/2) and the key
        // bit is right (3/4).
        let p = forged_acceptance_probability(1, 0.0);
        assert!((p - 0.375).abs() < 1e-12);
    }

    #[test]
    fn probability_shrinks_with_lambda() {
        let p5 = forged_acceptance_probability(5, 0.0);
        let p10 = forged_acceptance_probability(10, 0.0);
        let p20 = forged_acceptance_probability(20, 0.0);
        assert!(p5 > p10 && p10 > p20);
        assert!(p20 < 0.01);
    }

    #[test]
    fn probability_grows_with_epsilon() {
        let strict = forged_acceptance_probability(12, 0.0);
        let loose = forged_acceptance_probability(12, 0.25);
        let permissive = forged_acceptance_probability(12, 1.0);
        assert!(strict < loose && loose < permissive);
        // ε = 1.0 tolerates every error; only the zero-match term rejects.
        assert!((permissive - (1.0 - 0.5f64.powi(12))).abs() < 1e-12);
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        for lambda in [1, 5, 20, 64] {
            for &eps in &[0.0, 0.1, 0.5, 1.0] {
                let p = forged_acceptance_probability(lambda, eps);
                assert!((0.0..=1.0).contains(&p), "λ={} ε={} p={}", lambda, eps, p);
            }
        }
    }
}
