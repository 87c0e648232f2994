//! # CLI Interface
//!
//! Defines the command-line argument structure for `triad-node` using
//! `clap` derive. Three subcommands: `run` (one session), `sweep`
//! (acceptance-rate curves over λ and ε), and `version`.

use clap::{Parser, Subcommand};

/// TRIAD protocol session runner.
///
/// Runs three-party transaction-authorization sessions over the built-in
/// noiseless transport: a TTP teleports a one-time key to a client, a
/// merchant relays the transaction, and the TTP's error-rate test issues
/// the verdict.
#[derive(Parser, Debug)]
#[command(
    name = "triad-node",
    about = "TRIAD protocol session runner",
    version,
    propagate_version = true
)]
pub struct TriadCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, env = "TRIAD_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Default log level when RUST_LOG is not set.
    #[arg(long, env = "TRIAD_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the TRIAD node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single session and print the verdict as JSON on stdout.
    Run(RunArgs),
    /// Sweep λ and ε, printing empirical acceptance rates next to the
    /// analytical forged-identifier curve.
    Sweep(SweepArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Session length λ: number of protocol rounds and key bits.
    #[arg(long, default_value_t = 20)]
    pub lambda: usize,

    /// Acceptable error rate ε over basis-matched rounds, in [0, 1].
    #[arg(long, default_value_t = 0.0)]
    pub epsilon: f64,

    /// Public client identifier (the TTP registry key).
    #[arg(long, default_value = "AdamMickiewicz44")]
    pub client_id: String,

    /// Hex-encoded long-term secret shared between client and TTP.
    #[arg(long, default_value = "deadbeef")]
    pub secret: String,

    /// Merchant identifier the client believes it is paying.
    #[arg(long, default_value = "BiedronkaSpZoo2137")]
    pub merchant_id: String,

    /// Make the merchant dishonest: brute-force an identifier that
    /// collides with --merchant-id under the client's secret and
    /// substitute it. Practical only at small λ.
    #[arg(long)]
    pub forge: bool,

    /// Candidate budget for the collision search when --forge is set.
    #[arg(long, default_value_t = 1 << 20)]
    pub forge_budget: usize,

    /// Seed for the transport simulation; omit for OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the `sweep` subcommand.
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Smallest λ in the sweep.
    #[arg(long, default_value_t = 5)]
    pub lambda_min: usize,

    /// Largest λ in the sweep (inclusive).
    #[arg(long, default_value_t = 24)]
    pub lambda_max: usize,

    /// ε values to sweep, comma-separated.
    #[arg(long, value_delimiter = ',', default_value = "0.0,0.0625,0.125,0.25")]
    pub epsilons: Vec<f64>,

    /// Sessions per (λ, ε) cell.
    #[arg(long, default_value_t = 50)]
    pub runs: usize,

    /// Merchant behavior for the sweep: "honest" or "random" (substitute
    /// a random identifier each session, the forged baseline the
    /// analytical curve models).
    #[arg(long, default_value = "random")]
    pub merchant: String,
}
