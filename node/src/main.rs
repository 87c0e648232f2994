// Copyright (c) 2026 TRIAD Contributors. MIT License.
// See LICENSE for details.

//! # TRIAD Node
//!
//! Command-line front end for the TRIAD protocol library. `run` executes
//! one three-party session over the noiseless in-memory transport and
//! prints the verdict as JSON; `sweep` reproduces the acceptance-rate
//! study — empirical rates per (λ, ε) cell next to the analytical
//! forged-identifier curve.

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use triad_protocol::analysis::forged_acceptance_probability;
use triad_protocol::{
    find_colliding_identifier, run_session, ClientIdentity, ForgedForward, ForwardStrategy,
    HonestForward, IdealTransport, SecretRegistry, SessionParams, Verdict,
};

use cli::{Commands, RunArgs, SweepArgs, TriadCli};
use logging::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TriadCli::parse();
    init_logging(&cli.log_level, LogFormat::from_str_lossy(&cli.log_format));

    match cli.command {
        Commands::Run(args) => run_once(args).await,
        Commands::Sweep(args) => sweep(args).await,
        Commands::Version => {
            println!("triad-node {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// What `run` prints on stdout.
#[derive(Serialize)]
struct RunReport {
    verdict: Verdict,
    session_key: String,
    merchant_id_forwarded: String,
}

async fn run_once(args: RunArgs) -> Result<()> {
    let params = SessionParams::new(args.lambda, args.epsilon)?;
    let secret = hex::decode(&args.secret).context("--secret must be hex")?;

    let mut registry = SecretRegistry::new();
    registry.register(args.client_id.clone(), secret.clone());

    let identity = ClientIdentity {
        public_id: args.client_id,
        secret: secret.clone(),
        assumed_merchant_id: args.merchant_id.clone(),
    };

    let (strategy, forwarded): (Box<dyn ForwardStrategy>, String) = if args.forge {
        let forged = find_colliding_identifier(
            &secret,
            args.merchant_id.as_bytes(),
            params.lambda,
            args.forge_budget,
        );
        match forged {
            Some(forged_id) => {
                info!(forged_id = %forged_id, "collision found, merchant will substitute it");
                (
                    Box::new(ForgedForward {
                        forged_id: forged_id.clone(),
                    }),
                    forged_id,
                )
            }
            None => bail!(
                "no colliding identifier within {} candidates at lambda = {} \
                 (expected work is ~2^lambda; try a smaller lambda or a larger --forge-budget)",
                args.forge_budget,
                params.lambda
            ),
        }
    } else {
        (
            Box::new(HonestForward {
                merchant_id: args.merchant_id.clone(),
            }),
            args.merchant_id,
        )
    };

    let transport = match args.seed {
        Some(seed) => Arc::new(IdealTransport::with_seed(seed)),
        None => Arc::new(IdealTransport::new()),
    };

    let outcome = run_session(params, registry, identity, strategy, transport).await?;
    if !outcome.verdict.accepted {
        warn!(qber = outcome.verdict.qber, "transaction rejected");
    }

    let report = RunReport {
        verdict: outcome.verdict,
        session_key: outcome.client_key.to_string(),
        merchant_id_forwarded: forwarded,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn sweep(args: SweepArgs) -> Result<()> {
    if args.lambda_min == 0 || args.lambda_min > args.lambda_max {
        bail!("sweep needs 0 < lambda-min <= lambda-max");
    }
    let honest = match args.merchant.as_str() {
        "honest" => true,
        "random" => false,
        other => bail!("--merchant must be 'honest' or 'random', got '{}'", other),
    };

    println!(
        "{:>6} {:>8} {:>10} {:>12} {:>12}",
        "lambda", "epsilon", "accepted", "empirical", "analytical"
    );

    for &epsilon in &args.epsilons {
        for lambda in args.lambda_min..=args.lambda_max {
            let params = SessionParams::new(lambda, epsilon)?;
            let accepted = run_cell(params, honest, args.runs).await?;
            let empirical = accepted as f64 / args.runs as f64;
            let analytical = if honest {
                // Honest sessions fail only on the zero-match draw.
                1.0 - 0.5f64.powi(lambda as i32)
            } else {
                forged_acceptance_probability(lambda, epsilon)
            };
            println!(
                "{:>6} {:>8.4} {:>7}/{:<3} {:>12.4} {:>12.4}",
                lambda, epsilon, accepted, args.runs, empirical, analytical
            );
        }
    }
    Ok(())
}

/// Run one sweep cell: `runs` independent sessions, counting acceptances.
/// Sessions share nothing, so they all run concurrently.
async fn run_cell(params: SessionParams, honest: bool, runs: usize) -> Result<usize> {
    const CLIENT_ID: &str = "AdamMickiewicz44";
    const SECRET: &[u8] = b"\xde\xad\xbe\xef";
    const MERCHANT_ID: &str = "BiedronkaSpZoo2137";

    let mut tasks = JoinSet::new();
    for _ in 0..runs {
        let mut registry = SecretRegistry::new();
        registry.register(CLIENT_ID, SECRET);
        let identity = ClientIdentity {
            public_id: CLIENT_ID.to_string(),
            secret: SECRET.to_vec(),
            assumed_merchant_id: MERCHANT_ID.to_string(),
        };
        let strategy: Box<dyn ForwardStrategy> = if honest {
            Box::new(HonestForward {
                merchant_id: MERCHANT_ID.to_string(),
            })
        } else {
            // A fresh random identifier per session: the baseline the
            // analytical curve models.
            Box::new(ForgedForward {
                forged_id: format!("merchant-{:016x}", rand::thread_rng().gen::<u64>()),
            })
        };
        tasks.spawn(run_session(
            params,
            registry,
            identity,
            strategy,
            Arc::new(IdealTransport::new()),
        ));
    }

    let mut accepted = 0;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.context("session task panicked")??;
        if outcome.verdict.accepted {
            accepted += 1;
        }
    }
    Ok(accepted)
}
