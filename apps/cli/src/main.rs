//! airclaim CLI
//!
//! Operator front end for the airdrop Merkle prover. Every command
//! loads the distribution file, runs the prover service, and talks to
//! it through the same queue/reply pipeline that a production
//! transport would use.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use everscale_types::models::StdAddr;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use airclaim_prover::{
    zero_account, EnumeratePage, EnumerateRequest, ProofRequest, Prover, ProverConfig,
    ProverRequest, WalletAirdrop,
};

/// airclaim - airdrop Merkle prover
#[derive(Parser)]
#[command(name = "airclaim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the airdrop bag-of-cells file
    #[arg(short, long)]
    file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the published Merkle root
    Root,

    /// List entitlements in key order
    List {
        /// Account to resume from (raw form, e.g. 0:ab..); omit to
        /// start from the beginning
        #[arg(long)]
        from: Option<String>,

        /// Page size
        #[arg(long, default_value = "10")]
        count: usize,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Produce a Merkle proof for one account
    Prove {
        /// Account address (raw form, e.g. 0:ab..)
        account: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the prover service until interrupted
    Serve,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn parse_account(raw: &str) -> Result<StdAddr> {
    raw.parse::<StdAddr>().map_err(|e| anyhow!("invalid account address '{raw}': {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let prover = Prover::new(&ProverConfig { filename: cli.file.clone() })
        .context("failed to load airdrop file")?;
    let merkle_root = prover.merkle_root();
    let queue = prover.queue();
    let cancel = CancellationToken::new();
    let service = tokio::spawn(prover.run(cancel.clone()));

    match cli.command {
        Commands::Root => {
            println!("{merkle_root}");
        }

        Commands::List { from, count, json } => {
            let next_from = match from {
                Some(raw) => parse_account(&raw)?,
                None => zero_account(),
            };
            let (reply, rx) = oneshot::channel();
            queue
                .send(ProverRequest::Enumerate(EnumerateRequest { next_from, count, reply }))
                .await
                .context("prover queue closed")?;
            let page = rx.await.context("prover stopped")??;
            print_page(&page, json);
        }

        Commands::Prove { account, json } => {
            let account = parse_account(&account)?;
            let (reply, rx) = oneshot::channel();
            queue
                .send(ProverRequest::Proof(ProofRequest { account, reply }))
                .await
                .context("prover queue closed")?;
            let airdrop = rx.await.context("prover stopped")??;
            print_proof(&airdrop, json);
        }

        Commands::Serve => {
            info!(root = %merkle_root, "prover running, press ctrl-c to stop");
            tokio::signal::ctrl_c().await.context("ctrl-c handler failed")?;
            info!("shutting down");
        }
    }

    cancel.cancel();
    let _ = service.await;
    Ok(())
}

fn print_page(page: &EnumeratePage, json: bool) {
    let end = page.next_from == zero_account();
    if json {
        let wallets: Vec<_> = page
            .leaves
            .iter()
            .map(|leaf| {
                serde_json::json!({
                    "account": leaf.account.to_string(),
                    "amount": leaf.entry.amount.to_string(),
                    "start_from": leaf.entry.start_from,
                    "expire_at": leaf.entry.expire_at,
                })
            })
            .collect();
        let next_from = (!end).then(|| page.next_from.to_string());
        println!("{}", serde_json::json!({ "wallets": wallets, "next_from": next_from }));
    } else {
        for leaf in &page.leaves {
            println!(
                "{} amount={} window={}..{}",
                leaf.account, leaf.entry.amount, leaf.entry.start_from, leaf.entry.expire_at
            );
        }
        if !end {
            println!("next: {}", page.next_from);
        }
    }
}

fn print_proof(airdrop: &WalletAirdrop, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "account": airdrop.account.to_string(),
                "amount": airdrop.entry.amount.to_string(),
                "start_from": airdrop.entry.start_from,
                "expire_at": airdrop.entry.expire_at,
                "proof": hex::encode(&airdrop.proof),
            })
        );
    } else {
        println!("account: {}", airdrop.account);
        println!("amount: {}", airdrop.entry.amount);
        println!("window: {}..{}", airdrop.entry.start_from, airdrop.entry.expire_at);
        println!("proof: {}", hex::encode(&airdrop.proof));
    }
}
