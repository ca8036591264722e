//! Prover front-end: answers a challenge against a committed plot.

use ab_pos_plot::{FileStorage, Prover};
use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::Rng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[clap(about = "Answer a challenge against a proof-of-space plot", version)]
struct Args {
    /// Path to the committed plot file.
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
    /// 32-byte hex challenge; a random one is generated and printed if
    /// omitted.
    #[arg(short = 'c', long = "challenge")]
    challenge: Option<String>,
}

fn run(args: Args) -> Result<()> {
    let challenge = match args.challenge {
        Some(hex_str) => {
            let bytes = hex::decode(&hex_str).context("challenge must be hex-encoded")?;
            let challenge: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("challenge must be exactly 32 bytes"))?;
            challenge
        }
        None => {
            let mut challenge = [0u8; 32];
            rand::rng().fill_bytes(&mut challenge);
            println!("{}", hex::encode(challenge));
            challenge
        }
    };

    let storage = FileStorage::open(&args.file)
        .with_context(|| format!("opening plot file {}", args.file.display()))?;
    let prover = Prover::open(&storage)?;

    match prover.prove(&challenge) {
        Ok(proof) => {
            let csv = proof
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            println!("{csv}");
            info!("proof found");
            Ok(())
        }
        Err(err) => bail!("{err}"),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
