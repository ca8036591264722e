//! Verifier front-end: independently checks a proof against a challenge,
//! reading only the plot's header for the seed and space parameter.

use ab_pos_plot::{FileStorage, Header, Verifier};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Parser)]
#[clap(about = "Verify a proof-of-space proof", version)]
struct Args {
    /// Plot file to read the seed from (only its header is read).
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
    /// 32-byte hex challenge.
    #[arg(short = 'c', long = "challenge")]
    challenge: String,
    /// Space parameter; checked against the header's `k` if both are given.
    #[arg(short = 'k', long = "k-size")]
    k: Option<u32>,
    /// Comma-separated list of 64 decimal `u64` proof values.
    #[arg(short = 'p', long = "proof")]
    proof: String,
}

fn run(args: Args) -> Result<()> {
    let bytes = hex::decode(&args.challenge).context("challenge must be hex-encoded")?;
    let challenge: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("challenge must be exactly 32 bytes"))?;

    let values: Vec<u64> = args
        .proof
        .split(',')
        .map(|s| s.trim().parse::<u64>().context("proof values must be decimal u64s"))
        .collect::<Result<_>>()?;
    let proof: [u64; 64] = values
        .try_into()
        .map_err(|v: Vec<u64>| anyhow::anyhow!("proof must have exactly 64 values, got {}", v.len()))?;

    let storage = FileStorage::open(&args.file)
        .with_context(|| format!("opening plot file {}", args.file.display()))?;
    let header = Header::read(&storage)?;
    if let Some(k) = args.k {
        if k != header.k {
            bail!("supplied -k {k} does not match plot header k {}", header.k);
        }
    }

    let verifier = Verifier::new(&header.plot_id);
    verifier.verify(&challenge, header.k, &proof)?;
    println!("valid");
    Ok(())
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
