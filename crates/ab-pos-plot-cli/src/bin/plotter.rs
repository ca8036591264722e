//! Plotter front-end: builds (or resumes) a Chia-style proof-of-space plot.

use ab_pos_plot::{FileStorage, Plotter};
use anyhow::{Context, Result};
use bytesize::ByteSize;
use clap::Parser;
use rand::Rng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[clap(about = "Build a proof-of-space plot", version)]
struct Args {
    /// Path to the plot file (created if absent).
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
    /// Space parameter, `k ∈ [18, 50]`.
    #[arg(short = 'k', long = "k-size")]
    k: u32,
    /// Memory budget for external sorting, e.g. `512M` or `4G`.
    #[arg(short = 'm', long = "memory", default_value = "512M")]
    memory: ByteSize,
    /// 32-byte hex seed; a random one is generated and printed if omitted.
    #[arg(long = "seed")]
    seed: Option<PathBuf>,
    /// Resume a partially-built plot instead of starting over.
    #[arg(long = "retry", default_value_t = false)]
    retry: bool,
}

fn run(args: Args) -> Result<()> {
    let seed = match &args.seed {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading seed file {}", path.display()))?;
            let seed: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("seed file must contain exactly 32 bytes"))?;
            seed
        }
        None => {
            let mut seed = [0u8; 32];
            rand::rng().fill_bytes(&mut seed);
            info!(seed = hex::encode(seed), "generated random seed");
            seed
        }
    };

    let memory_budget = args.memory.as_u64();
    let plotter = Plotter::new(seed, args.k, memory_budget)?;
    let storage = FileStorage::open(&args.file)
        .with_context(|| format!("opening plot file {}", args.file.display()))?;

    let header = plotter.run(&storage, args.retry, None)?;
    info!(
        file = %args.file.display(),
        k = header.k,
        "plot committed through checkpoint"
    );
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
