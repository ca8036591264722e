//! Error taxonomy shared by the plotter, prover and verifier.

use std::io;
use thiserror::Error;

/// Errors produced anywhere in this crate.
#[derive(Debug, Error)]
pub enum PlotError {
    /// `k` out of `[KMIN, KMAX]`, a seed that isn't exactly 32 bytes, or an
    /// unusable path.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Read/write failure, truncated file, or a short read at a table
    /// boundary.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Magic mismatch, cursor out of range, entry-width inconsistency, or a
    /// missing end-of-table sentinel.
    #[error("plot format error: {0}")]
    Format(String),
    /// `k` was too small for the seed to yield a non-empty table `t`.
    #[error("no matches found while building table {0}")]
    NoMatches(u8),
    /// The challenge has no matching T7 entry.
    #[error("no proof exists for target {0:#x}")]
    NoProof(u64),
    /// The verifier rejected the proof.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// A cooperative cancellation token fired between table boundaries or
    /// sort buckets.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlotError>;
