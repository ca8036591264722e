//! Chia-style proof-of-space plot construction, proving and verification.
//!
//! A 32-byte seed and a space parameter `k ∈ [18, 50]` determine a large
//! on-disk plot file encoding `2^k` candidate proofs, built by forward-
//! propagating seven tables (`T1..T7`) through AES-keyed hash functions and
//! a bucketed matching predicate. A [`prove::Prover`] answers a 32-byte
//! challenge with a 64-element proof by walking the committed plot; a
//! [`verify::Verifier`] recomputes that proof from the seed and challenge
//! alone.

mod aes_hash;
mod bitpack;
mod checkpoint;
mod collate;
mod entry;
mod entry_store;
mod error;
mod header;
mod matcher;
mod params;
mod plot;
mod propagator;
mod prove;
mod sort;
mod storage;
mod verify;

pub use aes_hash::{F1, Fx};
pub use entry::{Entry, TableKind};
pub use error::{PlotError, Result};
pub use header::Header;
pub use params::{KMAX, KMIN};
pub use plot::Plotter;
pub use propagator::ForwardPropagator;
pub use prove::Prover;
pub use storage::{FileStorage, MemoryStorage, PlotStorage};
pub use verify::Verifier;
