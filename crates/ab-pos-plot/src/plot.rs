//! `Plot` / `Plotter` — the top-level orchestrator tying the header,
//! forward propagator and checkpoint builder together, with resume support.

use crate::checkpoint::Checkpoint;
use crate::error::{PlotError, Result};
use crate::header::{HEADER_LEN, Header};
use crate::params;
use crate::propagator::ForwardPropagator;
use crate::storage::PlotStorage;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Drives a full plot build, or resumes one left behind by a prior run.
#[derive(Debug)]
pub struct Plotter {
    k: u32,
    seed: [u8; 32],
    memory_budget: u64,
}

impl Plotter {
    /// Build a plotter for `seed` at space parameter `k`, sorting under
    /// `memory_budget` bytes.
    pub fn new(seed: [u8; 32], k: u32, memory_budget: u64) -> Result<Self> {
        params::validate_k(k)?;
        Ok(Self {
            k,
            seed,
            memory_budget,
        })
    }

    /// Run the build against `storage`. If `retry` is set and `storage`
    /// already holds a valid header, resumes from `cursor_idx + 1` instead
    /// of starting over; any bytes beyond the committed cursor are discarded
    /// first.
    ///
    /// `cancel`, if supplied, is polled at table boundaries and between sort
    /// buckets; on cancellation the header is left at the last fully
    /// committed table.
    pub fn run(
        &self,
        storage: &dyn PlotStorage,
        retry: bool,
        cancel: Option<&AtomicBool>,
    ) -> Result<Header> {
        let existing = if retry {
            Header::read(storage).ok()
        } else {
            None
        };

        let mut header = match existing {
            Some(h) if h.plot_id == self.seed && h.k == self.k => {
                info!(cursor_idx = h.cursor_idx, "resuming plot");
                storage.set_len(h.cursor_end)?;
                h
            }
            _ => {
                storage.set_len(HEADER_LEN)?;
                let h = Header::new(self.seed, self.k)?;
                h.write(storage)?;
                h
            }
        };

        let propagator = ForwardPropagator::new(storage, self.seed, self.k, self.memory_budget);

        if header.cursor_idx == 0 {
            propagator.write_t1(&mut header)?;
            self.poll(cancel)?;
        }
        for t in (header.cursor_idx.max(1) + 1)..=7 {
            propagator.propagate_table(t, &mut header)?;
            self.poll(cancel)?;
        }

        if header.cursor_idx < 8 {
            Checkpoint::build(storage, self.k, &mut header)?;
        }

        Ok(header)
    }

    fn poll(&self, cancel: Option<&AtomicBool>) -> Result<()> {
        if cancel.is_some_and(|c| c.load(std::sync::atomic::Ordering::Relaxed)) {
            return Err(PlotError::Cancelled);
        }
        Ok(())
    }
}
