//! `ForwardPropagator` — drives the T1..T7 pipeline: F1-fill, then for each
//! `t`, scan the previous table, match, compute `Fx` + `Collate`, write, sort.

use crate::aes_hash::{F1, Fx};
use crate::collate;
use crate::entry::{Entry, TableKind};
use crate::entry_store::EntryStore;
use crate::error::{PlotError, Result};
use crate::header::{HEADER_LEN, Header};
use crate::matcher::Matcher;
use crate::params;
use crate::sort::ExternalSort;
use crate::storage::PlotStorage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// One entry's `(fx, row, metadata)` as seen while streaming the previous
/// table in `fx` order.
#[derive(Debug, Clone, Copy)]
struct Row {
    fx: u64,
    row: u64,
    meta: u128,
}

fn meta_of(entry: &Entry) -> u128 {
    match *entry {
        Entry::T1 { x, .. } => u128::from(x),
        Entry::Mid { collated, .. } => collated,
        Entry::T7 { .. } | Entry::C1 { .. } => {
            unreachable!("T7/C1 are never read as a propagation source")
        }
    }
}

fn prev_kind(t: u8) -> TableKind {
    match t {
        2 => TableKind::T1,
        3..=7 => TableKind::Mid(t - 1),
        _ => unreachable!("t out of [2, 7]"),
    }
}

fn cur_kind(t: u8) -> TableKind {
    match t {
        2..=6 => TableKind::Mid(t),
        7 => TableKind::T7,
        _ => unreachable!("t out of [2, 7]"),
    }
}

/// Drives the full seven-table build over an already-header-written plot.
pub struct ForwardPropagator<'s> {
    storage: &'s dyn PlotStorage,
    seed: [u8; 32],
    k: u32,
    memory_budget: u64,
    f1: F1,
    fx: Fx,
    matcher: Matcher,
}

impl<'s> ForwardPropagator<'s> {
    /// Build a propagator over `storage` for plot seed `seed` at parameter
    /// `k`, sorting each table's region under `memory_budget` bytes.
    pub fn new(storage: &'s dyn PlotStorage, seed: [u8; 32], k: u32, memory_budget: u64) -> Self {
        Self {
            storage,
            seed,
            k,
            memory_budget,
            f1: F1::new(&seed),
            fx: Fx::new(&seed),
            matcher: Matcher::new(),
        }
    }

    /// Run the whole pipeline, writing the header first and advancing its
    /// cursor after every table. Returns the final committed header.
    ///
    /// If `cancel` is set between table boundaries or sort buckets, returns
    /// `Cancelled` with the header left at the last fully committed table.
    pub fn build(&self, cancel: Option<&AtomicBool>) -> Result<Header> {
        let mut header = Header::new(self.seed, self.k)?;
        header.write(self.storage)?;

        self.write_t1(&mut header)?;
        self.check_cancelled(cancel)?;

        for t in 2..=7u8 {
            self.propagate_table(t, &mut header)?;
            self.check_cancelled(cancel)?;
        }

        Ok(header)
    }

    fn check_cancelled(&self, cancel: Option<&AtomicBool>) -> Result<()> {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(PlotError::Cancelled);
        }
        Ok(())
    }

    pub fn write_t1(&self, header: &mut Header) -> Result<()> {
        let store = EntryStore::new(self.storage, self.k, TableKind::T1, HEADER_LEN);
        let n = 1u64 << self.k;
        for x in 0..n {
            let fx = self.f1.eval(x, self.k);
            store.write(x, &Entry::T1 { fx, x })?;
        }
        let eot_end = store.write_eot(n)?;
        self.storage.sync()?;

        info!(table = 1, entries = n, "table written");
        ExternalSort::sort(&store, 0, store.row_offset(n), self.memory_budget)?;

        header.advance(self.storage, 1, HEADER_LEN, eot_end)
    }

    pub fn propagate_table(&self, t: u8, header: &mut Header) -> Result<()> {
        let prev = EntryStore::new(self.storage, self.k, prev_kind(t), header.cursor_beg);
        let prev_n = (header.cursor_end - header.cursor_beg) / prev.width() - 1;

        let cur_start = header.cursor_end;
        let cur = EntryStore::new(self.storage, self.k, cur_kind(t), cur_start);
        let meta_width = params::metadata_width(self.k, t - 1);

        let mut left: Vec<Row> = Vec::new();
        let mut right: Vec<Row> = Vec::new();
        let mut g: Option<u64> = None;
        let mut out_row = 0u64;

        let flush = |left: &[Row], right: &[Row], out_row: &mut u64| -> Result<()> {
            if left.is_empty() || right.is_empty() {
                return Ok(());
            }
            self.emit_matches(t, left, right, meta_width, &cur, out_row)
        };

        for row in 0..prev_n {
            let entry = prev.read(row)?;
            let fx = entry.fx();
            let meta = meta_of(&entry);
            let b = params::bucket(fx);
            let current = Row { fx, row, meta };

            match g {
                None => {
                    g = Some(b);
                    left.push(current);
                }
                Some(gv) if b == gv => left.push(current),
                Some(gv) if b == gv + 1 => right.push(current),
                Some(gv) if b == gv + 2 => {
                    flush(&left, &right, &mut out_row)?;
                    left = std::mem::take(&mut right);
                    right = vec![current];
                    g = Some(gv + 1);
                }
                Some(_) => {
                    flush(&left, &right, &mut out_row)?;
                    left = vec![current];
                    right = Vec::new();
                    g = Some(b);
                }
            }
        }
        flush(&left, &right, &mut out_row)?;

        if out_row == 0 {
            return Err(PlotError::NoMatches(t));
        }

        let eot_end = cur.write_eot(out_row)?;
        self.storage.sync()?;

        info!(table = t, entries = out_row, "table written");
        ExternalSort::sort(&cur, 0, cur.row_offset(out_row), self.memory_budget)?;

        header.advance(self.storage, t, cur_start, eot_end)
    }

    fn emit_matches(
        &self,
        t: u8,
        left: &[Row],
        right: &[Row],
        meta_width: u32,
        cur: &EntryStore<'_>,
        out_row: &mut u64,
    ) -> Result<()> {
        let left_pairs: Vec<(u64, u64)> = left.iter().map(|r| (r.fx, r.row)).collect();
        let right_pairs: Vec<(u64, u64)> = right.iter().map(|r| (r.fx, r.row)).collect();
        let records = self.matcher.find_matches(&left_pairs, &right_pairs);
        if records.is_empty() {
            return Ok(());
        }

        let left_meta: HashMap<u64, u128> = left.iter().map(|r| (r.row, r.meta)).collect();
        let right_meta: HashMap<u64, u128> = right.iter().map(|r| (r.row, r.meta)).collect();

        for rec in records {
            let meta_left = left_meta[&rec.left_row];
            let right_row = rec.left_row + u64::from(rec.offset);
            let meta_right = right_meta[&right_row];

            let (fx_next, collated) =
                collate::evaluate(&self.fx, t, self.k, rec.left_fx, meta_left, meta_right);
            debug_assert!(meta_width > 0 || t == 2);

            let entry = if t == 7 {
                Entry::T7 {
                    fx: fx_next,
                    pos: rec.left_row,
                    offset: rec.offset,
                }
            } else {
                Entry::Mid {
                    fx: fx_next,
                    pos: rec.left_row,
                    offset: rec.offset,
                    collated,
                }
            };
            cur.write(*out_row, &entry)?;
            *out_row += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn builds_first_two_tables_over_a_tiny_k() {
        let storage = MemoryStorage::new();
        let seed = [0u8; 32];
        let k = 18;
        let propagator = ForwardPropagator::new(&storage, seed, k, 64 * 1024 * 1024);
        let mut header = Header::new(seed, k).unwrap();
        header.write(&storage).unwrap();
        propagator.write_t1(&mut header).unwrap();
        assert_eq!(header.cursor_idx, 1);

        let t1 = EntryStore::new(&storage, k, TableKind::T1, HEADER_LEN);
        let mut prev_fx = 0u64;
        for row in 0..(1u64 << k) {
            let e = t1.read(row).unwrap();
            assert!(e.fx() >= prev_fx);
            prev_fx = e.fx();
        }

        propagator.propagate_table(2, &mut header).unwrap();
        assert_eq!(header.cursor_idx, 2);
    }
}
