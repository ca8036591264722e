//! `ExternalSort` — a two-phase bucketed external sort over a table's byte
//! region, tolerant of bucket skew via recursion.

use crate::entry::{Entry, TableKind, decode, encode};
use crate::entry_store::EntryStore;
use crate::error::Result;
use crate::params::f_width;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Minimum number of spill buckets the distribute phase uses.
const MIN_BUCKETS: u64 = 16;
/// Bucket-skew recursion depth past which we give up re-bucketing and sort
/// the remainder in memory regardless of the budget; guards against
/// degenerate inputs (e.g. a run of identical keys) never converging.
const MAX_SKEW_DEPTH: u32 = 8;

/// Sorts a table's `[start, end)` byte region in place.
///
/// Sort key: `fx` alone for `T1`/`T7`/`C1`; `(fx, pos, offset)` for
/// `T2..T6`. Both are expressed uniformly by [`Entry::sort_key`].
pub struct ExternalSort;

impl ExternalSort {
    /// Sort `kind`-shaped, `k`-parameterised entries in `[start, end)` under
    /// `memory_budget` bytes. Falls back to an in-memory sort whenever the
    /// whole region already fits the budget.
    pub fn sort(
        store: &EntryStore<'_>,
        start: u64,
        end: u64,
        memory_budget: u64,
    ) -> Result<()> {
        let width = store.width();
        if width == 0 || end <= start {
            return Ok(());
        }
        let n = (end - start) / width;
        if n == 0 {
            return Ok(());
        }

        if n * width <= memory_budget {
            sort_in_memory(store, n)
        } else {
            sort_bucketed(store, n, memory_budget)
        }
    }
}

fn sort_in_memory(store: &EntryStore<'_>, n: u64) -> Result<()> {
    let mut entries: Vec<Entry> = (0..n).map(|row| store.read(row)).collect::<Result<_>>()?;
    entries.sort_by_key(Entry::sort_key);
    for (row, entry) in entries.iter().enumerate() {
        store.write(row as u64, entry)?;
    }
    Ok(())
}

fn bucket_count_for(n: u64, width: u64, memory_budget: u64) -> u64 {
    let entries_per_budget = (memory_budget / width.max(1)).max(1);
    let needed = n.div_ceil(entries_per_budget).max(1);
    needed.max(MIN_BUCKETS).next_power_of_two()
}

/// Extract `shift_bits` bits from the top of a `key_width`-bit key.
fn top_bits(fx: u64, key_width: u32, shift_bits: u32, n_buckets: u64) -> u64 {
    if shift_bits == 0 || shift_bits > key_width {
        return 0;
    }
    (fx >> (key_width - shift_bits)) & (n_buckets - 1)
}

fn sort_bucketed(store: &EntryStore<'_>, n: u64, memory_budget: u64) -> Result<()> {
    let width = store.width();
    let k = store.k();
    let kind = store.kind();
    let n_buckets = bucket_count_for(n, width, memory_budget);
    let shift_bits = n_buckets.trailing_zeros();
    let key_width = f_width(k);

    debug!(n, n_buckets, "distributing table into spill buckets");

    let mut spills: Vec<File> = (0..n_buckets)
        .map(|_| tempfile::tempfile())
        .collect::<std::io::Result<_>>()?;

    for row in 0..n {
        let entry = store.read(row)?;
        let bucket = top_bits(entry.fx(), key_width, shift_bits, n_buckets);
        let bytes = encode(&entry, k, kind);
        spills[bucket as usize].write_all(&bytes)?;
    }

    let mut out_row = 0u64;
    for mut spill in spills {
        spill.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        spill.read_to_end(&mut raw)?;
        if raw.is_empty() {
            continue;
        }
        out_row = absorb(&raw, width, k, kind, memory_budget, store, out_row, 0)?;
    }

    Ok(())
}

/// Absorb one spill bucket's raw bytes: sort and append it if it fits the
/// budget, otherwise recursively re-bucket it by the next slice of key bits.
fn absorb(
    raw: &[u8],
    width: u64,
    k: u32,
    kind: TableKind,
    memory_budget: u64,
    store: &EntryStore<'_>,
    mut out_row: u64,
    depth: u32,
) -> Result<u64> {
    let mut entries: Vec<Entry> = raw
        .chunks_exact(width as usize)
        .map(|chunk| decode(chunk, k, kind))
        .collect();

    let fits = (entries.len() as u64) * width <= memory_budget;
    if fits || depth >= MAX_SKEW_DEPTH {
        entries.sort_by_key(Entry::sort_key);
        for entry in &entries {
            store.write(out_row, entry)?;
            out_row += 1;
        }
        return Ok(out_row);
    }

    let key_width = f_width(k);
    let n_buckets = bucket_count_for(entries.len() as u64, width, memory_budget);
    let shift_bits = key_width.min(depth + n_buckets.trailing_zeros());

    let mut sub_buckets: Vec<Vec<u8>> = (0..n_buckets).map(|_| Vec::new()).collect();
    for entry in &entries {
        let bucket = top_bits(entry.fx(), key_width, shift_bits, n_buckets);
        sub_buckets[bucket as usize].extend_from_slice(&encode(entry, k, kind));
    }

    for sub_raw in sub_buckets {
        if sub_raw.is_empty() {
            continue;
        }
        out_row = absorb(&sub_raw, width, k, kind, memory_budget, store, out_row, depth + 1)?;
    }

    Ok(out_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::TableKind;
    use crate::storage::MemoryStorage;

    fn unsorted_t1_store<'a>(storage: &'a MemoryStorage, k: u32, fxs: &[u64]) -> EntryStore<'a> {
        let store = EntryStore::new(storage, k, TableKind::T1, 0);
        for (row, &fx) in fxs.iter().enumerate() {
            store.write(row as u64, &Entry::T1 { fx, x: row as u64 }).unwrap();
        }
        store
    }

    #[test]
    fn in_memory_sort_orders_by_fx() {
        let storage = MemoryStorage::new();
        let fxs = [50u64, 10, 90, 20, 5];
        let store = unsorted_t1_store(&storage, 18, &fxs);
        let end = store.row_offset(fxs.len() as u64);
        ExternalSort::sort(&store, 0, end, 1 << 20).unwrap();

        let mut expected = fxs.to_vec();
        expected.sort_unstable();
        let got: Vec<u64> = (0..fxs.len() as u64).map(|r| store.read(r).unwrap().fx()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn bucketed_sort_matches_in_memory_sort() {
        let storage_a = MemoryStorage::new();
        let storage_b = MemoryStorage::new();
        let fxs: Vec<u64> = (0..2000u64).map(|i| (i.wrapping_mul(2654435761)) % 1_000_000).collect();
        let store_a = unsorted_t1_store(&storage_a, 18, &fxs);
        let store_b = unsorted_t1_store(&storage_b, 18, &fxs);
        let end = store_a.row_offset(fxs.len() as u64);

        ExternalSort::sort(&store_a, 0, end, 1 << 20).unwrap(); // in-memory path
        ExternalSort::sort(&store_b, 0, end, store_a.width() * 50).unwrap(); // forces bucketing

        let a: Vec<u64> = (0..fxs.len() as u64).map(|r| store_a.read(r).unwrap().fx()).collect();
        let b: Vec<u64> = (0..fxs.len() as u64).map(|r| store_b.read(r).unwrap().fx()).collect();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] <= w[1]));
    }
}
