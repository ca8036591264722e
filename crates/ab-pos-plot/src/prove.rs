//! `Prover` — locates T7 rows whose truncated `f7` matches a challenge and
//! recursively gathers the 64 underlying `x` values.

use crate::entry::{Entry, TableKind};
use crate::entry_store::EntryStore;
use crate::error::{PlotError, Result};
use crate::header::{HEADER_LEN, Header};
use crate::params::{top_k_bits, truncate_k};
use crate::storage::PlotStorage;

/// Start offsets of every table region, `[T1, T2, .., T7, C1]`, recovered by
/// scanning each region for its end-of-table sentinel in turn. `Header`
/// deliberately only retains the *most recent* cursor for resumability (see
/// `DESIGN.md`), so random access back into an earlier table needs this
/// one-time forward scan.
#[derive(Debug, Clone, Copy)]
struct TableOffsets {
    starts: [u64; 8],
}

impl TableOffsets {
    fn scan(storage: &dyn PlotStorage, k: u32) -> Result<Self> {
        let mut starts = [0u64; 8];
        let mut cursor = HEADER_LEN;
        let kinds = [
            TableKind::T1,
            TableKind::Mid(2),
            TableKind::Mid(3),
            TableKind::Mid(4),
            TableKind::Mid(5),
            TableKind::Mid(6),
            TableKind::T7,
            TableKind::C1,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            starts[i] = cursor;
            cursor = scan_table_end(storage, k, kind, cursor)?;
        }
        Ok(Self { starts })
    }

    fn start(&self, t: u8) -> u64 {
        self.starts[t as usize - 1]
    }
}

/// Scan a fixed-width record region from `start` until the all-zero
/// sentinel, returning the offset one record past it.
fn scan_table_end(storage: &dyn PlotStorage, k: u32, kind: TableKind, start: u64) -> Result<u64> {
    let store = EntryStore::new(storage, k, kind, start);
    let total_len = storage.len()?;
    let mut row = 0u64;
    loop {
        let entry = store.read(row)?;
        row += 1;
        if entry.is_sentinel() {
            return Ok(store.row_offset(row));
        }
        if store.row_offset(row) >= total_len {
            return Err(PlotError::Format(format!(
                "table region starting at {start} has no end-of-table sentinel"
            )));
        }
    }
}

/// Finds proofs for a committed plot.
pub struct Prover<'s> {
    storage: &'s dyn PlotStorage,
    header: Header,
    offsets: TableOffsets,
}

impl<'s> Prover<'s> {
    /// Load the header from `storage` and recover table offsets. Fails if
    /// the plot isn't fully committed through the checkpoint table.
    pub fn open(storage: &'s dyn PlotStorage) -> Result<Self> {
        let header = Header::read(storage)?;
        if header.cursor_idx != 8 {
            return Err(PlotError::Format(format!(
                "plot not fully committed: cursor_idx={}",
                header.cursor_idx
            )));
        }
        let offsets = TableOffsets::scan(storage, header.k)?;
        Ok(Self {
            storage,
            header,
            offsets,
        })
    }

    /// Produce a 64-element proof for `challenge`, or `NoProof` if none of
    /// the T7 entries at its bucket truncate to the challenge's top bits.
    pub fn prove(&self, challenge: &[u8; 32]) -> Result<[u64; 64]> {
        let k = self.header.k;
        let target = top_k_bits(challenge, k);

        let c1 = EntryStore::new(self.storage, k, TableKind::C1, self.offsets.start(8));
        let c1_n = self.region_len(&c1, self.storage.len()?)?;

        let mut lower_bound = 0u64;
        for row in 0..c1_n {
            let Entry::C1 { fx, pos } = c1.read(row)? else {
                unreachable!("C1 store only ever yields C1 entries")
            };
            if truncate_k(fx, k) < target {
                lower_bound = pos;
            } else {
                break;
            }
        }

        let t7 = EntryStore::new(self.storage, k, TableKind::T7, self.offsets.start(7));
        let t7_n = self.region_len(&t7, self.offsets.start(8))?;

        let mut candidate = None;
        for row in lower_bound..t7_n {
            let entry = t7.read(row)?;
            let truncated = truncate_k(entry.fx(), k);
            if truncated > target {
                break;
            }
            if truncated == target {
                candidate = Some(entry);
                break;
            }
        }

        let Some(Entry::T7 { pos, offset, .. }) = candidate else {
            return Err(PlotError::NoProof(target));
        };

        self.gather(6, pos, pos + u64::from(offset))
    }

    /// Row count of `store`'s region, which spans `[store.start(), end)`
    /// and ends in one EOT sentinel record.
    fn region_len(&self, store: &EntryStore<'_>, end: u64) -> Result<u64> {
        Ok((end - store.start()) / store.width() - 1)
    }

    fn gather(&self, t: u8, left_pos: u64, right_pos: u64) -> Result<[u64; 64]> {
        let mut out = [0u64; 64];
        self.gather_into(t, left_pos, right_pos, &mut out)?;
        Ok(out)
    }

    fn gather_into(&self, t: u8, left_pos: u64, right_pos: u64, out: &mut [u64]) -> Result<()> {
        let k = self.header.k;
        if t == 1 {
            let store = EntryStore::new(self.storage, k, TableKind::T1, self.offsets.start(1));
            let Entry::T1 { x: lx, .. } = store.read(left_pos)? else {
                unreachable!()
            };
            let Entry::T1 { x: rx, .. } = store.read(right_pos)? else {
                unreachable!()
            };
            out[0] = lx;
            out[1] = rx;
            return Ok(());
        }

        let store = EntryStore::new(self.storage, k, TableKind::Mid(t), self.offsets.start(t));
        let Entry::Mid {
            pos: lp, offset: lo, ..
        } = store.read(left_pos)?
        else {
            unreachable!()
        };
        let Entry::Mid {
            pos: rp, offset: ro, ..
        } = store.read(right_pos)?
        else {
            unreachable!()
        };

        let half = out.len() / 2;
        let (left_out, right_out) = out.split_at_mut(half);
        self.gather_into(t - 1, lp, lp + u64::from(lo), left_out)?;
        self.gather_into(t - 1, rp, rp + u64::from(ro), right_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_bits_reads_the_most_significant_bits() {
        let mut challenge = [0u8; 32];
        challenge[0] = 0b1000_0000;
        assert_eq!(top_k_bits(&challenge, 1), 1);
        assert_eq!(top_k_bits(&challenge, 8), 0b1000_0000);
    }
}
