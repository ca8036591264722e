//! `Checkpoint` — builds the sparse C1 index over the sorted T7 table.

use crate::entry::{Entry, TableKind};
use crate::entry_store::EntryStore;
use crate::error::Result;
use crate::header::Header;
use crate::params::C1_STRIDE;
use crate::storage::PlotStorage;
use tracing::info;

/// Streams a sorted T7 region and writes the C1 checkpoint table
/// immediately after it.
pub struct Checkpoint;

impl Checkpoint {
    /// Build C1 over `header`'s committed T7 region and advance the cursor
    /// to `(8, C1.start, C1.end)`.
    pub fn build(storage: &dyn PlotStorage, k: u32, header: &mut Header) -> Result<()> {
        let t7 = EntryStore::new(storage, k, TableKind::T7, header.cursor_beg);
        let t7_n = (header.cursor_end - header.cursor_beg) / t7.width() - 1;

        let c1_start = header.cursor_end;
        let c1 = EntryStore::new(storage, k, TableKind::C1, c1_start);

        let mut out_row = 0u64;
        for row in (0..t7_n).step_by(C1_STRIDE as usize) {
            let entry = t7.read(row)?;
            c1.write(
                out_row,
                &Entry::C1 {
                    fx: entry.fx(),
                    pos: row,
                },
            )?;
            out_row += 1;
        }
        let eot_end = c1.write_eot(out_row)?;
        storage.sync()?;

        info!(entries = out_row, "checkpoint table written");
        header.advance(storage, 8, c1_start, eot_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_LEN;
    use crate::storage::MemoryStorage;

    #[test]
    fn indexes_every_stride_th_row() {
        let storage = MemoryStorage::new();
        let k = 18;
        let mut header = Header::new([0u8; 32], k).unwrap();
        header.write(&storage).unwrap();

        let t7 = EntryStore::new(&storage, k, TableKind::T7, HEADER_LEN);
        let n = (2 * C1_STRIDE + 7) as u64;
        for row in 0..n {
            t7.write(
                row,
                &Entry::T7 {
                    fx: row,
                    pos: 0,
                    offset: 0,
                },
            )
            .unwrap();
        }
        let eot_end = t7.write_eot(n).unwrap();
        header.advance(&storage, 7, HEADER_LEN, eot_end).unwrap();

        Checkpoint::build(&storage, k, &mut header).unwrap();
        assert_eq!(header.cursor_idx, 8);

        let c1 = EntryStore::new(&storage, k, TableKind::C1, header.cursor_beg);
        assert_eq!(c1.read(0).unwrap(), Entry::C1 { fx: 0, pos: 0 });
        assert_eq!(
            c1.read(1).unwrap(),
            Entry::C1 {
                fx: C1_STRIDE,
                pos: C1_STRIDE
            }
        );
    }
}
