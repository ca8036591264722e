//! `EntryStore` — positioned random-access reads and append writes over a
//! table's byte region, with the record width fixed by `(k, kind)`.

use crate::entry::{Entry, TableKind, decode, encode, entry_width_bytes};
use crate::error::Result;
use crate::storage::PlotStorage;

/// A view over one table's fixed-width record region, starting at `start`.
pub struct EntryStore<'s> {
    storage: &'s dyn PlotStorage,
    k: u32,
    kind: TableKind,
    start: u64,
    width: u64,
}

impl std::fmt::Debug for EntryStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("k", &self.k)
            .field("kind", &self.kind)
            .field("start", &self.start)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl<'s> EntryStore<'s> {
    /// Open a store for `kind`-shaped entries under `k`, whose region begins
    /// at byte `start`.
    pub fn new(storage: &'s dyn PlotStorage, k: u32, kind: TableKind, start: u64) -> Self {
        let width = entry_width_bytes(k, kind) as u64;
        Self {
            storage,
            k,
            kind,
            start,
            width,
        }
    }

    /// Fixed width, in bytes, of every record in this store.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Space parameter this store's entries are shaped for.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Table shape this store reads and writes.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Byte offset this store's region begins at.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Byte offset of row `row`.
    pub fn row_offset(&self, row: u64) -> u64 {
        self.start + row * self.width
    }

    /// Write `entry` at `row`.
    pub fn write(&self, row: u64, entry: &Entry) -> Result<()> {
        let bytes = encode(entry, self.k, self.kind);
        self.storage.write_at(self.row_offset(row), &bytes)?;
        Ok(())
    }

    /// Write the end-of-table sentinel at `row` and return the exclusive end
    /// offset of the region (one record past the sentinel).
    pub fn write_eot(&self, row: u64) -> Result<u64> {
        self.write(row, &Entry::zero(self.kind))?;
        Ok(self.row_offset(row + 1))
    }

    /// Read the record at `row`.
    pub fn read(&self, row: u64) -> Result<Entry> {
        let mut buf = vec![0u8; self.width as usize];
        self.storage.read_at(self.row_offset(row), &mut buf)?;
        Ok(decode(&buf, self.k, self.kind))
    }

    /// Stream entries starting at row 0, stopping at the EOT sentinel or at
    /// `end` (exclusive byte offset), whichever comes first.
    pub fn iter(&self, end: u64) -> EntryStoreIter<'_, 's> {
        let end_row = (end - self.start) / self.width;
        EntryStoreIter {
            store: self,
            row: 0,
            end_row,
            done: false,
        }
    }
}

/// Iterator produced by [`EntryStore::iter`].
#[derive(Debug)]
pub struct EntryStoreIter<'a, 's> {
    store: &'a EntryStore<'s>,
    row: u64,
    end_row: u64,
    done: bool,
}

impl Iterator for EntryStoreIter<'_, '_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.row >= self.end_row {
            return None;
        }
        let result = self.store.read(self.row);
        self.row += 1;
        match result {
            Ok(entry) if entry.is_sentinel() => {
                self.done = true;
                None
            }
            Ok(entry) => Some(Ok(entry)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn write_read_and_stream_stops_at_sentinel() {
        let storage = MemoryStorage::new();
        let store = EntryStore::new(&storage, 18, TableKind::T1, 0);
        store.write(0, &Entry::T1 { fx: 1, x: 10 }).unwrap();
        store.write(1, &Entry::T1 { fx: 2, x: 20 }).unwrap();
        let end = store.write_eot(2).unwrap();

        assert_eq!(store.read(0).unwrap(), Entry::T1 { fx: 1, x: 10 });

        let entries: Vec<_> = store.iter(end).map(Result::unwrap).collect();
        assert_eq!(
            entries,
            vec![
                Entry::T1 { fx: 1, x: 10 },
                Entry::T1 { fx: 2, x: 20 },
            ]
        );
    }
}
