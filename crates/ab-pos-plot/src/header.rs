//! Fixed-size plot header carrying the resumable build cursor.

use crate::error::{PlotError, Result};
use crate::params;
use crate::storage::PlotStorage;

const MAGIC: &[u8; 19] = b"Proof of Space Plot";

const OFF_MAGIC: u64 = 0;
const OFF_PLOT_ID: u64 = 19;
const OFF_K: u64 = 51;
const OFF_CURSOR_IDX: u64 = 52;
const OFF_CURSOR_BEG: u64 = 53;
const OFF_CURSOR_END: u64 = 61;
/// Byte offset at which the first table region (T1) begins.
pub const HEADER_LEN: u64 = 69;

/// The plot header: magic, plot id, `k`, and the resume cursor
/// `(table_idx, start, end)`. `table_idx` runs `0` (header only) through `8`
/// (checkpoint table C1 committed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The 32-byte plot seed.
    pub plot_id: [u8; 32],
    /// Space parameter.
    pub k: u32,
    /// Index of the last fully committed table; `0` means only the header
    /// itself is committed, `8` means the checkpoint table is done.
    pub cursor_idx: u8,
    /// Start byte offset of the last committed table's region.
    pub cursor_beg: u64,
    /// End byte offset (exclusive) of the last committed table's region.
    pub cursor_end: u64,
}

impl Header {
    /// A fresh header for a brand new plot: nothing committed beyond the
    /// header itself.
    pub fn new(plot_id: [u8; 32], k: u32) -> Result<Self> {
        params::validate_k(k)?;
        Ok(Self {
            plot_id,
            k,
            cursor_idx: 0,
            cursor_beg: HEADER_LEN,
            cursor_end: HEADER_LEN,
        })
    }

    /// Encode and write the header, fsyncing so a crash afterward always
    /// observes a consistent cursor.
    pub fn write(&self, storage: &dyn PlotStorage) -> Result<()> {
        let mut buf = [0u8; HEADER_LEN as usize];
        buf[0..19].copy_from_slice(MAGIC);
        buf[19..51].copy_from_slice(&self.plot_id);
        buf[51] = u8::try_from(self.k).expect("k <= 50 fits u8");
        buf[52] = self.cursor_idx;
        buf[53..61].copy_from_slice(&self.cursor_beg.to_be_bytes());
        buf[61..69].copy_from_slice(&self.cursor_end.to_be_bytes());
        storage.write_at(0, &buf)?;
        storage.sync()?;
        Ok(())
    }

    /// Read and validate a header from `storage`.
    pub fn read(storage: &dyn PlotStorage) -> Result<Self> {
        let len = storage.len()?;
        if len < HEADER_LEN {
            return Err(PlotError::Format("plot file shorter than header".into()));
        }
        let mut buf = [0u8; HEADER_LEN as usize];
        storage.read_at(0, &mut buf)?;

        if &buf[0..19] != MAGIC {
            return Err(PlotError::Format("magic mismatch".into()));
        }
        let mut plot_id = [0u8; 32];
        plot_id.copy_from_slice(&buf[19..51]);
        let k = u32::from(buf[51]);
        params::validate_k(k)?;
        let cursor_idx = buf[52];
        if cursor_idx > 8 {
            return Err(PlotError::Format(format!(
                "cursor index {cursor_idx} out of range [0, 8]"
            )));
        }
        let cursor_beg = u64::from_be_bytes(buf[53..61].try_into().unwrap());
        let cursor_end = u64::from_be_bytes(buf[61..69].try_into().unwrap());
        if cursor_end < cursor_beg {
            return Err(PlotError::Format("cursor end precedes cursor start".into()));
        }

        Ok(Self {
            plot_id,
            k,
            cursor_idx,
            cursor_beg,
            cursor_end,
        })
    }

    /// Advance the cursor to `(idx, beg, end)` and persist it. Callers must
    /// only do this after the corresponding table region is fully written
    /// and the storage has been synced once already for that region's data.
    pub fn advance(&mut self, storage: &dyn PlotStorage, idx: u8, beg: u64, end: u64) -> Result<()> {
        self.cursor_idx = idx;
        self.cursor_beg = beg;
        self.cursor_end = end;
        self.write(storage)
    }

    #[allow(dead_code, reason = "offsets documented for external readers")]
    const OFFSETS: [u64; 6] = [
        OFF_MAGIC,
        OFF_PLOT_ID,
        OFF_K,
        OFF_CURSOR_IDX,
        OFF_CURSOR_BEG,
        OFF_CURSOR_END,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn write_then_read_roundtrip() {
        let storage = MemoryStorage::new();
        let header = Header::new([7u8; 32], 18).unwrap();
        header.write(&storage).unwrap();
        let read_back = Header::read(&storage).unwrap();
        assert_eq!(header, read_back);
    }

    #[test]
    fn rejects_bad_magic() {
        let storage = MemoryStorage::new();
        storage.write_at(0, &[0u8; HEADER_LEN as usize]).unwrap();
        assert!(Header::read(&storage).is_err());
    }

    #[test]
    fn advance_persists_cursor() {
        let storage = MemoryStorage::new();
        let mut header = Header::new([1u8; 32], 18).unwrap();
        header.write(&storage).unwrap();
        header.advance(&storage, 1, HEADER_LEN, HEADER_LEN + 100).unwrap();
        let read_back = Header::read(&storage).unwrap();
        assert_eq!(read_back.cursor_idx, 1);
        assert_eq!(read_back.cursor_end, HEADER_LEN + 100);
    }
}
