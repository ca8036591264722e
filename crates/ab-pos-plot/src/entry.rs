//! Tagged entry records, one variant per table shape, replacing the
//! reference's pointer-typed optional fields (see `DESIGN.md`).

use crate::bitpack::{BitReader, BitWriter};
use crate::params;

/// Which table shape an entry belongs to. `Mid(t)` covers `t ∈ [2, 6]`,
/// which all share the `(fx, pos, offset, collated)` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `(fx, x)`.
    T1,
    /// `(fx, pos, offset, collated)` for table `t`.
    Mid(u8),
    /// `(fx, pos, offset)`, no collated field.
    T7,
    /// `(fx, pos)`, the checkpoint table.
    C1,
}

/// A single plot entry. The tag fixes the record's width for its table;
/// width is never inferred per-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Table 1: `fx = F1(x)`.
    T1 {
        /// `F1(x)`.
        fx: u64,
        /// The raw `x` value.
        x: u64,
    },
    /// Tables 2 through 6.
    Mid {
        /// `Ft(...)`.
        fx: u64,
        /// Row index of the left parent in the previous table.
        pos: u64,
        /// `right_row - pos`.
        offset: u32,
        /// `Collate(t, ...)` output.
        collated: u128,
    },
    /// Table 7, the last forward-propagated table.
    T7 {
        /// `F7(...)`.
        fx: u64,
        /// Row index of the left parent in table 6.
        pos: u64,
        /// `right_row - pos`.
        offset: u32,
    },
    /// Checkpoint table entry.
    C1 {
        /// `fx` copied from the indexed T7 row.
        fx: u64,
        /// Absolute row index of that T7 row.
        pos: u64,
    },
}

impl Entry {
    /// This entry's `f`-value.
    pub fn fx(&self) -> u64 {
        match *self {
            Entry::T1 { fx, .. }
            | Entry::Mid { fx, .. }
            | Entry::T7 { fx, .. }
            | Entry::C1 { fx, .. } => fx,
        }
    }

    /// `(fx, pos, offset)` sort key — `pos`/`offset` default to zero for
    /// variants that lack them, matching §4.7's "`fx` ascending" contract
    /// for `T1`/`T7`/`C1` and "`(fx, pos, offset)`" for `T2..T6`.
    pub fn sort_key(&self) -> (u64, u64, u32) {
        match *self {
            Entry::T1 { fx, .. } => (fx, 0, 0),
            Entry::Mid {
                fx, pos, offset, ..
            } => (fx, pos, offset),
            Entry::T7 { fx, pos, offset } => (fx, pos, offset),
            Entry::C1 { fx, pos } => (fx, pos, 0),
        }
    }

    /// Whether this is the all-zero end-of-table sentinel for `kind`.
    pub fn is_sentinel(&self) -> bool {
        *self == Entry::zero(self.kind())
    }

    fn kind(&self) -> TableKind {
        match self {
            Entry::T1 { .. } => TableKind::T1,
            Entry::Mid { .. } => TableKind::Mid(0), // width-irrelevant for equality checks
            Entry::T7 { .. } => TableKind::T7,
            Entry::C1 { .. } => TableKind::C1,
        }
    }

    /// The all-zero record for `kind`, used both as the EOT sentinel and as
    /// the comparison target for [`Entry::is_sentinel`].
    pub fn zero(kind: TableKind) -> Entry {
        match kind {
            TableKind::T1 => Entry::T1 { fx: 0, x: 0 },
            TableKind::Mid(_) => Entry::Mid {
                fx: 0,
                pos: 0,
                offset: 0,
                collated: 0,
            },
            TableKind::T7 => Entry::T7 {
                fx: 0,
                pos: 0,
                offset: 0,
            },
            TableKind::C1 => Entry::C1 { fx: 0, pos: 0 },
        }
    }
}

/// Width in bits of an entry of `kind` under space parameter `k`.
pub fn entry_width_bits(k: u32, kind: TableKind) -> u32 {
    let f_w = params::f_width(k);
    match kind {
        TableKind::T1 => f_w + k,
        TableKind::Mid(t) => f_w + 64 + 32 + params::collate_width(k, t),
        TableKind::T7 => f_w + 64 + 32,
        TableKind::C1 => f_w + 64,
    }
}

/// Width in bytes (rounded up) of an entry of `kind` under `k`.
pub fn entry_width_bytes(k: u32, kind: TableKind) -> usize {
    entry_width_bits(k, kind).div_ceil(8) as usize
}

/// Encode `entry` (which must match `kind`) into a fixed-width, zero-padded
/// byte record.
pub fn encode(entry: &Entry, k: u32, kind: TableKind) -> Vec<u8> {
    let f_w = params::f_width(k);
    let mut w = BitWriter::new();
    match (entry, kind) {
        (Entry::T1 { fx, x }, TableKind::T1) => {
            w.push(u128::from(*fx), f_w);
            w.push(u128::from(*x), k);
        }
        (
            Entry::Mid {
                fx,
                pos,
                offset,
                collated,
            },
            TableKind::Mid(t),
        ) => {
            w.push(u128::from(*fx), f_w);
            w.push(u128::from(*pos), 64);
            w.push(u128::from(*offset), 32);
            w.push(*collated, params::collate_width(k, t));
        }
        (Entry::T7 { fx, pos, offset }, TableKind::T7) => {
            w.push(u128::from(*fx), f_w);
            w.push(u128::from(*pos), 64);
            w.push(u128::from(*offset), 32);
        }
        (Entry::C1 { fx, pos }, TableKind::C1) => {
            w.push(u128::from(*fx), f_w);
            w.push(u128::from(*pos), 64);
        }
        _ => panic!("entry variant does not match table kind"),
    }
    let bytes = w.into_bytes();
    let want = entry_width_bytes(k, kind);
    debug_assert!(bytes.len() <= want);
    let mut padded = bytes;
    padded.resize(want, 0);
    padded
}

/// Decode a fixed-width record previously written by [`encode`].
pub fn decode(bytes: &[u8], k: u32, kind: TableKind) -> Entry {
    let f_w = params::f_width(k);
    let mut r = BitReader::new(bytes);
    match kind {
        TableKind::T1 => Entry::T1 {
            fx: r.take(f_w) as u64,
            x: r.take(k) as u64,
        },
        TableKind::Mid(t) => Entry::Mid {
            fx: r.take(f_w) as u64,
            pos: r.take(64) as u64,
            offset: r.take(32) as u32,
            collated: r.take(params::collate_width(k, t)),
        },
        TableKind::T7 => Entry::T7 {
            fx: r.take(f_w) as u64,
            pos: r.take(64) as u64,
            offset: r.take(32) as u32,
        },
        TableKind::C1 => Entry::C1 {
            fx: r.take(f_w) as u64,
            pos: r.take(64) as u64,
        },
    }
}
