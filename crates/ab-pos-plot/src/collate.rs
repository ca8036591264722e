//! `Collate` — combines a matched pair's metadata into the next table's
//! collated field, and the `Fx` combinator that ties it to the AES hash.

use crate::aes_hash::Fx;
use crate::params::metadata_width;

/// `Collate(t, L, R) -> C`, `t ∈ [2, 6]`.
///
/// `spec.md`'s §4.4 worked widths and its §3 `VLEN` table disagree with each
/// other starting at `t = 5` (see `DESIGN.md`); this implementation follows
/// the resolved width chain in [`crate::params::COLLATE_MULT`], which keeps
/// `t = 4`'s operation as a concatenation (doubling `2k` to `4k`) rather than
/// the literally-stated XOR, since XOR cannot grow an operand's width.
pub fn collate(t: u8, k: u32, l: u128, r: u128) -> u128 {
    match t {
        2 => l,
        3 => {
            let w = metadata_width(k, 2);
            (l << w) | r
        }
        4 => {
            let w = metadata_width(k, 3);
            (l << w) | r
        }
        5 => {
            let xored = l ^ r;
            let in_w = metadata_width(k, 4);
            let out_w = metadata_width(k, 5);
            truncate_top(xored, in_w, out_w)
        }
        6 => {
            let xored = l ^ r;
            let in_w = metadata_width(k, 5);
            let out_w = metadata_width(k, 6);
            truncate_top(xored, in_w, out_w)
        }
        _ => unreachable!("collate is only defined for t in [2, 6]"),
    }
}

/// Keep the top `out_w` bits of a `in_w`-bit value.
fn truncate_top(value: u128, in_w: u32, out_w: u32) -> u128 {
    value >> (in_w - out_w)
}

/// `Ft(fx_left, metadata_left, metadata_right) -> (fx_next, collated)`.
///
/// Step 1 collates the metadata for the next table; step 2 computes the AES
/// mix `at`; step 3 XORs it with the parent `fx_left` for the forward
/// propagation. Table 7 has no collated field of its own (§4.4): its
/// metadata is discarded once `fx_next` is computed.
pub fn evaluate(fx: &Fx, t: u8, k: u32, fx_left: u64, meta_left: u128, meta_right: u128) -> (u64, u128) {
    let collated = if t == 7 {
        0
    } else {
        collate(t, k, meta_left, meta_right)
    };
    let width = metadata_width(k, t - 1);
    let at = fx.hash(k, width, meta_left, meta_right);
    (at ^ fx_left, collated)
}
