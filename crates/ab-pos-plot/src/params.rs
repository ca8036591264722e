//! Plot-wide constants and the derived-width helpers used by every table.

use crate::error::{PlotError, Result};

/// Extra bits every `f`-value carries beyond `k`.
pub const EXT: u32 = 5;
/// Bucket-group B parameter.
pub const B: u64 = 60;
/// Bucket-group C parameter.
pub const C: u64 = 509;
/// `B * C`; two entries can only match if their buckets (`fx / BC`) differ by one.
pub const BC: u64 = B * C;
/// Number of match offsets considered per left entry, `1 << EXT`.
pub const M: u64 = 1 << EXT;
/// Minimum permitted `k`.
pub const KMIN: u32 = 18;
/// Maximum permitted `k`.
pub const KMAX: u32 = 50;
/// Every `C1_STRIDE`-th T7 entry is indexed by the checkpoint table.
pub const C1_STRIDE: u64 = 10_000;

/// `1 << EXT`, used to embed the low bits of `x` into `F1`'s output.
pub const EXT_MASK: u64 = M - 1;

/// Multiplier `mult[t]` such that table `t`'s stored collated metadata width
/// is `k * mult[t]` bits, for `t ∈ [2, 6]`.
///
/// `spec.md`'s own `VLEN` table (`{1:1, 2:1, 3:2, 4:4, 5:4, 6:3, 7:2}`) is
/// internally inconsistent with that same document's worked Collate
/// arithmetic in its §4.4 once `t >= 5`: `VLEN[t]` there equals the actual
/// stored width of table `t-1`, not of table `t`. This array is the
/// resolved, self-consistent chain; see `DESIGN.md` for the derivation.
pub const COLLATE_MULT: [u32; 7] = [0, 1, 1, 2, 4, 3, 2];

/// Width in bits of the metadata associated with table `t` (`t ∈ [1, 6]`).
/// `t = 1` is `x` itself (`k` bits, `COLLATE_MULT[1] == 1`); `t ∈ [2, 6]` is
/// the stored collated field. Table 7 carries no collated field.
pub fn metadata_width(k: u32, t: u8) -> u32 {
    debug_assert!((1..=6).contains(&t));
    k * COLLATE_MULT[t as usize]
}

/// Width in bits of the collated metadata stored in table `t` (`t ∈ [2, 6]`).
pub fn collate_width(k: u32, t: u8) -> u32 {
    debug_assert!((2..=6).contains(&t));
    metadata_width(k, t)
}

/// Width in bits of an `f`-value: `k + EXT`.
pub fn f_width(k: u32) -> u32 {
    k + EXT
}

/// Top `k` bits of a 32-byte challenge, as a `u64`.
pub fn top_k_bits(challenge: &[u8; 32], k: u32) -> u64 {
    let mut v: u128 = 0;
    for &b in &challenge[0..16] {
        v = (v << 8) | u128::from(b);
    }
    u64::try_from(v >> (128 - k)).expect("k <= 50 fits u64")
}

/// Truncate an `f`-value (`k+EXT` bits) to its top `k` bits.
pub fn truncate_k(fx: u64, k: u32) -> u64 {
    fx >> EXT.min(f_width(k))
}

/// `bucket(f) = f / BC`.
pub fn bucket(f: u64) -> u64 {
    f / BC
}

/// `(b, c) = ((f mod BC) / C, f mod C)`.
pub fn decompose(f: u64) -> (u64, u64) {
    let r = f % BC;
    (r / C, r % C)
}

/// Validate `k` is within `[KMIN, KMAX]`.
pub fn validate_k(k: u32) -> Result<()> {
    if !(KMIN..=KMAX).contains(&k) {
        return Err(PlotError::Config(format!(
            "k={k} out of range [{KMIN}, {KMAX}]"
        )));
    }
    Ok(())
}

/// Validate a seed is exactly 32 bytes.
///
/// `spec.md`'s `NormalizeKey` padding of short seeds with ASCII `'0'` is a
/// bug preserved by the reference implementation; this crate rejects
/// anything but an exact 32-byte seed instead of reproducing it.
pub fn validate_seed(seed: &[u8]) -> Result<()> {
    if seed.len() != 32 {
        return Err(PlotError::Config(format!(
            "seed must be exactly 32 bytes, got {}",
            seed.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_decompose_roundtrip() {
        let f = 123_456_789u64;
        let (b, c) = decompose(f);
        assert_eq!(b * C + c, f % BC);
        assert_eq!(bucket(f), f / BC);
    }

    #[test]
    fn k_range_rejects_out_of_bounds() {
        assert!(validate_k(17).is_err());
        assert!(validate_k(51).is_err());
        assert!(validate_k(18).is_ok());
        assert!(validate_k(50).is_ok());
    }

    #[test]
    fn seed_must_be_32_bytes() {
        assert!(validate_seed(&[0u8; 31]).is_err());
        assert!(validate_seed(&[0u8; 33]).is_err());
        assert!(validate_seed(&[0u8; 32]).is_ok());
    }
}
