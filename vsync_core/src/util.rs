//! Integer division helpers for the prediction grid math.

use crate::time::Nsecs;

/// Floor division for a positive divisor.
///
/// `i64::div_euclid` rounds toward negative infinity when the divisor is
/// positive, which is exactly the floor semantics the ordinal computation
/// needs; truncating division would round ordinals for references earlier
/// than the anchor toward the anchor and predict a point in the past.
#[inline]
pub fn div_floor(a: Nsecs, b: Nsecs) -> Nsecs {
    debug_assert!(b > 0, "div_floor requires a positive divisor");
    a.div_euclid(b)
}

/// Ceiling division for a positive divisor.
#[inline]
pub fn div_ceil(a: Nsecs, b: Nsecs) -> Nsecs {
    debug_assert!(b > 0, "div_ceil requires a positive divisor");
    -(-a).div_euclid(b)
}

/// Round `k` up to the next multiple of `n` (n > 0). Works for negative `k`.
#[inline]
pub fn round_up_to_multiple(k: Nsecs, n: Nsecs) -> Nsecs {
    div_ceil(k, n) * n
}
