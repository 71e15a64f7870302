//! IEEE-754 constants and floating-point predicates.
//!
//! The distribution layer needs a small, fixed set of floating-point
//! facilities: the canonical NaN/Inf/signed-zero bit patterns in single and
//! double precision, classification predicates, and `log1p`. They are grouped
//! here so the sampling code never reaches for platform intrinsics directly.

/// Canonical quiet-NaN bit pattern, double precision.
pub const F64_NAN_BITS: u64 = 0x7FF8_0000_0000_0000;

/// Positive infinity bit pattern, double precision.
pub const F64_INF_BITS: u64 = 0x7FF0_0000_0000_0000;

/// Negative zero bit pattern, double precision.
pub const F64_NEG_ZERO_BITS: u64 = 0x8000_0000_0000_0000;

/// Canonical quiet-NaN bit pattern, single precision.
pub const F32_NAN_BITS: u32 = 0x7FC0_0000;

/// Positive infinity bit pattern, single precision.
pub const F32_INF_BITS: u32 = 0x7F80_0000;

/// Negative zero bit pattern, single precision.
pub const F32_NEG_ZERO_BITS: u32 = 0x8000_0000;

/// Canonical double-precision quiet NaN.
#[inline]
pub fn nan() -> f64 {
    f64::from_bits(F64_NAN_BITS)
}

/// Double-precision positive infinity.
#[inline]
pub fn inf() -> f64 {
    f64::from_bits(F64_INF_BITS)
}

/// Double-precision negative zero.
#[inline]
pub fn neg_zero() -> f64 {
    f64::from_bits(F64_NEG_ZERO_BITS)
}

/// True when `x` is NaN.
#[inline]
pub fn isnan(x: f64) -> bool {
    x.is_nan()
}

/// True when `x` is positive or negative infinity.
#[inline]
pub fn isinf(x: f64) -> bool {
    x.is_infinite()
}

/// True when `x` is neither NaN nor infinite.
#[inline]
pub fn isfinite(x: f64) -> bool {
    x.is_finite()
}

/// True when the sign bit of `x` is set (including negative zero and NaN
/// with a set sign bit).
#[inline]
pub fn signbit(x: f64) -> bool {
    x.is_sign_negative()
}

/// `ln(1 + x)`, accurate near zero.
#[inline]
pub fn log1p(x: f64) -> f64 {
    x.ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nan_bits_round_trip() {
        assert!(isnan(nan()));
        assert_eq!(nan().to_bits(), F64_NAN_BITS);
        assert!(f32::from_bits(F32_NAN_BITS).is_nan());
    }

    #[test]
    fn infinity_classification() {
        assert!(isinf(inf()));
        assert!(isinf(-inf()));
        assert!(!isfinite(inf()));
        assert!(isfinite(0.0));
        assert_eq!(f32::from_bits(F32_INF_BITS), f32::INFINITY);
    }

    #[test]
    fn signed_zero() {
        let nz = neg_zero();
        assert_eq!(nz, 0.0);
        assert!(signbit(nz));
        assert!(!signbit(0.0));
        assert_eq!(f32::from_bits(F32_NEG_ZERO_BITS), -0.0_f32);
    }

    #[test]
    fn log1p_near_zero() {
        // Naive ln(1 + x) loses all precision at 1e-300; log1p must not.
        assert_relative_eq!(log1p(1e-300), 1e-300, epsilon = 1e-315);
        assert_relative_eq!(log1p(1.0), std::f64::consts::LN_2, epsilon = 1e-15);
        assert_eq!(log1p(-1.0), f64::NEG_INFINITY);
    }
}
