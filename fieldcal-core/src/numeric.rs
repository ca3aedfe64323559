//! Numeric primitives used by the matrix kernel and the filter
//!
//! Every square root and reciprocal in the crate goes through
//! [`ActivePrimitives`]. By default that is [`LibmPrimitives`]; with the
//! `fast-math` feature it becomes [`NewtonPrimitives`], which refines a cheap
//! bit-level estimate with three Newton-Raphson steps the way DSP targets do
//! with their hardware reciprocal instructions.
//!
//! Both implementations agree to within single-precision rounding, so nothing
//! downstream depends on which one is compiled in.

use crate::constants::NEWTON_ITERATIONS;

/// Scalar primitives with IEEE-754-equivalent results
pub trait NumericPrimitives {
    /// Square root; `sqrt(x) == 0` for `x <= 0` is allowed
    fn sqrt(x: f32) -> f32;

    /// `1 / x`
    fn recip(x: f32) -> f32;

    /// `1 / sqrt(x)`
    fn rsqrt(x: f32) -> f32;

    /// `a / b`, exactly zero when `a` is zero
    fn divide(a: f32, b: f32) -> f32 {
        if a == 0.0 {
            0.0
        } else {
            a * Self::recip(b)
        }
    }
}

/// Library-call primitives backed by `libm`
#[derive(Debug, Clone, Copy, Default)]
pub struct LibmPrimitives;

impl NumericPrimitives for LibmPrimitives {
    #[inline]
    fn sqrt(x: f32) -> f32 {
        libm::sqrtf(x)
    }

    #[inline]
    fn recip(x: f32) -> f32 {
        1.0 / x
    }

    #[inline]
    fn rsqrt(x: f32) -> f32 {
        1.0 / libm::sqrtf(x)
    }
}

/// Estimate-plus-refinement primitives
///
/// Initial guesses come from integer arithmetic on the IEEE-754 bit pattern.
/// Each Newton step roughly doubles the number of correct bits, and three
/// steps reach full `f32` precision from either seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonPrimitives;

impl NumericPrimitives for NewtonPrimitives {
    #[inline]
    fn sqrt(x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x == f32::INFINITY {
            return x;
        }
        x * Self::rsqrt(x)
    }

    #[inline]
    fn recip(x: f32) -> f32 {
        let mut y = f32::from_bits(0x7EF3_11C7u32.wrapping_sub(x.to_bits()));
        for _ in 0..NEWTON_ITERATIONS {
            y = y * (2.0 - x * y);
        }
        y
    }

    #[inline]
    fn rsqrt(x: f32) -> f32 {
        let half = 0.5 * x;
        let mut y = f32::from_bits(0x5F37_59DFu32.wrapping_sub(x.to_bits() >> 1));
        for _ in 0..NEWTON_ITERATIONS {
            y = y * (1.5 - half * y * y);
        }
        y
    }
}

/// Primitives selected at build time
#[cfg(feature = "fast-math")]
pub type ActivePrimitives = NewtonPrimitives;

/// Primitives selected at build time
#[cfg(not(feature = "fast-math"))]
pub type ActivePrimitives = LibmPrimitives;

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f32; 10] = [1e-6, 3.7e-4, 0.01, 0.5, 1.0, 2.0, 3.0, 17.25, 1234.5, 9.9e5];

    fn rel_err(a: f32, b: f32) -> f32 {
        ((a - b) / b).abs()
    }

    #[test]
    fn newton_sqrt_matches_libm() {
        for &x in &SAMPLES {
            let fast = NewtonPrimitives::sqrt(x);
            let reference = LibmPrimitives::sqrt(x);
            assert!(rel_err(fast, reference) < 1e-6, "sqrt({}) = {} vs {}", x, fast, reference);
        }
    }

    #[test]
    fn newton_recip_matches_libm() {
        for &x in &SAMPLES {
            let fast = NewtonPrimitives::recip(x);
            let reference = LibmPrimitives::recip(x);
            assert!(rel_err(fast, reference) < 1e-6, "recip({}) = {} vs {}", x, fast, reference);

            let fast = NewtonPrimitives::recip(-x);
            assert!(rel_err(fast, -reference) < 1e-6);
        }
    }

    #[test]
    fn newton_rsqrt_matches_libm() {
        for &x in &SAMPLES {
            let fast = NewtonPrimitives::rsqrt(x);
            let reference = LibmPrimitives::rsqrt(x);
            assert!(rel_err(fast, reference) < 1e-6, "rsqrt({}) = {} vs {}", x, fast, reference);
        }
    }

    #[test]
    fn field_norm_reciprocals_within_rounding() {
        // recip(1.0) is 0.99999994 on the Newton path, so callers compare with a tolerance
        for &norm in &[1.0f32, 9.81, 48.5, 2352.25] {
            assert!(rel_err(NewtonPrimitives::recip(norm), 1.0 / norm) < 1e-6);
            assert!(rel_err(ActivePrimitives::recip(norm), 1.0 / norm) < 1e-6);
        }
    }

    #[test]
    fn sqrt_of_non_positive() {
        assert_eq!(NewtonPrimitives::sqrt(0.0), 0.0);
        assert_eq!(NewtonPrimitives::sqrt(-4.0), 0.0);
        assert_eq!(LibmPrimitives::sqrt(0.0), 0.0);
    }

    #[test]
    fn divide_zero_numerator() {
        assert_eq!(LibmPrimitives::divide(0.0, 3.0), 0.0);
        assert_eq!(NewtonPrimitives::divide(0.0, 3.0), 0.0);
        assert!(rel_err(NewtonPrimitives::divide(1.0, 3.0), 1.0 / 3.0) < 1e-6);
    }
}
