//! Measurement calibration transform
//!
//! ```text
//! c = (raw − b) + D·(raw − b) / |field|
//! ```
//!
//! `b` is state[0..3] and `D` is the symmetric matrix packed in state[3..9].
//! Both are stored in field units, so the dimensionless correction is
//! `D / |field|` and rescaling the whole state with the field norm leaves
//! the transform unchanged.
//!
//! The filter predicts each sigma point's measurement with
//! [`squared_norm`], which runs this same transform, so the corrected
//! output and the filter's measurement model cannot drift apart.

use crate::constants::{BIAS_DIM, STATE_DIM};
use crate::matrix::Vector;
use crate::numeric::{ActivePrimitives, NumericPrimitives};
use crate::symmetric::Symmetric3;

/// Apply the bias/scale correction in `state` to a raw reading
pub fn calibrate(state: &Vector<STATE_DIM>, raw: &Vector<3>, field_norm: f32) -> Vector<3> {
    let mut centred = [0.0; 3];
    for i in 0..BIAS_DIM {
        centred[i] = raw[i] - state[i];
    }

    let coupling = Symmetric3::from_state(state).mul_vec(&centred);
    let inv_norm = ActivePrimitives::recip(field_norm);

    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = centred[i] + coupling[i] * inv_norm;
    }
    out
}

/// In-place form of [`calibrate`]
pub fn calibrate_in_place(state: &Vector<STATE_DIM>, value: &mut Vector<3>, field_norm: f32) {
    *value = calibrate(state, value, field_norm);
}

/// Squared magnitude of the calibrated reading
///
/// This is the scalar measurement function `h(x)` of the filter.
#[inline]
pub fn squared_norm(state: &Vector<STATE_DIM>, raw: &Vector<3>, field_norm: f32) -> f32 {
    let c = calibrate(state, raw, field_norm);
    c[0] * c[0] + c[1] * c[1] + c[2] * c[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn zero_state_is_identity() {
        let state = [0.0; STATE_DIM];
        assert_eq!(calibrate(&state, &[1.5, -2.0, 0.25], 1.0), [1.5, -2.0, 0.25]);
        assert_eq!(squared_norm(&state, &[3.0, 4.0, 0.0], 1.0), 25.0);
    }

    #[test]
    fn bias_then_scale() {
        // b = [1, 2, 3], D = diag(1, 0, -0.5) with D[0][1] = 0.5
        let state = [1.0, 2.0, 3.0, 1.0, 0.5, 0.0, 0.0, 0.0, -0.5];
        let out = calibrate(&state, &[2.0, 2.0, 5.0], 1.0);

        // raw − b = [1, 0, 2], D·[1, 0, 2] = [1, 0.5, -1]
        let expected = [2.0, 0.5, 1.0];
        for i in 0..3 {
            assert_relative_eq!(out[i], expected[i], max_relative = 1e-6);
        }
    }

    #[test]
    fn scale_is_relative_to_field_norm() {
        // D(0,0) = 5 at |field| = 50 is a 10% gain correction
        let mut state = [0.0; STATE_DIM];
        state[3] = 5.0;

        let out = calibrate(&state, &[40.0, 10.0, 0.0], 50.0);
        assert_relative_eq!(out[0], 44.0, max_relative = 1e-6);
        assert_relative_eq!(out[1], 10.0, max_relative = 1e-6);
    }

    #[test]
    fn in_place_matches() {
        let state = [0.1, -0.2, 0.3, 0.05, 0.01, -0.02, -0.03, 0.04, 0.02];
        let raw = [0.7, -0.4, 0.9];

        let mut v = raw;
        calibrate_in_place(&state, &mut v, 1.0);
        assert_eq!(v, calibrate(&state, &raw, 1.0));
    }

    proptest! {
        #[test]
        fn in_place_equals_out_of_place(
            state in prop::array::uniform9(-1.0f32..1.0),
            raw in prop::array::uniform3(-100.0f32..100.0),
            norm in 0.1f32..100.0,
        ) {
            let mut v = raw;
            calibrate_in_place(&state, &mut v, norm);
            prop_assert_eq!(v, calibrate(&state, &raw, norm));
        }

        #[test]
        fn measurement_function_is_calibrated_norm(
            state in prop::array::uniform9(-1.0f32..1.0),
            raw in prop::array::uniform3(-100.0f32..100.0),
            norm in 0.1f32..100.0,
        ) {
            let c = calibrate(&state, &raw, norm);
            let expected = c[0] * c[0] + c[1] * c[1] + c[2] * c[2];
            prop_assert_eq!(squared_norm(&state, &raw, norm), expected);
        }
    }
}
