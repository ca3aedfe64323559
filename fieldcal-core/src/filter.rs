//! Unscented Kalman Filter for Bias and Scale Estimation
//!
//! ## Overview
//!
//! The error state `x` (3 bias + 6 scale entries) is observed only through
//! the magnitude of the calibrated reading. The measurement model is
//! non-linear in `x`, so instead of linearizing it the filter pushes a set
//! of sigma points through it and recombines the results.
//!
//! ## One Update Cycle
//!
//! ```text
//! Square root:   L·Lᵀ = (n + λ)·(P + Q)
//! Sigma points:  χ₀ = x,  χⱼ± = x ± L[:, j]          j = 0..n
//! Prediction:    zᵢ = |(I + D(χᵢ)/|field|)·(raw − b(χᵢ))|²
//! Mean:          ẑ = W₀ᵐ·z₀ + Wᵢ·Σ(zⱼ⁺ + zⱼ⁻)
//! Variance:      Pzz = W₀ᶜ(z₀ − ẑ)² + Wᵢ·Σ[(zⱼ⁺ − ẑ)² + (zⱼ⁻ − ẑ)²] + σ²
//! Cross cov:     Pxz = Wᵢ·Σ L[:, j]·(zⱼ⁺ − zⱼ⁻)
//! Gain:          K = Pxz / Pzz
//! State:         x ← x + K·(|field|² − ẑ)
//! Covariance:    P ← (P + Q) − K·Pxzᵀ = (P + Q) − Pzz·K·Kᵀ
//! ```
//!
//! The process model is the identity, so propagation leaves the sigma
//! points where they are. Process noise `Q` enters only through the
//! covariance that is factorized.
//!
//! ## Numerical Stability
//!
//! - One scaled Cholesky factorization per update; pivots that are not
//!   strictly positive collapse to a zero direction instead of NaN
//! - Rank-1 covariance downdate followed by explicit symmetrization
//! - A predicted variance that is not strictly positive and finite skips
//!   the correction, leaving state and covariance untouched
//!
//! ## Memory
//!
//! Every buffer is a stack array sized by [`STATE_DIM`]; the largest is the
//! 9×9 square root (324 bytes).

use crate::calibrate::squared_norm;
use crate::config::FilterConfig;
use crate::constants::STATE_DIM;
use crate::matrix::{cholesky_scaled, column, multiply_scaled, SquareMatrix, Vector};
use crate::numeric::{ActivePrimitives, NumericPrimitives};
use crate::symmetric::Covariance;

/// Result of one filter cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// State and covariance were corrected
    Corrected {
        /// |field|² − ẑ
        innovation: f32,
        /// Pzz, including measurement noise
        innovation_variance: f32,
    },
    /// Predicted variance was degenerate; nothing was committed
    Skipped,
}

/// Predicted measurements for every sigma point
struct SigmaMeasurements {
    centre: f32,
    plus: Vector<STATE_DIM>,
    minus: Vector<STATE_DIM>,
}

impl SigmaMeasurements {
    fn evaluate(
        state: &Vector<STATE_DIM>,
        sqrt: &SquareMatrix<STATE_DIM>,
        raw: &Vector<3>,
        field_norm: f32,
    ) -> Self {
        let mut plus = [0.0; STATE_DIM];
        let mut minus = [0.0; STATE_DIM];

        for j in 0..STATE_DIM {
            let direction = column(sqrt, j);
            let mut forward = *state;
            let mut backward = *state;
            for k in 0..STATE_DIM {
                forward[k] += direction[k];
                backward[k] -= direction[k];
            }
            plus[j] = squared_norm(&forward, raw, field_norm);
            minus[j] = squared_norm(&backward, raw, field_norm);
        }

        Self {
            centre: squared_norm(state, raw, field_norm),
            plus,
            minus,
        }
    }

    /// Weighted mean ẑ
    ///
    /// Accumulated as offsets from the centre value. The weights sum to one,
    /// so this equals W₀ᵐ·z₀ + Wᵢ·Σ(z⁺ + z⁻) and stays exact when every
    /// sigma point predicts the same value.
    fn mean(&self, weight: f32) -> f32 {
        let mut offset = 0.0;
        for j in 0..STATE_DIM {
            offset += (self.plus[j] - self.centre) + (self.minus[j] - self.centre);
        }
        self.centre + weight * offset
    }

    /// Weighted variance around `mean`, without measurement noise
    fn variance(&self, mean: f32, centre_weight: f32, weight: f32) -> f32 {
        let d0 = self.centre - mean;
        let mut sum = 0.0;
        for j in 0..STATE_DIM {
            let dp = self.plus[j] - mean;
            let dm = self.minus[j] - mean;
            sum += dp * dp + dm * dm;
        }
        centre_weight * d0 * d0 + weight * sum
    }
}

/// Run one predict/correct cycle on a state and its covariance
///
/// `field_norm` is the expected magnitude of the true field and
/// `measurement_noise` the standard deviation of the sensor noise. The
/// caller owns bookkeeping such as update counters.
pub fn unscented_update(
    state: &mut Vector<STATE_DIM>,
    covariance: &mut Covariance<STATE_DIM>,
    raw: &Vector<3>,
    field_norm: f32,
    measurement_noise: f32,
    config: &FilterConfig,
) -> UpdateOutcome {
    let weights = config.weights();

    // P + Q
    let mut prior = *covariance;
    if config.process_noise > 0.0 {
        prior.add_diagonal(config.process_noise);
    }

    let mut sqrt = [[0.0; STATE_DIM]; STATE_DIM];
    let collapsed = cholesky_scaled(prior.as_matrix(), config.spread(), &mut sqrt);
    if collapsed > 0 {
        log_debug!("{} of {} sigma directions collapsed", collapsed, STATE_DIM);
    }

    let sigma = SigmaMeasurements::evaluate(state, &sqrt, raw, field_norm);
    let z_mean = sigma.mean(weights.other);
    let pzz = sigma.variance(z_mean, weights.cov0, weights.other)
        + measurement_noise * measurement_noise;

    if !(pzz > 0.0) || !pzz.is_finite() {
        log_warn!("Skipping correction: predicted measurement variance {}", pzz);
        return UpdateOutcome::Skipped;
    }

    // Pxz = Wᵢ · L · (z⁺ − z⁻)
    let mut z_spread = [[0.0; 1]; STATE_DIM];
    for j in 0..STATE_DIM {
        z_spread[j][0] = sigma.plus[j] - sigma.minus[j];
    }
    let mut pxz = [[0.0; 1]; STATE_DIM];
    multiply_scaled(&sqrt, &z_spread, weights.other, &mut pxz);

    let inv_pzz = ActivePrimitives::recip(pzz);
    let mut gain = [0.0; STATE_DIM];
    for k in 0..STATE_DIM {
        gain[k] = pxz[k][0] * inv_pzz;
    }

    let innovation = field_norm * field_norm - z_mean;
    for k in 0..STATE_DIM {
        state[k] += gain[k] * innovation;
    }

    // P = (P + Q) − K·Pxzᵀ, written as Pzz·K·Kᵀ since Pxz = Pzz·K
    prior.subtract_outer(&gain, pzz);
    *covariance = prior;

    UpdateOutcome::Corrected {
        innovation,
        innovation_variance: pzz,
    }
}
