//! Filter configuration
//!
//! ## Unscented Transform Parameters
//!
//! ```text
//! λ      = α²(n + κ) − n
//! spread = n + λ
//!
//! W₀ᵐ = λ / spread
//! W₀ᶜ = W₀ᵐ + (1 − α² + β)
//! Wᵢ  = 1 / (2·spread)        i = 1..2n
//! ```
//!
//! With the defaults (α = 1, β = 2, κ = 3 − n) the spread is 3, so every
//! sigma point sits √3 standard deviations from the mean along one Cholesky
//! direction.
//!
//! ## Initial Covariance
//!
//! The default seeds every diagonal entry with 1e-2 (field-norm² units).
//! That prior holds biases up to about 0.3 of the field magnitude. A bias
//! far outside it is not recovered: the magnitude error is explained by
//! shrinking the scale block toward `D = −|field|·I`, where
//! `∂c/∂b = −(I + D/|field|)` vanishes and the bias stops being observable.
//! Use [`FilterConfig::wide_bias_prior`] when the bias may be comparable to
//! the field itself, as with an uncompensated hard-iron offset.
//!
//! ## Usage
//!
//! ```rust
//! use fieldcal_core::{CalibrationState, FilterConfig};
//!
//! let config = FilterConfig::default()
//!     .with_bias_variance(4.0)
//!     .with_process_noise(1e-9);
//! assert!(config.validate().is_ok());
//!
//! let cal = CalibrationState::with_config(config).unwrap();
//! assert_eq!(cal.covariance().diagonal(0), 4.0);
//! ```

use crate::constants::{
    BIAS_DIM, DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_BIAS_VARIANCE,
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_KAPPA, DEFAULT_SCALE_VARIANCE, STATE_DIM,
    WIDE_BIAS_VARIANCE,
};
use crate::errors::{CalibrationError, CalibrationResult};
use crate::symmetric::Covariance;

/// Unscented transform weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaWeights {
    /// Mean weight of the centre point
    pub mean0: f32,
    /// Covariance weight of the centre point
    pub cov0: f32,
    /// Shared mean/covariance weight of the 2n displaced points
    pub other: f32,
}

/// Calibration filter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Sigma point spread
    pub alpha: f32,
    /// Prior distribution knowledge (2 for Gaussian)
    pub beta: f32,
    /// Secondary spread
    pub kappa: f32,
    /// Initial variance of each bias entry
    pub bias_variance: f32,
    /// Initial variance of each scale/cross-coupling entry
    pub scale_variance: f32,
    /// Variance added to every state entry before each update (random walk)
    pub process_noise: f32,
    /// Largest diagonal variance that counts as converged
    pub convergence_threshold: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            kappa: DEFAULT_KAPPA,
            bias_variance: DEFAULT_BIAS_VARIANCE,
            scale_variance: DEFAULT_SCALE_VARIANCE,
            process_noise: 0.0,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

impl FilterConfig {
    /// Default configuration with a bias prior as wide as the field norm
    pub fn wide_bias_prior() -> Self {
        Self::default().with_bias_variance(WIDE_BIAS_VARIANCE)
    }

    /// Set sigma point spread parameters
    pub fn with_spread(mut self, alpha: f32, beta: f32, kappa: f32) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self.kappa = kappa;
        self
    }

    /// Set initial bias variance
    pub fn with_bias_variance(mut self, variance: f32) -> Self {
        self.bias_variance = variance;
        self
    }

    /// Set initial scale variance
    pub fn with_scale_variance(mut self, variance: f32) -> Self {
        self.scale_variance = variance;
        self
    }

    /// Set process noise (higher = slower convergence, tracks drift)
    pub fn with_process_noise(mut self, variance: f32) -> Self {
        self.process_noise = variance;
        self
    }

    /// Set convergence threshold
    pub fn with_convergence_threshold(mut self, threshold: f32) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// λ = α²(n + κ) − n
    pub fn lambda(&self) -> f32 {
        let n = STATE_DIM as f32;
        self.alpha * self.alpha * (n + self.kappa) - n
    }

    /// n + λ, the factor applied to the covariance before factorization
    pub fn spread(&self) -> f32 {
        STATE_DIM as f32 + self.lambda()
    }

    /// Sigma point weights
    pub fn weights(&self) -> SigmaWeights {
        let spread = self.spread();
        let mean0 = self.lambda() / spread;
        SigmaWeights {
            mean0,
            cov0: mean0 + (1.0 - self.alpha * self.alpha + self.beta),
            other: 0.5 / spread,
        }
    }

    /// Diagonal covariance the filter starts from
    pub fn initial_covariance(&self) -> Covariance<STATE_DIM> {
        let mut diag = [self.scale_variance; STATE_DIM];
        for v in diag.iter_mut().take(BIAS_DIM) {
            *v = self.bias_variance;
        }
        Covariance::from_diagonal(&diag)
    }

    /// Check parameters are usable
    pub fn validate(&self) -> CalibrationResult<()> {
        let spread = self.spread();
        if !(spread > 0.0) || !spread.is_finite() {
            return Err(CalibrationError::InvalidConfig {
                reason: "sigma spread n + lambda must be positive",
            });
        }
        if !(self.alpha > 0.0) {
            return Err(CalibrationError::InvalidConfig {
                reason: "alpha must be positive",
            });
        }
        if !(self.bias_variance > 0.0) || !(self.scale_variance > 0.0) {
            return Err(CalibrationError::InvalidConfig {
                reason: "initial variances must be positive",
            });
        }
        if !(self.process_noise >= 0.0) {
            return Err(CalibrationError::InvalidConfig {
                reason: "process noise must be non-negative",
            });
        }
        if !(self.convergence_threshold > 0.0) {
            return Err(CalibrationError::InvalidConfig {
                reason: "convergence threshold must be positive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SIGMA_COUNT;

    #[test]
    fn default_weights() {
        let config = FilterConfig::default();
        assert_eq!(config.lambda(), -6.0);
        assert_eq!(config.spread(), 3.0);

        let w = config.weights();
        assert_eq!(w.mean0, -2.0);
        assert_eq!(w.cov0, 0.0);
        assert!((w.other - 1.0 / 6.0).abs() < 1e-7);
    }

    #[test]
    fn mean_weights_sum_to_one() {
        for (alpha, kappa) in [(1.0, -6.0), (0.5, 0.0), (1.0, 0.0), (2.0, -5.0)] {
            let w = FilterConfig::default().with_spread(alpha, 2.0, kappa).weights();
            let sum = w.mean0 + (SIGMA_COUNT - 1) as f32 * w.other;
            assert!((sum - 1.0).abs() < 1e-5, "alpha={} kappa={} sum={}", alpha, kappa, sum);
        }
    }

    #[test]
    fn initial_covariance_blocks() {
        let p = FilterConfig::default().initial_covariance();
        for i in 0..3 {
            assert_eq!(p.diagonal(i), DEFAULT_BIAS_VARIANCE);
        }
        for i in 3..9 {
            assert_eq!(p.diagonal(i), DEFAULT_SCALE_VARIANCE);
        }
        assert_eq!(p.get(0, 1), 0.0);
    }

    #[test]
    fn default_seed_is_uniform() {
        let p = FilterConfig::default().initial_covariance();
        for i in 0..STATE_DIM {
            assert_eq!(p.diagonal(i), 1e-2);
        }
    }

    #[test]
    fn wide_bias_prior_only_widens_bias() {
        let config = FilterConfig::wide_bias_prior();
        assert!(config.validate().is_ok());
        assert_eq!(config.bias_variance, WIDE_BIAS_VARIANCE);
        assert_eq!(config.scale_variance, DEFAULT_SCALE_VARIANCE);
        assert_eq!(config.weights(), FilterConfig::default().weights());
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(FilterConfig::default().validate().is_ok());

        // n + κ = 0 collapses the spread
        let config = FilterConfig::default().with_spread(1.0, 2.0, -9.0);
        assert!(matches!(
            config.validate(),
            Err(CalibrationError::InvalidConfig { .. })
        ));

        assert!(FilterConfig::default().with_bias_variance(0.0).validate().is_err());
        assert!(FilterConfig::default().with_scale_variance(f32::NAN).validate().is_err());
        assert!(FilterConfig::default().with_process_noise(-1e-3).validate().is_err());
        assert!(FilterConfig::default().with_convergence_threshold(0.0).validate().is_err());
    }
}
