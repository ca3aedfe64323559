//! Per-sensor calibration state
//!
//! [`CalibrationState`] is a plain value: the error state, its covariance,
//! the two configuration scalars and a few counters. It owns no resources
//! and shares nothing with other instances; run one per sensor.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ─┬─> set_field_norm / set_measurement_noise
//!        └─> update ... update ─> estimate / calibrate
//!                                   │
//!                   reset() <───────┘
//! ```
//!
//! Unchecked setters follow a precondition contract and `debug_assert!`
//! their arguments. The `try_*` variants validate and return
//! [`CalibrationError`] instead.

use crate::calibrate;
use crate::config::FilterConfig;
use crate::constants::{
    BIAS_DIM, DEFAULT_FIELD_NORM, DEFAULT_MEASUREMENT_NOISE, MIN_CONVERGENCE_UPDATES, STATE_DIM,
};
use crate::errors::{check_finite, CalibrationError, CalibrationResult};
use crate::filter::{unscented_update, UpdateOutcome};
use crate::matrix::{SquareMatrix, Vector};
use crate::numeric::{ActivePrimitives, NumericPrimitives};
use crate::symmetric::{Covariance, Symmetric3};

/// Current bias and scale estimate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    /// Additive bias, sensor units
    pub bias: Vector<3>,
    /// Symmetric scale/cross-coupling correction in field units, row-major
    pub scale: SquareMatrix<3>,
}

/// Estimate together with its variances
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EstimateExt {
    /// Bias and scale
    pub estimate: Estimate,
    /// Variance of each bias entry
    pub bias_variance: Vector<3>,
    /// Variance of each scale entry, mirrored like `estimate.scale`
    pub scale_variance: SquareMatrix<3>,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Estimate {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "bias=[{}, {}, {}] scale=[{}, {}, {}, {}, {}, {}]",
            self.bias[0], self.bias[1], self.bias[2],
            self.scale[0][0], self.scale[0][1], self.scale[0][2],
            self.scale[1][1], self.scale[1][2], self.scale[2][2],
        )
    }
}

/// Calibration filter instance for one tri-axial sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    /// Bias (0..3) followed by packed scale entries (3..9)
    error_state: Vector<STATE_DIM>,
    /// Covariance of `error_state`
    covariance: Covariance<STATE_DIM>,
    /// Expected magnitude of the true field
    field_norm: f32,
    /// Standard deviation of measurement noise
    measurement_noise: f32,
    /// Calls to `update`
    measurement_count: u32,
    /// Updates whose correction was skipped
    skipped_updates: u32,
    config: FilterConfig,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationState {
    /// Fresh instance with the default filter configuration
    ///
    /// Zero state, unit field norm, measurement noise of 1e-6 and a seeded
    /// diagonal covariance.
    pub fn new() -> Self {
        Self::from_config(FilterConfig::default())
    }

    /// Fresh instance with a custom filter configuration
    pub fn with_config(config: FilterConfig) -> CalibrationResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: FilterConfig) -> Self {
        Self {
            error_state: [0.0; STATE_DIM],
            covariance: config.initial_covariance(),
            field_norm: DEFAULT_FIELD_NORM,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
            measurement_count: 0,
            skipped_updates: 0,
            config,
        }
    }

    /// Return to the freshly initialized state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::from_config(self.config);
    }

    /// Set the expected field magnitude
    ///
    /// If `norm` differs from the current value, the error state is scaled
    /// by `norm / current` and the covariance by its square.
    pub fn set_field_norm(&mut self, norm: f32) {
        debug_assert!(norm > 0.0, "field norm must be positive");

        if (norm - self.field_norm).abs() < f32::EPSILON {
            return;
        }

        let ratio = ActivePrimitives::divide(norm, self.field_norm);
        for v in self.error_state.iter_mut() {
            *v *= ratio;
        }
        self.covariance.scale_by(ratio * ratio);

        log_debug!("Field norm {} -> {} (ratio {})", self.field_norm, norm, ratio);
        self.field_norm = norm;
    }

    /// Checked [`set_field_norm`](Self::set_field_norm)
    pub fn try_set_field_norm(&mut self, norm: f32) -> CalibrationResult<()> {
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(CalibrationError::InvalidFieldNorm { value: norm });
        }
        self.set_field_norm(norm);
        Ok(())
    }

    /// Expected field magnitude
    pub fn field_norm(&self) -> f32 {
        self.field_norm
    }

    /// Set the measurement noise standard deviation
    pub fn set_measurement_noise(&mut self, noise: f32) {
        debug_assert!(noise > 0.0, "measurement noise must be positive");
        self.measurement_noise = noise;
    }

    /// Checked [`set_measurement_noise`](Self::set_measurement_noise)
    pub fn try_set_measurement_noise(&mut self, noise: f32) -> CalibrationResult<()> {
        if !(noise > 0.0) || !noise.is_finite() {
            return Err(CalibrationError::InvalidMeasurementNoise { value: noise });
        }
        self.measurement_noise = noise;
        Ok(())
    }

    /// Measurement noise standard deviation
    pub fn measurement_noise(&self) -> f32 {
        self.measurement_noise
    }

    /// Number of `update` calls since initialization
    pub fn measurement_count(&self) -> u32 {
        self.measurement_count
    }

    /// Number of updates that skipped their correction
    pub fn skipped_updates(&self) -> u32 {
        self.skipped_updates
    }

    /// Run one filter cycle on a raw reading
    ///
    /// Never fails. A cycle with a degenerate predicted variance leaves the
    /// estimate untouched; the measurement counter advances either way.
    pub fn update(&mut self, measurement: &[f32; 3]) {
        let outcome = unscented_update(
            &mut self.error_state,
            &mut self.covariance,
            measurement,
            self.field_norm,
            self.measurement_noise,
            &self.config,
        );

        if outcome == UpdateOutcome::Skipped {
            self.skipped_updates = self.skipped_updates.wrapping_add(1);
        }
        self.measurement_count = self.measurement_count.wrapping_add(1);
    }

    /// [`update`](Self::update) that rejects NaN/infinite readings first
    ///
    /// A rejected reading does not count as a measurement.
    pub fn try_update(&mut self, measurement: &[f32; 3]) -> CalibrationResult<()> {
        check_finite(measurement)?;
        self.update(measurement);
        Ok(())
    }

    /// Current bias and scale estimate
    ///
    /// Both are the stored error state: the bias and the six packed scale
    /// entries expanded into a symmetric matrix, all in field units.
    pub fn estimate(&self) -> Estimate {
        let mut bias = [0.0; 3];
        bias.copy_from_slice(&self.error_state[..BIAS_DIM]);

        Estimate {
            bias,
            scale: Symmetric3::from_state(&self.error_state).to_matrix(),
        }
    }

    /// Estimate plus the covariance diagonal, laid out the same way
    pub fn estimate_ext(&self) -> EstimateExt {
        let diagonal = self.covariance.diagonal_vector();

        let mut bias_variance = [0.0; 3];
        bias_variance.copy_from_slice(&diagonal[..BIAS_DIM]);

        EstimateExt {
            estimate: self.estimate(),
            bias_variance,
            scale_variance: Symmetric3::from_state(&diagonal).to_matrix(),
        }
    }

    /// Scale correction relative to the field norm
    ///
    /// `calibrate(raw) == (I + relative_scale())·(raw − bias)`, so a
    /// diagonal entry of 0.04 is a 4% gain error on that axis.
    pub fn relative_scale(&self) -> SquareMatrix<3> {
        let inv_norm = ActivePrimitives::recip(self.field_norm);
        let mut m = Symmetric3::from_state(&self.error_state).to_matrix();
        for row in m.iter_mut() {
            for v in row.iter_mut() {
                *v *= inv_norm;
            }
        }
        m
    }

    /// Correct a raw reading with the current estimate
    pub fn calibrate(&self, raw: &[f32; 3]) -> [f32; 3] {
        calibrate::calibrate(&self.error_state, raw, self.field_norm)
    }

    /// Correct a reading in place
    pub fn calibrate_in_place(&self, value: &mut [f32; 3]) {
        calibrate::calibrate_in_place(&self.error_state, value, self.field_norm);
    }

    /// Raw error state: bias then packed scale entries, both in field units
    pub fn error_state(&self) -> &Vector<STATE_DIM> {
        &self.error_state
    }

    /// State covariance
    pub fn covariance(&self) -> &Covariance<STATE_DIM> {
        &self.covariance
    }

    /// Filter configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Whether every state variance is below the convergence threshold
    pub fn is_converged(&self) -> bool {
        self.covariance.max_diagonal() < self.config.convergence_threshold
            && self.measurement_count >= MIN_CONVERGENCE_UPDATES
    }
}
