//! Error Types for Calibration Configuration
//!
//! ## Design Philosophy
//!
//! The calibration core is precondition-driven: the filter update itself never
//! fails. A degenerate cycle is absorbed as "no new information" and the
//! estimate is left untouched. Errors only exist at the configuration
//! boundary, where a caller may prefer a `Result` over a debug assertion.
//!
//! 1. **Small Size**: Variants carry at most one `f32` or one `&'static str`,
//!    so the enum can be returned by value on any target.
//!
//! 2. **No Heap Allocation**: Messages are `&'static str` only.
//!
//! 3. **Copy Semantics**: Errors are `Copy` like the rest of the state.
//!
//! ## Checked vs. Unchecked Setters
//!
//! ```rust
//! use fieldcal_core::{CalibrationState, CalibrationError};
//!
//! let mut cal = CalibrationState::new();
//!
//! // Unchecked: asserts `norm > 0` in debug builds
//! cal.set_field_norm(9.81);
//!
//! // Checked: reports the bad value instead
//! match cal.try_set_field_norm(-1.0) {
//!     Err(CalibrationError::InvalidFieldNorm { value }) => assert_eq!(value, -1.0),
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for checked calibration operations
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Configuration errors reported by the checked API
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// Field norm must be positive and finite
    #[error("Field norm {value} must be positive and finite")]
    InvalidFieldNorm {
        /// The rejected norm
        value: f32,
    },

    /// Measurement noise must be positive and finite
    #[error("Measurement noise {value} must be positive and finite")]
    InvalidMeasurementNoise {
        /// The rejected standard deviation
        value: f32,
    },

    /// Filter configuration is unusable (e.g. non-positive sigma spread)
    #[error("Invalid filter configuration: {reason}")]
    InvalidConfig {
        /// Which constraint was violated
        reason: &'static str,
    },

    /// Measurement contains NaN or infinity
    #[error("Measurement is not a finite vector")]
    NonFiniteMeasurement,
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidFieldNorm { value } =>
                defmt::write!(fmt, "Invalid field norm {}", value),
            Self::InvalidMeasurementNoise { value } =>
                defmt::write!(fmt, "Invalid measurement noise {}", value),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
            Self::NonFiniteMeasurement =>
                defmt::write!(fmt, "Non-finite measurement"),
        }
    }
}

/// Reject NaN/infinite components of a raw reading
pub(crate) fn check_finite(measurement: &[f32; 3]) -> CalibrationResult<()> {
    if measurement.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CalibrationError::NonFiniteMeasurement)
    }
}
