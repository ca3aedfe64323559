//! Attitude-independent calibration for tri-axial sensors
//!
//! Estimates the bias and the symmetric scale/cross-coupling error of a
//! magnetometer or accelerometer from raw readings alone. The only external
//! reference is the magnitude of the field the sensor sits in.
//!
//! Key constraints:
//! - Single precision throughout
//! - No heap allocation, every buffer is sized at compile time
//! - One update is bounded by a single 9×9 Cholesky factorization
//!
//! ```no_run
//! use fieldcal_core::CalibrationState;
//!
//! let mut cal = CalibrationState::new();
//! cal.set_field_norm(48.5);     // local field magnitude, µT
//! cal.set_measurement_noise(0.3);
//!
//! // Feed every raw reading
//! cal.update(&[21.3, -4.1, 43.9]);
//!
//! // Correct readings with the current estimate
//! let corrected = cal.calibrate(&[21.3, -4.1, 43.9]);
//! # let _ = corrected;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod calibrate;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod matrix;
pub mod numeric;
pub mod state;
pub mod symmetric;

// Public API
pub use config::FilterConfig;
pub use errors::{CalibrationError, CalibrationResult};
pub use numeric::{ActivePrimitives, NumericPrimitives};
pub use state::{CalibrationState, Estimate, EstimateExt};
pub use symmetric::{Covariance, Symmetric3};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
