//! Constants for the calibration filter
//!
//! Dimensions are fixed at compile time so every working buffer in the
//! update cycle can live on the stack.

// ===== DIMENSIONS =====

/// Length of the error state vector.
///
/// Three additive bias terms followed by the six independent entries of the
/// symmetric scale/cross-coupling matrix.
pub const STATE_DIM: usize = 9;

/// Number of sigma points in one unscented transform (2n + 1).
pub const SIGMA_COUNT: usize = 2 * STATE_DIM + 1;

/// Number of bias entries at the front of the state vector.
pub const BIAS_DIM: usize = 3;

/// Number of packed entries of a symmetric 3×3 matrix.
pub const SYMMETRIC3_LEN: usize = 6;

// ===== INITIALIZATION DEFAULTS =====

/// Expected field magnitude after initialization.
///
/// Unit norm; callers rescale with `set_field_norm`.
pub const DEFAULT_FIELD_NORM: f32 = 1.0;

/// Measurement noise standard deviation after initialization.
pub const DEFAULT_MEASUREMENT_NOISE: f32 = 1e-6;

/// Initial variance of each bias entry, in units of the squared field norm.
pub const DEFAULT_BIAS_VARIANCE: f32 = 1e-2;

/// Initial variance of each scale/cross-coupling entry.
pub const DEFAULT_SCALE_VARIANCE: f32 = 1e-2;

/// Bias variance of [`FilterConfig::wide_bias_prior`](crate::FilterConfig::wide_bias_prior).
///
/// A bias comparable to the field magnitude is then within one standard
/// deviation of the zero initial estimate.
pub const WIDE_BIAS_VARIANCE: f32 = 1.0;

// ===== UNSCENTED TRANSFORM =====

/// Sigma point spread parameter.
pub const DEFAULT_ALPHA: f32 = 1.0;

/// Prior distribution parameter; 2 is optimal for Gaussian priors.
pub const DEFAULT_BETA: f32 = 2.0;

/// Secondary spread parameter, chosen so that n + kappa = 3.
pub const DEFAULT_KAPPA: f32 = 3.0 - STATE_DIM as f32;

// ===== NUMERICS =====

/// Newton-Raphson refinement steps for the fast reciprocal/square root.
pub const NEWTON_ITERATIONS: usize = 3;

/// Largest diagonal variance considered converged by default.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f32 = 1e-4;

/// Minimum updates before convergence can be reported.
pub const MIN_CONVERGENCE_UPDATES: u32 = 10;
