//! Error handling for the Python bindings
//!
//! ## Design Philosophy
//!
//! Every failure the bindings can raise is a bad argument: a non-positive
//! field norm, a measurement of the wrong length, a NaN component. These
//! all surface as `FieldcalError`, a subclass of `ValueError`, so callers
//! can catch either the specific or the built-in type.
//!
//! Rust errors are collected in [`BindingError`] and converted to a Python
//! exception at the `#[pymethods]` boundary through `From`.

use fieldcal_core::CalibrationError;
use pyo3::create_exception;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

create_exception!(
    fieldcal,
    FieldcalError,
    PyValueError,
    "Raised for invalid calibration parameters or measurements."
);

/// Errors raised by the bindings before they reach Python
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("{0}")]
    Calibration(CalibrationError),

    #[error("Measurement must be a sequence with 3 items (got {0})")]
    MeasurementLength(usize),
}

impl From<CalibrationError> for BindingError {
    fn from(err: CalibrationError) -> Self {
        Self::Calibration(err)
    }
}

impl From<BindingError> for PyErr {
    fn from(err: BindingError) -> Self {
        FieldcalError::new_err(err.to_string())
    }
}

/// Shorthand for `?` on core results inside `#[pymethods]`
pub fn to_py<T>(result: Result<T, CalibrationError>) -> PyResult<T> {
    result.map_err(|err| BindingError::from(err).into())
}

