//! Python wrapper around `CalibrationState`
//!
//! The wrapper owns the state by value. `bias`, `scale` and
//! `measurement_count` are read from the state on access, so they always
//! reflect the latest `update`.

use fieldcal_core::{CalibrationState, Estimate};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::errors::{to_py, BindingError};

type Triple = (f32, f32, f32);
type RowMajor3x3 = (f32, f32, f32, f32, f32, f32, f32, f32, f32);

/// Extract a 3-vector from any Python sequence of numbers
fn to_measurement(measurement: &PyAny) -> PyResult<[f32; 3]> {
    let values: Vec<f32> = measurement.extract()?;
    <[f32; 3]>::try_from(values.as_slice())
        .map_err(|_| BindingError::MeasurementLength(values.len()).into())
}

fn triple(v: [f32; 3]) -> Triple {
    (v[0], v[1], v[2])
}

fn row_major(m: [[f32; 3]; 3]) -> RowMajor3x3 {
    (
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    )
}

/// Incremental bias and scale calibration for one tri-axial sensor
///
/// Args:
///     field_norm: Expected magnitude of the field at the sensor (> 0)
///     measurement_noise: Standard deviation of the sensor noise (> 0)
///
/// Raises:
///     FieldcalError: If either argument is not positive and finite
#[pyclass(name = "Instance")]
#[derive(Clone)]
pub struct PyInstance {
    inner: CalibrationState,
}

#[pymethods]
impl PyInstance {
    #[new]
    #[pyo3(signature = (field_norm = 1.0, measurement_noise = 1e-6))]
    fn new(field_norm: f32, measurement_noise: f32) -> PyResult<Self> {
        let mut inner = CalibrationState::new();
        to_py(inner.try_set_field_norm(field_norm))?;
        to_py(inner.try_set_measurement_noise(measurement_noise))?;
        Ok(Self { inner })
    }

    /// Update the calibration estimate with a new raw measurement
    ///
    /// Raises:
    ///     FieldcalError: If the measurement is not 3 finite numbers
    fn update(&mut self, measurement: &PyAny) -> PyResult<()> {
        let raw = to_measurement(measurement)?;
        to_py(self.inner.try_update(&raw))
    }

    /// Apply the current estimate to a raw measurement
    ///
    /// Returns:
    ///     Calibrated measurement as a 3-tuple
    fn calibrate(&self, measurement: &PyAny) -> PyResult<Triple> {
        let raw = to_measurement(measurement)?;
        Ok(triple(self.inner.calibrate(&raw)))
    }

    /// Update with each sample, then calibrate it with the refreshed estimate
    ///
    /// Returns:
    ///     List of calibrated 3-tuples, one per sample
    fn calibrate_series(&mut self, samples: Vec<&PyAny>) -> PyResult<Vec<Triple>> {
        let mut calibrated = Vec::with_capacity(samples.len());
        for sample in samples {
            let raw = to_measurement(sample)?;
            to_py(self.inner.try_update(&raw))?;
            calibrated.push(triple(self.inner.calibrate(&raw)));
        }
        Ok(calibrated)
    }

    /// Discard the estimate and start over with the current settings
    fn reset(&mut self) {
        let field_norm = self.inner.field_norm();
        let measurement_noise = self.inner.measurement_noise();
        self.inner.reset();
        self.inner.set_field_norm(field_norm);
        self.inner.set_measurement_noise(measurement_noise);
    }

    /// Bias and scale together with their variances
    ///
    /// Returns:
    ///     Dictionary with `bias`, `scale`, `bias_variance` and `scale_variance`
    fn estimate_ext(&self, py: Python) -> PyResult<PyObject> {
        let ext = self.inner.estimate_ext();
        let dict = PyDict::new(py);
        dict.set_item("bias", triple(ext.estimate.bias))?;
        dict.set_item("scale", row_major(ext.estimate.scale))?;
        dict.set_item("bias_variance", triple(ext.bias_variance))?;
        dict.set_item("scale_variance", row_major(ext.scale_variance))?;
        Ok(dict.into())
    }

    #[getter]
    fn bias(&self) -> Triple {
        triple(self.estimate().bias)
    }

    /// Stored scale correction (field units) as a row-major 9-tuple
    #[getter]
    fn scale(&self) -> RowMajor3x3 {
        row_major(self.estimate().scale)
    }

    /// Scale correction divided by the field norm, row-major 9-tuple
    #[getter]
    fn relative_scale(&self) -> RowMajor3x3 {
        row_major(self.inner.relative_scale())
    }

    #[getter]
    fn measurement_count(&self) -> u32 {
        self.inner.measurement_count()
    }

    #[getter]
    fn skipped_updates(&self) -> u32 {
        self.inner.skipped_updates()
    }

    #[getter]
    fn field_norm(&self) -> f32 {
        self.inner.field_norm()
    }

    #[setter]
    fn set_field_norm(&mut self, value: f32) -> PyResult<()> {
        to_py(self.inner.try_set_field_norm(value))
    }

    #[getter]
    fn measurement_noise(&self) -> f32 {
        self.inner.measurement_noise()
    }

    #[setter]
    fn set_measurement_noise(&mut self, value: f32) -> PyResult<()> {
        to_py(self.inner.try_set_measurement_noise(value))
    }

    fn __repr__(&self) -> String {
        format!(
            "Instance(field_norm={}, measurement_noise={}, measurement_count={}, state={:?})",
            self.inner.field_norm(),
            self.inner.measurement_noise(),
            self.inner.measurement_count(),
            self.inner.error_state()
        )
    }
}

impl PyInstance {
    fn estimate(&self) -> Estimate {
        self.inner.estimate()
    }
}
