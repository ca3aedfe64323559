//! Fieldcal Python Bindings
//!
//! Exposes the calibration filter from `fieldcal-core` as a single
//! `Instance` class.
//!
//! ## Usage
//!
//! ```python
//! import fieldcal
//!
//! cal = fieldcal.Instance(field_norm=48.5, measurement_noise=0.3)
//!
//! for reading in magnetometer_samples:
//!     cal.update(reading)
//!
//! print(cal.bias, cal.scale)
//! corrected = cal.calibrate(magnetometer_samples[-1])
//! ```

use pyo3::prelude::*;

mod errors;
mod instance;

use errors::FieldcalError;
use instance::PyInstance;

/// Fieldcal Python module
#[pymodule]
fn fieldcal(py: Python, m: &PyModule) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Tri-axial sensor bias and scale calibration")?;

    m.add("FieldcalError", py.get_type::<FieldcalError>())?;
    m.add_class::<PyInstance>()?;

    Ok(())
}
