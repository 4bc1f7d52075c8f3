use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::analyze_session::{analyze_csv_json, analyze_streams_json as analyze_streams};

/// Analyserer en CSV-økt; returnerer rapporten som JSON-streng.
#[pyfunction]
#[pyo3(signature = (path, config_json = None))]
fn analyze_csv(path: &str, config_json: Option<&str>) -> PyResult<String> {
    analyze_csv_json(path, config_json).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Samme som `analyze_csv`, men med Strava-strømmer (key_by_type) som JSON.
#[pyfunction]
#[pyo3(signature = (streams_json, config_json = None))]
fn analyze_streams_json(streams_json: &str, config_json: Option<&str>) -> PyResult<String> {
    analyze_streams(streams_json, config_json).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction]
fn metrics_text() -> String {
    crate::metrics::gather_text()
}

#[pymodule]
fn intervalgraph_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_csv, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_streams_json, m)?)?;
    m.add_function(wrap_pyfunction!(metrics_text, m)?)?;
    Ok(())
}
