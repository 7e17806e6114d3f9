//! Python bindings for doe-sampler.
//!
//! This module exposes design generation to Python using PyO3. Enable the
//! `python` feature to use this.

use pyo3::prelude::*;
use pyo3::types::PyList;

use crate::builder::{DesignBuilder, DEFAULT_KEEP, DEFAULT_STRENGTH};
use crate::design::Design;

/// Python wrapper for Design
#[pyclass(name = "Design")]
pub struct PyDesign {
    inner: Design,
}

#[pymethods]
impl PyDesign {
    /// Get the number of runs.
    #[getter]
    fn runs(&self) -> usize {
        self.inner.runs()
    }

    /// Get the number of factors.
    #[getter]
    fn factors(&self) -> usize {
        self.inner.factors()
    }

    /// Get the strength.
    #[getter]
    fn strength(&self) -> u32 {
        self.inner.strength()
    }

    /// Get the level count of every factor.
    #[getter]
    fn levels(&self) -> Vec<u32> {
        self.inner.levels().to_vec()
    }

    /// Get the data as a list of lists.
    fn data(&self, py: Python<'_>) -> PyResult<PyObject> {
        let list = PyList::empty(py);
        for row in self.inner.rows() {
            let row_list = PyList::empty(py);
            for &value in row {
                row_list.append(value)?;
            }
            list.append(row_list)?;
        }
        Ok(list.into())
    }

    /// D-efficiency under the main-effects model.
    fn d_efficiency(&self) -> f64 {
        self.inner.d_efficiency()
    }

    /// Check near balance of every factor.
    fn is_balanced(&self) -> bool {
        self.inner.balance_report().is_near_balanced()
    }

    fn __repr__(&self) -> String {
        format!("Design({})", self.inner.params())
    }
}

fn build(levels: Vec<u32>, run_size: usize, nkeep: usize, strength: u32) -> PyResult<Design> {
    DesignBuilder::new()
        .levels(levels)
        .run_size(run_size)
        .keep(nkeep)
        .strength(strength)
        .build()
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Generate a design and return its runs as a list of lists.
#[pyfunction]
#[pyo3(signature = (levels, run_size, nkeep=DEFAULT_KEEP, strength=DEFAULT_STRENGTH))]
fn generate(
    levels: Vec<u32>,
    run_size: usize,
    nkeep: usize,
    strength: u32,
) -> PyResult<Vec<Vec<u32>>> {
    Ok(build(levels, run_size, nkeep, strength)?.to_runs())
}

/// Generate a design and return it as a `Design` object.
#[pyfunction]
#[pyo3(signature = (levels, run_size, nkeep=DEFAULT_KEEP, strength=DEFAULT_STRENGTH))]
fn design(levels: Vec<u32>, run_size: usize, nkeep: usize, strength: u32) -> PyResult<PyDesign> {
    Ok(PyDesign {
        inner: build(levels, run_size, nkeep, strength)?,
    })
}

/// The doe-sampler Python module.
#[pymodule]
fn doe_sampler(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyDesign>()?;
    m.add_function(wrap_pyfunction!(generate, m)?)?;
    m.add_function(wrap_pyfunction!(design, m)?)?;
    Ok(())
}
