//! numpy array conversion.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

/// Copy a numpy array into a Vec<f64>. Non-contiguous views are supported.
pub fn numpy_to_vec_f64(arr: PyReadonlyArray1<f64>) -> Vec<f64> {
    match arr.as_slice() {
        Ok(slice) => slice.to_vec(),
        Err(_) => arr.as_array().to_vec(),
    }
}

/// Convert Vec<f64> to numpy array.
pub fn vec_to_numpy_f64<'py>(py: Python<'py>, vec: Vec<f64>) -> &'py PyArray1<f64> {
    PyArray1::from_vec(py, vec)
}
