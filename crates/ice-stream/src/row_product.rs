//! Row-scaled matrix products.

use nalgebra::{DMatrix, DVector};

/// Returns `diag(b)·a`, scaling row `i` of `a` by `b[i]` without building the
/// diagonal matrix.
///
/// `b.len()` must equal `a.nrows()`.
pub fn scaled_row_product(b: &DVector<f64>, a: &DMatrix<f64>) -> DMatrix<f64> {
    debug_assert_eq!(b.len(), a.nrows());
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| b[i] * a[(i, j)])
}
