//! Finite difference Jacobian computation.
//!
//! Used to validate the analytic Jacobians offline; never on the Newton hot
//! path.

use crate::error::StreamResult;
use nalgebra::{DMatrix, DVector};

/// Finite difference stencil used by the numerical Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceScheme {
    Forward,
    #[default]
    Central,
}

impl DifferenceScheme {
    /// Jacobian of `f` at `x`, one column per perturbed component.
    ///
    /// Component `j` is shifted by `epsilon·max(|x[j]|, 1)`.
    pub fn jacobian<F>(
        self,
        x: &DVector<f64>,
        mut f: F,
        epsilon: f64,
    ) -> StreamResult<DMatrix<f64>>
    where
        F: FnMut(&DVector<f64>) -> StreamResult<DVector<f64>>,
    {
        let f_x = f(x)?;
        let mut jac = DMatrix::zeros(f_x.len(), x.len());

        for j in 0..x.len() {
            let dx = epsilon * x[j].abs().max(1.0);
            let f_plus = f(&shifted(x, j, dx))?;
            let df = match self {
                DifferenceScheme::Forward => (f_plus - &f_x) / dx,
                DifferenceScheme::Central => (f_plus - f(&shifted(x, j, -dx))?) / (2.0 * dx),
            };
            jac.set_column(j, &df);
        }

        Ok(jac)
    }
}

fn shifted(x: &DVector<f64>, j: usize, dx: f64) -> DVector<f64> {
    let mut x = x.clone();
    x[j] += dx;
    x
}

/// Compute Jacobian using forward finite differences.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> StreamResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> StreamResult<DVector<f64>>,
{
    DifferenceScheme::Forward.jacobian(x, f, epsilon)
}

/// Compute Jacobian using central finite differences (more accurate but 2x cost).
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> StreamResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> StreamResult<DVector<f64>>,
{
    DifferenceScheme::Central.jacobian(x, f, epsilon)
}

/// Entries smaller than this fraction of the largest reference entry are
/// compared against that floor instead of their own magnitude.
pub const RELATIVE_FLOOR: f64 = 1e-5;

/// Largest disagreement between two Jacobians of the same shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianDiscrepancy {
    /// Largest absolute entry difference
    pub max_abs: f64,
    /// Largest entry-wise relative difference
    /// `|a - b| / max(|a|, |b|, RELATIVE_FLOOR·max|reference|)`
    pub relative: f64,
    /// (row, column) of the largest relative difference
    pub location: (usize, usize),
}

/// Compare `candidate` against `reference` entry by entry.
///
/// Each entry is judged against its own magnitude, so small entries next to
/// large ones cannot hide behind them. Identical entries are skipped.
/// Panics in debug builds if the shapes differ.
pub fn compare_jacobians(candidate: &DMatrix<f64>, reference: &DMatrix<f64>) -> JacobianDiscrepancy {
    debug_assert_eq!(candidate.shape(), reference.shape());

    let floor = RELATIVE_FLOOR * reference.amax();
    let mut max_abs = 0.0_f64;
    let mut relative = 0.0_f64;
    let mut location = (0, 0);
    for i in 0..reference.nrows() {
        for j in 0..reference.ncols() {
            let (a, b) = (candidate[(i, j)], reference[(i, j)]);
            let diff = (a - b).abs();
            if diff == 0.0 {
                continue;
            }
            // NaN entries must surface as a failed comparison
            if diff > max_abs || diff.is_nan() {
                max_abs = diff;
            }
            let rel = diff / a.abs().max(b.abs()).max(floor);
            if rel > relative || rel.is_nan() {
                relative = rel;
                location = (i, j);
            }
        }
    }

    JacobianDiscrepancy {
        max_abs,
        relative,
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| -> StreamResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| -> StreamResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let jac = central_difference_jacobian(&x, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-6);
    }

    #[test]
    fn rectangular_jacobian_shape() {
        // Two inputs, three outputs
        let f = |x: &DVector<f64>| -> StreamResult<DVector<f64>> {
            Ok(DVector::from_row_slice(&[x[0] + x[1], x[0] * x[1], 3.0 * x[1]]))
        };

        let x = DVector::from_row_slice(&[2.0, 5.0]);
        let jac = DifferenceScheme::Central.jacobian(&x, f, 1e-7).unwrap();

        assert_eq!(jac.shape(), (3, 2));
        assert!((jac[(1, 0)] - 5.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 2.0).abs() < 1e-6);
        assert!((jac[(2, 1)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn stateful_closure_is_accepted() {
        let mut calls = 0;
        let f = |x: &DVector<f64>| -> StreamResult<DVector<f64>> {
            calls += 1;
            Ok(x.clone())
        };

        let x = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        DifferenceScheme::Forward.jacobian(&x, f, 1e-7).unwrap();
        assert_eq!(calls, 4);
    }

    #[test]
    fn compare_reports_location() {
        let reference = DMatrix::from_row_slice(2, 2, &[10.0, 0.0, 0.0, 10.0]);
        let mut candidate = reference.clone();
        candidate[(1, 0)] = 0.5;

        let d = compare_jacobians(&candidate, &reference);
        assert_eq!(d.location, (1, 0));
        assert_eq!(d.max_abs, 0.5);
        // reference entry is zero, so the candidate sets the scale
        assert_eq!(d.relative, 1.0);
    }

    #[test]
    fn compare_judges_small_entries_on_their_own_scale() {
        // A 1% error on an entry 100x smaller than the largest one
        let reference = DMatrix::from_row_slice(2, 2, &[30.0, 1.0, 0.3, 25.0]);
        let mut candidate = reference.clone();
        candidate[(1, 0)] *= 1.01;

        let d = compare_jacobians(&candidate, &reference);
        assert_eq!(d.location, (1, 0));
        assert!((d.relative - 0.01 / 1.01).abs() < 1e-12);
        assert!(d.relative > 1e-4);
    }

    #[test]
    fn compare_uses_floor_for_tiny_entries() {
        let reference = DMatrix::from_row_slice(1, 2, &[100.0, 0.0]);
        let mut candidate = reference.clone();
        candidate[(0, 1)] = 1e-12;

        let d = compare_jacobians(&candidate, &reference);
        assert!((d.relative - 1e-12 / (RELATIVE_FLOOR * 100.0)).abs() < 1e-18);
    }

    #[test]
    fn identical_matrices_agree_exactly() {
        let reference = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -2.0]);
        let d = compare_jacobians(&reference, &reference);
        assert_eq!(d.max_abs, 0.0);
        assert_eq!(d.relative, 0.0);
    }

    #[test]
    fn compare_flags_nan() {
        let reference = DMatrix::from_element(2, 2, 1.0);
        let mut candidate = reference.clone();
        candidate[(0, 1)] = f64::NAN;
        let d = compare_jacobians(&candidate, &reference);
        assert!(d.max_abs.is_nan());
        assert!(d.relative.is_nan());
        assert_eq!(d.location, (0, 1));
    }

    #[test]
    fn central_scheme_calls_twice_per_column() {
        let mut calls = 0;
        let f = |x: &DVector<f64>| -> StreamResult<DVector<f64>> {
            calls += 1;
            Ok(x.map(|v| v * v))
        };

        let x = DVector::from_row_slice(&[1.0, 2.0]);
        let jac = DifferenceScheme::Central.jacobian(&x, f, 1e-6).unwrap();
        assert_eq!(calls, 5);
        assert!((jac[(1, 1)] - 4.0).abs() < 1e-6);
        assert!(jac[(0, 1)].abs() < 1e-12);
    }
}
