//! Grid profile consumed by the stress balance models.

use crate::error::{StreamResult, ensure_len};
use ice_core::units::{Density, Length, kg_per_m3_value, meters};
use ice_core::{IceError, ensure_all_finite, ensure_positive};
use nalgebra::{DMatrix, DVector};

/// Flowline geometry and physical fields on `N` interior nodes.
///
/// The derivative operator `D` is an `N×N` matrix approximating `d/dx`; its
/// first and last rows double as the one-sided boundary derivatives used by
/// the upstream symmetry and calving-front conditions.
///
/// A profile is validated once at construction and never mutated by the
/// models that borrow it.
#[derive(Debug, Clone)]
pub struct GridProfile {
    d: DMatrix<f64>,
    h: DVector<f64>,
    alpha: DVector<f64>,
    depth: DVector<f64>,
    rho_ice: f64,
    rho_water: f64,
}

impl GridProfile {
    /// Create a profile with validation.
    ///
    /// # Arguments
    /// * `d` - Derivative operator, `N×N`
    /// * `h` - Ice thickness at each node
    /// * `alpha` - Surface slope at each node
    /// * `depth` - Bed depth below sea level at each node
    /// * `rho_ice`, `rho_water` - Densities of ice and ocean water
    pub fn new(
        d: DMatrix<f64>,
        h: DVector<f64>,
        alpha: DVector<f64>,
        depth: DVector<f64>,
        rho_ice: Density,
        rho_water: Density,
    ) -> StreamResult<Self> {
        let n = h.len();
        if n == 0 {
            return Err(IceError::InvalidArg {
                what: "grid profile needs at least one node",
            }
            .into());
        }

        ensure_len("derivative operator rows", n, d.nrows())?;
        ensure_len("derivative operator columns", n, d.ncols())?;
        ensure_len("surface slope", n, alpha.len())?;
        ensure_len("bed depth", n, depth.len())?;

        ensure_all_finite(d.iter(), "derivative operator")?;
        ensure_all_finite(h.iter(), "ice thickness")?;
        ensure_all_finite(alpha.iter(), "surface slope")?;
        ensure_all_finite(depth.iter(), "bed depth")?;

        let rho_ice = ensure_positive(kg_per_m3_value(rho_ice), "ice density")?;
        let rho_water = ensure_positive(kg_per_m3_value(rho_water), "water density")?;

        Ok(Self {
            d,
            h,
            alpha,
            depth,
            rho_ice,
            rho_water,
        })
    }

    /// Create a profile on a uniformly spaced grid using
    /// [`centered_difference_operator`].
    pub fn uniform(
        h: DVector<f64>,
        alpha: DVector<f64>,
        depth: DVector<f64>,
        spacing: Length,
        rho_ice: Density,
        rho_water: Density,
    ) -> StreamResult<Self> {
        let d = centered_difference_operator(h.len(), spacing)?;
        Self::new(d, h, alpha, depth, rho_ice, rho_water)
    }

    /// Number of interior unknowns `N`.
    pub fn size(&self) -> usize {
        self.h.len()
    }

    pub fn derivative(&self) -> &DMatrix<f64> {
        &self.d
    }

    pub fn thickness(&self) -> &DVector<f64> {
        &self.h
    }

    pub fn slope(&self) -> &DVector<f64> {
        &self.alpha
    }

    pub fn depth(&self) -> &DVector<f64> {
        &self.depth
    }

    /// Ice density in kg/m³.
    pub fn rho_ice(&self) -> f64 {
        self.rho_ice
    }

    /// Water density in kg/m³.
    pub fn rho_water(&self) -> f64 {
        self.rho_water
    }

    /// Thickness above flotation, `h - (rho_water/rho_ice)·depth`, clamped
    /// from below at `floor`.
    ///
    /// Returns the clamped thickness and the number of nodes that hit the floor.
    pub fn flotation_thickness(&self, floor: f64) -> (DVector<f64>, usize) {
        let ratio = self.rho_water / self.rho_ice;
        let mut floored = 0;
        let hf = self.h.zip_map(&self.depth, |h, depth| {
            let hf = h - ratio * depth;
            if hf < floor {
                floored += 1;
                floor
            } else {
                hf
            }
        });
        (hf, floored)
    }
}

/// Second-order centered first-derivative operator on `n` uniformly spaced
/// nodes, with first-order one-sided differences in the first and last rows.
pub fn centered_difference_operator(n: usize, spacing: Length) -> StreamResult<DMatrix<f64>> {
    let dx = ensure_positive(meters(spacing), "grid spacing")?;
    if n < 2 {
        return Err(IceError::InvalidArg {
            what: "centered differences need at least two nodes",
        }
        .into());
    }

    let mut d = DMatrix::zeros(n, n);
    d[(0, 0)] = -1.0 / dx;
    d[(0, 1)] = 1.0 / dx;
    for i in 1..n - 1 {
        d[(i, i - 1)] = -0.5 / dx;
        d[(i, i + 1)] = 0.5 / dx;
    }
    d[(n - 1, n - 2)] = -1.0 / dx;
    d[(n - 1, n - 1)] = 1.0 / dx;
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use ice_core::units::{constants, kg_per_m3, m};

    fn profile(h: &[f64], depth: &[f64]) -> StreamResult<GridProfile> {
        let n = h.len();
        GridProfile::uniform(
            DVector::from_row_slice(h),
            DVector::from_element(n, 0.01),
            DVector::from_row_slice(depth),
            m(1000.0),
            constants::rho_ice(),
            constants::rho_seawater(),
        )
    }

    #[test]
    fn centered_operator_differentiates_linear_field() {
        let d = centered_difference_operator(5, m(250.0)).unwrap();
        let u = DVector::from_fn(5, |i, _| 3.0 * 250.0 * i as f64 + 7.0);
        let du = &d * &u;
        for value in du.iter() {
            assert!((value - 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn centered_operator_rejects_single_node() {
        let err = centered_difference_operator(1, m(100.0)).unwrap_err();
        assert!(matches!(err, StreamError::InvalidInput(_)));
    }

    #[test]
    fn centered_operator_rejects_zero_spacing() {
        assert!(centered_difference_operator(4, m(0.0)).is_err());
    }

    #[test]
    fn mismatched_fields_are_rejected() {
        let err = GridProfile::new(
            DMatrix::identity(3, 3),
            DVector::from_element(3, 1000.0),
            DVector::from_element(2, 0.01),
            DVector::zeros(3),
            kg_per_m3(917.0),
            kg_per_m3(1028.0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StreamError::DimensionMismatch {
                what: "surface slope",
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn non_square_operator_is_rejected() {
        let err = GridProfile::new(
            DMatrix::zeros(3, 2),
            DVector::from_element(3, 1000.0),
            DVector::from_element(3, 0.01),
            DVector::zeros(3),
            kg_per_m3(917.0),
            kg_per_m3(1028.0),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StreamError::DimensionMismatch {
                what: "derivative operator columns",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_fields_are_rejected() {
        let err = profile(&[1000.0, f64::NAN, 1000.0], &[0.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidInput(IceError::NonFiniteEntry {
                what: "ice thickness",
                index: 1,
                ..
            })
        ));
    }

    #[test]
    fn empty_profile_is_rejected() {
        let err = GridProfile::new(
            DMatrix::zeros(0, 0),
            DVector::zeros(0),
            DVector::zeros(0),
            DVector::zeros(0),
            kg_per_m3(917.0),
            kg_per_m3(1028.0),
        )
        .unwrap_err();
        assert!(matches!(err, StreamError::InvalidInput(_)));
    }

    #[test]
    fn flotation_thickness_is_floored() {
        // Node 1 sits below flotation: 100 - (1028/917)*200 < 0
        let p = profile(&[1000.0, 100.0, 800.0], &[100.0, 200.0, 0.0]).unwrap();
        let (hf, floored) = p.flotation_thickness(0.01);
        assert_eq!(floored, 1);
        assert_eq!(hf[1], 0.01);
        assert!((hf[0] - (1000.0 - 1028.0 / 917.0 * 100.0)).abs() < 1e-9);
        assert_eq!(hf[2], 800.0);
    }
}
