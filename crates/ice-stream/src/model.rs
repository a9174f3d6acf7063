//! Common contract for the stress balance models.

use crate::config::{DEFAULT_FD_STEP, DEFAULT_SCALE};
use crate::error::StreamResult;
use crate::jacobian::DifferenceScheme;
use nalgebra::{DMatrix, DVector};

/// Residual and Jacobian evaluation for a Newton-type driver.
///
/// Implementations own reusable working buffers, so evaluation takes
/// `&mut self`. Every returned vector or matrix is an independent copy that
/// stays valid after later calls.
pub trait StressBalance {
    /// Number of velocity unknowns `N`.
    fn size(&self) -> usize;

    /// Evaluate the discretized stress balance at `u`.
    ///
    /// Entries `0..N` hold the interior balance, entry `N` the upstream
    /// symmetry condition and entry `N+1` the calving-front condition.
    fn residual(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DVector<f64>>;

    /// Exact derivative of [`StressBalance::residual`] with respect to `u`,
    /// shaped `(N+2)×N`.
    fn jacobian(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DMatrix<f64>>;

    /// Finite difference approximation of the Jacobian at the default scale,
    /// using central differences.
    ///
    /// Slow; intended for checking [`StressBalance::jacobian`].
    fn numerical_jacobian(&mut self, u: &DVector<f64>, step: f64) -> StreamResult<DMatrix<f64>> {
        self.numerical_jacobian_with(u, DEFAULT_SCALE, step, DifferenceScheme::Central)
    }

    fn numerical_jacobian_with(
        &mut self,
        u: &DVector<f64>,
        scale: f64,
        step: f64,
        scheme: DifferenceScheme,
    ) -> StreamResult<DMatrix<f64>> {
        scheme.jacobian(u, |x| self.residual(x, scale), step)
    }

    /// [`StressBalance::residual`] at [`DEFAULT_SCALE`].
    fn default_residual(&mut self, u: &DVector<f64>) -> StreamResult<DVector<f64>> {
        self.residual(u, DEFAULT_SCALE)
    }

    /// [`StressBalance::jacobian`] at [`DEFAULT_SCALE`].
    fn default_jacobian(&mut self, u: &DVector<f64>) -> StreamResult<DMatrix<f64>> {
        self.jacobian(u, DEFAULT_SCALE)
    }

    /// [`StressBalance::numerical_jacobian`] with [`DEFAULT_FD_STEP`].
    fn default_numerical_jacobian(&mut self, u: &DVector<f64>) -> StreamResult<DMatrix<f64>> {
        self.numerical_jacobian(u, DEFAULT_FD_STEP)
    }
}

/// Models that can report their stress terms separately.
pub trait StressDecomposition: StressBalance {
    /// Raw per-node stress terms at `u`, each of length `N`, not combined
    /// into a residual and without boundary entries.
    fn residual_components(
        &self,
        u: &DVector<f64>,
        scale: f64,
    ) -> StreamResult<StressComponents>;
}

/// Unmixed stress terms of the confined balance.
#[derive(Debug, Clone, PartialEq)]
pub struct StressComponents {
    pub membrane: DVector<f64>,
    pub basal: DVector<f64>,
    pub lateral: DVector<f64>,
    pub driving: DVector<f64>,
}

impl StressComponents {
    pub const NAMES: [&'static str; 4] = ["membrane", "basal", "lateral", "driving"];

    /// Interior residual `(membrane - basal - lateral) + driving`.
    pub fn combined(&self) -> DVector<f64> {
        (&self.membrane - &self.basal - &self.lateral) + &self.driving
    }

    /// Look up a component by name.
    pub fn get(&self, name: &str) -> Option<&DVector<f64>> {
        match name {
            "membrane" => Some(&self.membrane),
            "basal" => Some(&self.basal),
            "lateral" => Some(&self.lateral),
            "driving" => Some(&self.driving),
            _ => None,
        }
    }

    /// Components in a fixed order, paired with their names.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DVector<f64>)> {
        Self::NAMES
            .into_iter()
            .zip([&self.membrane, &self.basal, &self.lateral, &self.driving])
    }
}
