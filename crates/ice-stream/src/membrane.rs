//! Membrane stress and boundary handling shared by both stream models.
//!
//! [`StressBalanceCore`] owns everything the two models have in common: the
//! borrowed profile, the shared configuration, the precomputed Jacobian
//! constant `K = 2·D·A^(-1/n)` and the reusable residual/Jacobian buffers.
//! Each model adds its own drag terms on top.

use crate::config::ModelConfig;
use crate::error::{StreamResult, ensure_len};
use crate::profile::GridProfile;
use crate::row_product::scaled_row_product;
use ice_core::units::constants::G0_MPS2;
use ice_core::{ensure_all_finite, ensure_finite};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Effective viscosity `prefactor / (|Du|^((n-1)/n) + nu_eps)`.
///
/// The epsilon is added to the magnitude in the denominator, so the result
/// stays finite and positive as `Du → 0` for any `nu_eps > 0`.
pub fn effective_viscosity(
    du: &DVector<f64>,
    prefactor: f64,
    glen_exponent: f64,
    nu_eps: f64,
) -> DVector<f64> {
    let power = (glen_exponent - 1.0) / glen_exponent;
    du.map(|x| prefactor / (x.abs().powf(power) + nu_eps))
}

/// Derivative factor `(n-1)/n · Du / (|Du|^((n+1)/n) + nu_eps)`.
fn viscosity_sensitivity(du: &DVector<f64>, glen_exponent: f64, nu_eps: f64) -> DVector<f64> {
    let factor = (glen_exponent - 1.0) / glen_exponent;
    let power = (glen_exponent + 1.0) / glen_exponent;
    du.map(|x| factor * x / (x.abs().powf(power) + nu_eps))
}

/// Strain rate and membrane stress divergence for one velocity guess.
pub(crate) struct MembraneTerms {
    pub du: DVector<f64>,
    pub membrane: DVector<f64>,
}

pub(crate) struct StressBalanceCore<'a> {
    profile: &'a GridProfile,
    config: ModelConfig,
    prefactor: f64,
    k: DMatrix<f64>,
    residual: DVector<f64>,
    jacobian: DMatrix<f64>,
}

impl<'a> StressBalanceCore<'a> {
    pub fn new(profile: &'a GridProfile, config: ModelConfig) -> StreamResult<Self> {
        config.validate()?;

        let n = profile.size();
        let prefactor = config.viscosity_prefactor();
        let k = profile.derivative() * (2.0 * prefactor);

        Ok(Self {
            profile,
            config,
            prefactor,
            k,
            residual: DVector::zeros(n + 2),
            jacobian: DMatrix::zeros(n + 2, n),
        })
    }

    pub fn profile(&self) -> &'a GridProfile {
        self.profile
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn size(&self) -> usize {
        self.profile.size()
    }

    /// Rejects velocity guesses of the wrong length or with non-finite entries.
    pub fn check_input(&self, u: &DVector<f64>, scale: f64) -> StreamResult<()> {
        ensure_len("velocity", self.size(), u.len())?;
        ensure_all_finite(u.iter(), "velocity")?;
        ensure_finite(scale, "residual scale")?;
        Ok(())
    }

    pub fn strain_rate(&self, u: &DVector<f64>) -> DVector<f64> {
        self.profile.derivative() * u
    }

    /// `scale · 2 · D·(h·nu·Du)`.
    pub fn membrane(&self, u: &DVector<f64>, scale: f64) -> MembraneTerms {
        let du = self.strain_rate(u);
        let nu = effective_viscosity(
            &du,
            self.prefactor,
            self.config.glen_exponent,
            self.config.nu_eps,
        );
        let flux = self.profile.thickness().component_mul(&nu).component_mul(&du);
        let membrane = (self.profile.derivative() * flux) * (2.0 * scale);
        MembraneTerms { du, membrane }
    }

    /// `scale · rho_ice · g · h · alpha`.
    pub fn driving_stress(&self, scale: f64) -> DVector<f64> {
        let c = scale * self.profile.rho_ice() * G0_MPS2;
        self.profile
            .thickness()
            .zip_map(self.profile.slope(), |h, alpha| c * h * alpha)
    }

    /// Derivative of [`Self::membrane`] with respect to `u`, `N×N`.
    pub fn membrane_jacobian(&self, du: &DVector<f64>, scale: f64) -> DMatrix<f64> {
        let n_exp = self.config.glen_exponent;
        let eps = self.config.nu_eps;
        let d = self.profile.derivative();
        let h = self.profile.thickness();

        // Viscosity without the A^(-1/n) prefactor, which lives in K
        let nu = effective_viscosity(du, 1.0, n_exp, eps);
        let nu_hat = viscosity_sensitivity(du, n_exp, eps);

        let dnu = nu.zip_map(&nu_hat, |nu, nu_hat| -nu * nu * nu_hat);
        let gp = scaled_row_product(&dnu, d);

        let j1 = scaled_row_product(&h.component_mul(du), &gp);
        let j2 = scaled_row_product(&h.component_mul(&nu), d);
        (&self.k * (j1 + j2)) * scale
    }

    /// Writes the interior balance and both boundary conditions into the
    /// residual buffer and returns an independent copy of it.
    pub fn finish_residual(&mut self, du: &DVector<f64>, interior: &DVector<f64>) -> DVector<f64> {
        let n = self.size();
        let bvs = self.config.boundary_value_scale;

        self.residual.rows_mut(0, n).copy_from(interior);
        // Upstream symmetry, then calving-front force balance
        self.residual[n] = bvs * du[0];
        self.residual[n + 1] = bvs * (du[n - 1] - self.config.calving_force);

        trace!(n, norm = self.residual.norm(), "residual evaluated");
        self.residual.clone()
    }

    /// Writes the interior block and the boundary rows into the Jacobian
    /// buffer and returns a copy of it.
    pub fn finish_jacobian(&mut self, interior: &DMatrix<f64>) -> DMatrix<f64> {
        let n = self.size();
        let bvs = self.config.boundary_value_scale;
        let d = self.profile.derivative();

        self.jacobian.rows_mut(0, n).copy_from(interior);
        for j in 0..n {
            self.jacobian[(n, j)] = bvs * d[(0, j)];
            self.jacobian[(n + 1, j)] = bvs * d[(n - 1, j)];
        }

        trace!(n, norm = self.jacobian.norm(), "jacobian evaluated");
        self.jacobian.clone()
    }
}
