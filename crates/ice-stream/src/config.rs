//! Immutable model configuration.
//!
//! Parameters are split by the model that consumes them: [`ModelConfig`]
//! holds the rheology and boundary settings shared by every variant,
//! [`LinearDrag`] the unconfined basal law and [`ChannelConfig`] the
//! confined channel geometry and sliding law.

use crate::error::StreamResult;
use ice_core::{ensure_non_negative, ensure_nonzero, ensure_positive};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Residual weighting applied when the caller has no preference.
pub const DEFAULT_SCALE: f64 = 1.0e-2;

/// Finite-difference step used by the numerical Jacobian.
pub const DEFAULT_FD_STEP: f64 = 1.0e-7;

/// Rheology and boundary settings shared by both stress balance models.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelConfig {
    /// Glen's law rate factor `A`
    pub rate_factor: f64,
    /// Rheology exponent `n`
    pub glen_exponent: f64,
    /// Prescribed strain rate at the calving front `fs`
    pub calving_force: f64,
    /// Regularization added to the viscosity denominator
    pub nu_eps: f64,
    /// Weight applied to both boundary rows
    pub boundary_value_scale: f64,
}

impl ModelConfig {
    pub fn new(rate_factor: f64, calving_force: f64) -> Self {
        Self {
            rate_factor,
            calving_force,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> StreamResult<()> {
        ensure_positive(self.rate_factor, "rate factor")?;
        ensure_nonzero(self.glen_exponent, "glen exponent")?;
        ice_core::ensure_finite(self.calving_force, "calving force")?;
        ensure_positive(self.nu_eps, "viscosity epsilon")?;
        ice_core::ensure_finite(self.boundary_value_scale, "boundary value scale")?;
        Ok(())
    }

    /// `A^(-1/n)`, the viscosity prefactor.
    pub fn viscosity_prefactor(&self) -> f64 {
        self.rate_factor.powf(-1.0 / self.glen_exponent)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            rate_factor: 1.0e-16,
            glen_exponent: 3.0,
            calving_force: 0.0,
            nu_eps: 1.0e-8,
            boundary_value_scale: 500.0,
        }
    }
}

/// Linear basal drag `B2·u` used by the unconfined model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinearDrag {
    /// Drag coefficient `B2`
    pub basal_drag: f64,
}

impl LinearDrag {
    pub fn validate(&self) -> StreamResult<()> {
        ice_core::ensure_finite(self.basal_drag, "basal drag coefficient")?;
        Ok(())
    }
}

impl Default for LinearDrag {
    fn default() -> Self {
        Self { basal_drag: 600.0 }
    }
}

/// Channel geometry and power-law sliding used by the confined model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Full channel width `W`
    pub width: f64,
    /// Sliding coefficient `As`
    pub sliding_coefficient: f64,
    /// Friction multiplier `mu`
    pub friction: f64,
    /// Sliding exponent `m`
    pub sliding_exponent: f64,
    /// Reserved regularization for the drag terms. Not applied: the basal
    /// drag derivative stays singular at zero velocity when `m > 1`.
    pub drag_eps: f64,
    /// Lower bound on the thickness above flotation
    pub flotation_floor: f64,
}

impl ChannelConfig {
    pub fn validate(&self) -> StreamResult<()> {
        ensure_positive(self.width, "channel width")?;
        ice_core::ensure_finite(self.sliding_coefficient, "sliding coefficient")?;
        ice_core::ensure_finite(self.friction, "friction multiplier")?;
        ensure_nonzero(self.sliding_exponent, "sliding exponent")?;
        ensure_non_negative(self.drag_eps, "drag epsilon")?;
        ensure_positive(self.flotation_floor, "flotation floor")?;
        Ok(())
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            width: 3000.0,
            sliding_coefficient: 100.0,
            friction: 1.0,
            sliding_exponent: 3.0,
            drag_eps: 1.0e-3,
            flotation_floor: 0.01,
        }
    }
}
