//! Laterally confined ice stream with power-law basal and lateral drag.

use crate::config::{ChannelConfig, ModelConfig};
use crate::error::StreamResult;
use crate::membrane::StressBalanceCore;
use crate::model::{StressBalance, StressComponents, StressDecomposition};
use crate::profile::GridProfile;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Ice stream in a channel of width `W`.
///
/// Basal drag `mu·As·(Hf·|u|)^(1/m)` is gated by the thickness above
/// flotation `Hf`, and shear along the margins adds a lateral drag
/// `2·(h/W)·(5·|u|/(A·W))^(1/n)`. Both drag terms take powers of `|u|` and
/// reattach the sign afterwards, so they always oppose the flow.
///
/// Neither drag derivative is regularized at rest. For `m > 1` the basal
/// derivative behaves like `|u|^((1-m)/m)`, and for `n > 1` the lateral
/// derivative behaves like `|u|^((1-n)/n)`, so each is unbounded as `u → 0`.
pub struct ConfinedStreamModel<'a> {
    core: StressBalanceCore<'a>,
    channel: ChannelConfig,
    hf: DVector<f64>,
}

/// Basal and lateral drag at one velocity guess.
struct DragTerms {
    basal: DVector<f64>,
    lateral: DVector<f64>,
}

impl<'a> ConfinedStreamModel<'a> {
    pub fn new(
        profile: &'a GridProfile,
        config: ModelConfig,
        channel: ChannelConfig,
    ) -> StreamResult<Self> {
        channel.validate()?;
        let core = StressBalanceCore::new(profile, config)?;

        let (hf, floored) = profile.flotation_thickness(channel.flotation_floor);
        if floored > 0 {
            warn!(
                floored,
                floor = channel.flotation_floor,
                "ice below flotation; thickness above flotation clamped"
            );
        }

        debug!(
            n = profile.size(),
            rate_factor = config.rate_factor,
            glen_exponent = config.glen_exponent,
            width = channel.width,
            sliding_exponent = channel.sliding_exponent,
            "confined stream model created"
        );

        Ok(Self { core, channel, hf })
    }

    pub fn profile(&self) -> &'a GridProfile {
        self.core.profile()
    }

    pub fn config(&self) -> &ModelConfig {
        self.core.config()
    }

    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    /// Thickness above flotation, never below the configured floor.
    pub fn flotation_thickness(&self) -> &DVector<f64> {
        &self.hf
    }

    fn drag(&self, u: &DVector<f64>, scale: f64) -> DragTerms {
        let n = u.len();
        let config = self.core.config();
        let h = self.core.profile().thickness();
        let ChannelConfig {
            width,
            sliding_coefficient,
            friction,
            sliding_exponent,
            ..
        } = self.channel;
        let a = config.rate_factor;
        let coefficient = friction * sliding_coefficient;
        let inv_m = 1.0 / sliding_exponent;
        let inv_n = 1.0 / config.glen_exponent;

        let mut basal = DVector::zeros(n);
        let mut lateral = DVector::zeros(n);
        for i in 0..n {
            let sign = 1.0_f64.copysign(u[i]);
            let abs_u = u[i].abs();
            basal[i] = scale * sign * coefficient * (self.hf[i] * abs_u).powf(inv_m);
            lateral[i] =
                scale * 2.0 * sign * h[i] / width * (5.0 * abs_u / (a * width)).powf(inv_n);
        }

        DragTerms { basal, lateral }
    }

    /// Diagonal derivatives of the basal and lateral drag.
    fn drag_jacobian(&self, u: &DVector<f64>, scale: f64) -> DragTerms {
        let n = u.len();
        let config = self.core.config();
        let h = self.core.profile().thickness();
        let ChannelConfig {
            width,
            sliding_coefficient,
            friction,
            sliding_exponent: m,
            ..
        } = self.channel;
        let a = config.rate_factor;
        let n_exp = config.glen_exponent;

        let mut basal = DVector::zeros(n);
        let mut lateral = DVector::zeros(n);
        for i in 0..n {
            let abs_u = u[i].abs();
            // sign(u)·d|u|/du = 1, so both derivatives are even in u
            basal[i] = scale * friction * sliding_coefficient * self.hf[i].powf(1.0 / m) / m
                * abs_u.powf((1.0 - m) / m);
            lateral[i] = scale * 10.0 * h[i] / (n_exp * a * width * width)
                * (5.0 * abs_u / (a * width)).powf((1.0 - n_exp) / n_exp);
        }

        DragTerms { basal, lateral }
    }
}

impl StressBalance for ConfinedStreamModel<'_> {
    fn size(&self) -> usize {
        self.core.size()
    }

    fn residual(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DVector<f64>> {
        self.core.check_input(u, scale)?;

        let (du, components) = self.components(u, scale);
        Ok(self.core.finish_residual(&du, &components.combined()))
    }

    fn jacobian(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DMatrix<f64>> {
        self.core.check_input(u, scale)?;

        let du = self.core.strain_rate(u);
        let mut j = self.core.membrane_jacobian(&du, scale);
        let drag = self.drag_jacobian(u, scale);
        for i in 0..u.len() {
            j[(i, i)] -= drag.basal[i];
            j[(i, i)] -= drag.lateral[i];
        }

        Ok(self.core.finish_jacobian(&j))
    }
}

impl ConfinedStreamModel<'_> {
    /// Strain rate and the unmixed stress terms.
    fn components(&self, u: &DVector<f64>, scale: f64) -> (DVector<f64>, StressComponents) {
        let terms = self.core.membrane(u, scale);
        let drag = self.drag(u, scale);
        let components = StressComponents {
            membrane: terms.membrane,
            basal: drag.basal,
            lateral: drag.lateral,
            driving: self.core.driving_stress(scale),
        };
        (terms.du, components)
    }
}

impl StressDecomposition for ConfinedStreamModel<'_> {
    fn residual_components(
        &self,
        u: &DVector<f64>,
        scale: f64,
    ) -> StreamResult<StressComponents> {
        self.core.check_input(u, scale)?;
        let (_, components) = self.components(u, scale);
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jacobian::{DifferenceScheme, compare_jacobians};
    use ice_core::units::{constants, m};

    fn profile(h: &[f64], depth: &[f64]) -> GridProfile {
        let n = h.len();
        GridProfile::uniform(
            DVector::from_row_slice(h),
            DVector::from_element(n, 0.01),
            DVector::from_row_slice(depth),
            m(1000.0),
            constants::rho_ice(),
            constants::rho_seawater(),
        )
        .unwrap()
    }

    #[test]
    fn flotation_floor_applies_below_flotation() {
        let profile = profile(&[1000.0, 100.0, 800.0], &[200.0, 400.0, 100.0]);
        let model =
            ConfinedStreamModel::new(&profile, ModelConfig::default(), ChannelConfig::default())
                .unwrap();
        let hf = model.flotation_thickness();
        assert_eq!(hf[1], 0.01);
        assert!(hf.iter().all(|&x| x >= 0.01));
    }

    #[test]
    fn drag_vanishes_at_rest() {
        let profile = profile(&[1000.0; 4], &[0.0; 4]);
        let model =
            ConfinedStreamModel::new(&profile, ModelConfig::default(), ChannelConfig::default())
                .unwrap();
        let c = model
            .residual_components(&DVector::zeros(4), 1.0e-2)
            .unwrap();
        assert!(c.basal.iter().all(|&x| x == 0.0));
        assert!(c.lateral.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn basal_derivative_is_singular_at_rest_only_for_large_m() {
        let profile = profile(&[1000.0; 4], &[0.0; 4]);
        let rest = DVector::zeros(4);

        let model =
            ConfinedStreamModel::new(&profile, ModelConfig::default(), ChannelConfig::default())
                .unwrap();
        assert!(model.drag_jacobian(&rest, 1.0e-2).basal[0].is_infinite());

        let linear = ChannelConfig {
            sliding_exponent: 1.0,
            ..ChannelConfig::default()
        };
        let model = ConfinedStreamModel::new(&profile, ModelConfig::default(), linear).unwrap();
        let basal = model.drag_jacobian(&rest, 1.0e-2).basal;
        // scale·mu·As·Hf = 1e-2·1·100·1000
        assert!(basal.iter().all(|&x| (x - 1000.0).abs() < 1e-9));
    }

    #[test]
    fn lateral_derivative_is_singular_at_rest_only_for_large_n() {
        let profile = profile(&[1000.0; 4], &[0.0; 4]);
        let rest = DVector::zeros(4);
        let linear = ChannelConfig {
            sliding_exponent: 1.0,
            ..ChannelConfig::default()
        };

        let mut model = ConfinedStreamModel::new(&profile, ModelConfig::default(), linear).unwrap();
        let drag = model.drag_jacobian(&rest, 1.0e-2);
        assert!(drag.basal[0].is_finite());
        assert!(drag.lateral[0].is_infinite());
        // the lateral term alone makes the assembled diagonal singular
        assert!(model.jacobian(&rest, 1.0e-2).unwrap()[(0, 0)].is_infinite());

        let newtonian = ModelConfig {
            glen_exponent: 1.0,
            ..ModelConfig::default()
        };
        let model = ConfinedStreamModel::new(&profile, newtonian, linear).unwrap();
        let lateral = model.drag_jacobian(&rest, 1.0e-2).lateral;
        assert!(lateral.iter().all(|x| x.is_finite() && *x > 0.0));
    }

    #[test]
    fn drag_derivatives_match_finite_differences() {
        let profile = profile(&[1200.0, 1000.0, 800.0, 600.0], &[300.0, 400.0, 500.0, 550.0]);
        let model =
            ConfinedStreamModel::new(&profile, ModelConfig::default(), ChannelConfig::default())
                .unwrap();
        let u = DVector::from_row_slice(&[120.0, -80.0, 260.0, 410.0]);
        let scale = 1.0e-2;

        let analytic = model.drag_jacobian(&u, scale);
        let basal = DifferenceScheme::Central
            .jacobian(&u, |x| Ok(model.drag(x, scale).basal), 1e-7)
            .unwrap();
        let lateral = DifferenceScheme::Central
            .jacobian(&u, |x| Ok(model.drag(x, scale).lateral), 1e-7)
            .unwrap();

        let d = compare_jacobians(&DMatrix::from_diagonal(&analytic.basal), &basal);
        assert!(d.relative < 1e-6, "basal drag: relative {:.3e}", d.relative);
        let d = compare_jacobians(&DMatrix::from_diagonal(&analytic.lateral), &lateral);
        assert!(d.relative < 1e-6, "lateral drag: relative {:.3e}", d.relative);
    }

    #[test]
    fn linear_sliding_matches_closed_form() {
        let profile = profile(&[1000.0; 3], &[0.0; 3]);
        let channel = ChannelConfig {
            sliding_exponent: 1.0,
            ..ChannelConfig::default()
        };
        let model = ConfinedStreamModel::new(&profile, ModelConfig::default(), channel).unwrap();
        let u = DVector::from_row_slice(&[2.0, -3.0, 4.0]);
        let c = model.residual_components(&u, 1.0).unwrap();
        for i in 0..3 {
            let expected = 100.0 * 1000.0 * u[i];
            assert!((c.basal[i] - expected).abs() < 1e-9 * expected.abs());
        }
    }

    #[test]
    fn decomposition_rejects_wrong_length() {
        let profile = profile(&[1000.0; 3], &[0.0; 3]);
        let model =
            ConfinedStreamModel::new(&profile, ModelConfig::default(), ChannelConfig::default())
                .unwrap();
        assert!(model.residual_components(&DVector::zeros(2), 1.0e-2).is_err());
    }
}
