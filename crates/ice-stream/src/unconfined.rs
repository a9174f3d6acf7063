//! Unconfined ice stream with linear basal drag.

use crate::config::{LinearDrag, ModelConfig};
use crate::error::StreamResult;
use crate::membrane::StressBalanceCore;
use crate::model::StressBalance;
use crate::profile::GridProfile;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Membrane stress balanced against driving stress and a linear drag `B2·u`.
pub struct UnconfinedStreamModel<'a> {
    core: StressBalanceCore<'a>,
    drag: LinearDrag,
}

impl<'a> UnconfinedStreamModel<'a> {
    pub fn new(
        profile: &'a GridProfile,
        config: ModelConfig,
        drag: LinearDrag,
    ) -> StreamResult<Self> {
        drag.validate()?;
        let core = StressBalanceCore::new(profile, config)?;

        debug!(
            n = profile.size(),
            rate_factor = config.rate_factor,
            glen_exponent = config.glen_exponent,
            basal_drag = drag.basal_drag,
            "unconfined stream model created"
        );

        Ok(Self { core, drag })
    }

    pub fn profile(&self) -> &'a GridProfile {
        self.core.profile()
    }

    pub fn config(&self) -> &ModelConfig {
        self.core.config()
    }

    pub fn drag(&self) -> &LinearDrag {
        &self.drag
    }
}

impl StressBalance for UnconfinedStreamModel<'_> {
    fn size(&self) -> usize {
        self.core.size()
    }

    fn residual(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DVector<f64>> {
        self.core.check_input(u, scale)?;

        let terms = self.core.membrane(u, scale);
        let drag = u * (scale * self.drag.basal_drag);
        let td = self.core.driving_stress(scale);

        let interior = terms.membrane - drag + td;
        Ok(self.core.finish_residual(&terms.du, &interior))
    }

    fn jacobian(&mut self, u: &DVector<f64>, scale: f64) -> StreamResult<DMatrix<f64>> {
        self.core.check_input(u, scale)?;

        let du = self.core.strain_rate(u);
        let mut j = self.core.membrane_jacobian(&du, scale);
        let j_drag = scale * self.drag.basal_drag;
        for i in 0..u.len() {
            j[(i, i)] -= j_drag;
        }

        Ok(self.core.finish_jacobian(&j))
    }
}
