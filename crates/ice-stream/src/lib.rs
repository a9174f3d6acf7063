//! Stress balance kernel for 1-D depth-integrated ice streams.
//!
//! This crate evaluates the nonlinear residual and the analytic Jacobian of a
//! flowline momentum balance for use inside an external Newton solver. Two
//! models share the [`StressBalance`] contract:
//!
//! - [`UnconfinedStreamModel`]: membrane stress with linear basal drag
//! - [`ConfinedStreamModel`]: channel flow with power-law basal drag gated by
//!   flotation and lateral shear-margin drag
//!
//! Both residuals carry two trailing boundary rows: upstream symmetry
//! (`Du[0] = 0`) and the calving-front force condition (`Du[N-1] = fs`).

pub mod config;
pub mod confined;
pub mod error;
pub mod jacobian;
pub mod membrane;
pub mod model;
pub mod profile;
pub mod row_product;
pub mod unconfined;

pub use config::{ChannelConfig, DEFAULT_FD_STEP, DEFAULT_SCALE, LinearDrag, ModelConfig};
pub use confined::ConfinedStreamModel;
pub use error::{StreamError, StreamResult};
pub use jacobian::{DifferenceScheme, JacobianDiscrepancy, RELATIVE_FLOOR, compare_jacobians};
pub use membrane::effective_viscosity;
pub use model::{StressBalance, StressComponents, StressDecomposition};
pub use profile::{GridProfile, centered_difference_operator};
pub use row_product::scaled_row_product;
pub use unconfined::UnconfinedStreamModel;
