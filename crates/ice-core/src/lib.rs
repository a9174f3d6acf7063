//! ice-core: shared foundation for the ice-stream workspace.
//!
//! Contains:
//! - units (uom SI types, constructors and physical constants)
//! - numeric (Real + tolerances + input guards)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{IceError, IceResult};
pub use numeric::*;
pub use units::*;
