// ice-core/src/units.rs

use uom::si::f64::{Length as UomLength, MassDensity as UomMassDensity};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type Density = UomMassDensity;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

/// Raw SI magnitude of a length, in meters.
#[inline]
pub fn meters(v: Length) -> f64 {
    use uom::si::length::meter;
    v.get::<meter>()
}

/// Raw SI magnitude of a density, in kg/m³.
#[inline]
pub fn kg_per_m3_value(v: Density) -> f64 {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    v.get::<kilogram_per_cubic_meter>()
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    /// Glacier ice.
    pub const RHO_ICE_KGPM3: f64 = 917.0;

    /// Sea water at the calving front.
    pub const RHO_SEAWATER_KGPM3: f64 = 1028.0;

    #[inline]
    pub fn rho_ice() -> Density {
        kg_per_m3(RHO_ICE_KGPM3)
    }

    #[inline]
    pub fn rho_seawater() -> Density {
        kg_per_m3(RHO_SEAWATER_KGPM3)
    }
}
