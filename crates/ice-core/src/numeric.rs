use crate::{IceError, IceResult};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> IceResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(IceError::NonFinite { what, value: v })
    }
}

/// Reports the first non-finite entry of `values`, if any.
pub fn ensure_all_finite<'a, I>(values: I, what: &'static str) -> IceResult<()>
where
    I: IntoIterator<Item = &'a Real>,
{
    match values.into_iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(IceError::NonFiniteEntry { what, index, value }),
        None => Ok(()),
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> IceResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(IceError::NotPositive { what, value: v })
    }
}

/// Exponents appear as divisors (`1/n`, `1/m`), so zero is rejected.
pub fn ensure_nonzero(v: Real, what: &'static str) -> IceResult<Real> {
    let v = ensure_finite(v, what)?;
    if v == 0.0 {
        Err(IceError::Zero { what })
    } else {
        Ok(v)
    }
}

pub fn ensure_non_negative(v: Real, what: &'static str) -> IceResult<Real> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(IceError::InvalidArg { what })
    }
}
