use crate::HcError;

/// Floating point type used throughout system
pub type Real = f64;

/// Slack used when comparing scheduled instants against the current time.
pub const TIME_EPS: Real = 1e-9;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, HcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HcError::NonFinite { what, value: v })
    }
}

pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, HcError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(HcError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Clamp to `[0, 1]`. NaN maps to 0 so a broken signal never drives an output.
pub fn clamp_unit(v: Real) -> Real {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
