//! Decimal scale codes for coordinate and elevation fields.
//!
//! SEG-Y stores coordinates as 4-byte integers paired with a 2-byte scale
//! code shared by several fields. A positive code multiplies the stored
//! integer, a negative code divides by its magnitude, and 0 or 1 leave the
//! value unchanged. Treating 0 as identity is a legacy convention that
//! decoders must keep; encoders in this crate never produce 0.

use thiserror::Error;

/// Largest scale magnitude used when choosing a code (four decimal digits).
pub const MAX_SCALE: i16 = 10_000;

/// Tolerance, in mantissa units, for deciding that a scaled value is integral.
const INTEGRAL_TOLERANCE: f64 = 1e-6;

/// Errors raised while choosing or applying scale codes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    /// The value is NaN or infinite.
    #[error("Cannot scale non-finite value {0}")]
    NonFinite(f64),

    /// The value does not fit a 4-byte mantissa even at the coarsest scale.
    #[error("Value {value} does not fit a 4-byte field with scale code {code}")]
    OutOfRange {
        /// The value that was being stored
        value: f64,
        /// The scale code that was tried last
        code: i16,
    },
}

/// Returns the multiplier a scale code stands for.
///
/// `0` and `1` both mean identity.
#[inline]
#[must_use]
pub fn scale_factor(code: i16) -> f64 {
    match code {
        c if c > 1 => f64::from(c),
        c if c < 0 => 1.0 / f64::from(c).abs(),
        _ => 1.0,
    }
}

/// Applies a scale code to a stored mantissa.
///
/// Negative codes divide rather than multiply by the reciprocal so that
/// decimal values such as `12345 / 10` come back exact.
#[inline]
#[must_use]
pub fn apply_scale(mantissa: i32, code: i16) -> f64 {
    match code {
        c if c > 1 => f64::from(mantissa) * f64::from(c),
        c if c < 0 => f64::from(mantissa) / f64::from(c).abs(),
        _ => f64::from(mantissa),
    }
}

/// Computes the mantissa that stores `value` under `code`, rounded to nearest.
///
/// # Errors
///
/// Returns an error if `value` is not finite or the mantissa leaves `i32` range.
pub fn mantissa(value: f64, code: i16) -> Result<i32, ScaleError> {
    if !value.is_finite() {
        return Err(ScaleError::NonFinite(value));
    }
    let scaled = match code {
        c if c > 1 => value / f64::from(c),
        c if c < 0 => value * f64::from(c).abs(),
        _ => value,
    }
    .round();
    if fits_i32(scaled) { Ok(scaled as i32) } else { Err(ScaleError::OutOfRange { value, code }) }
}

/// Chooses the scale code needed to store a single value.
///
/// Whole numbers get `1`. Values with a fractional part get `-10^k`, where `k`
/// is the number of decimals needed (at most four) that still keeps the
/// mantissa inside `i32`. Values too large for `i32` get the smallest positive
/// power of ten that brings them into range.
///
/// # Errors
///
/// Returns an error for non-finite values and values that do not fit even
/// with a scale of [`MAX_SCALE`].
pub fn find_scale(value: f64) -> Result<i16, ScaleError> {
    if !value.is_finite() {
        return Err(ScaleError::NonFinite(value));
    }

    if !fits_i32(value.round()) {
        let mut code = 10i16;
        loop {
            if fits_i32((value / f64::from(code)).round()) {
                return Ok(code);
            }
            if code >= MAX_SCALE {
                return Err(ScaleError::OutOfRange { value, code });
            }
            code *= 10;
        }
    }

    let mut chosen = 1i16;
    let mut magnitude = 1i16;
    loop {
        let scaled = value * f64::from(magnitude);
        if !fits_i32(scaled.round()) {
            break;
        }
        chosen = if magnitude == 1 { 1 } else { -magnitude };
        if (scaled - scaled.round()).abs() < INTEGRAL_TOLERANCE || magnitude >= MAX_SCALE {
            break;
        }
        magnitude *= 10;
    }
    Ok(chosen)
}

/// Chooses one scale code shared by a group of values.
///
/// If any value needs a coarsening (positive) code, the largest such code
/// wins. Otherwise the most precise negative code is relaxed one decade at a
/// time until every value's mantissa fits in `i32`.
///
/// An empty group yields `1`.
///
/// # Errors
///
/// Returns an error if any value cannot be stored on its own.
pub fn group_scale(values: &[f64]) -> Result<i16, ScaleError> {
    let mut coarsest = 1i16;
    let mut finest = 1i16;
    for &value in values {
        let code = find_scale(value)?;
        if code > 1 {
            coarsest = coarsest.max(code);
        } else if code < finest {
            finest = code;
        }
    }

    if coarsest > 1 {
        return Ok(coarsest);
    }

    let mut code = finest;
    while code < 0 {
        if values.iter().all(|&v| mantissa(v, code).is_ok()) {
            return Ok(code);
        }
        code = if code == -10 { 1 } else { code / 10 };
    }
    Ok(1)
}

#[inline]
fn fits_i32(v: f64) -> bool {
    v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX)
}
