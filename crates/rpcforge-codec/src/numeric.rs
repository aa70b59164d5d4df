// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric widening/narrowing between wire numbers and schema-typed fields.

use crate::error::CodecError;

/// Narrow an `i64` read off the wire into `i8`, failing if the value is out
/// of range rather than silently truncating.
pub fn narrow_i8(value: i64) -> Result<i8, CodecError> {
    i8::try_from(value).map_err(|_| lossy(value, "i8"))
}

/// Narrow an `i64` into `i16`.
pub fn narrow_i16(value: i64) -> Result<i16, CodecError> {
    i16::try_from(value).map_err(|_| lossy(value, "i16"))
}

/// Narrow an `i64` into `i32`.
pub fn narrow_i32(value: i64) -> Result<i32, CodecError> {
    i32::try_from(value).map_err(|_| lossy(value, "i32"))
}

/// Narrow an `f64` into `f32`, failing if the round trip is not exact.
pub fn narrow_f32(value: f64) -> Result<f32, CodecError> {
    let narrowed = value as f32;
    if f64::from(narrowed) == value {
        Ok(narrowed)
    } else {
        Err(CodecError::LossyNumericConversion {
            value: value.to_string(),
            target_type: "f32",
        })
    }
}

/// Convert a floating-point wire value into `i64`, failing if it carries a
/// fractional component or overflows.
pub fn float_to_i64(value: f64) -> Result<i64, CodecError> {
    if value.fract() != 0.0 || value > i64::MAX as f64 || value < i64::MIN as f64 {
        return Err(CodecError::LossyNumericConversion {
            value: value.to_string(),
            target_type: "i64",
        });
    }
    Ok(value as i64)
}

fn lossy(value: i64, target_type: &'static str) -> CodecError {
    CodecError::LossyNumericConversion {
        value: value.to_string(),
        target_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_i8_rejects_out_of_range() {
        assert!(narrow_i8(127).is_ok());
        assert!(matches!(
            narrow_i8(200).unwrap_err(),
            CodecError::LossyNumericConversion { .. }
        ));
    }

    #[test]
    fn narrow_f32_rejects_precision_loss() {
        assert!(narrow_f32(1.5).is_ok());
        assert!(narrow_f32(1.1e300).is_err());
    }

    #[test]
    fn float_to_i64_rejects_fractional_values() {
        assert!(float_to_i64(4.0).is_ok());
        assert!(float_to_i64(4.5).is_err());
    }
}
