//! Type coercion rules.
//!
//! `resolve_type` is the join of the coercion order
//!
//! ```text
//! null < boolean
//! null < int8 < int16 < int32 < int64 < decimal(p,s) < float32/float64
//! null < date < timestamp
//! null < string
//! null < binary
//! ```
//!
//! Types in different chains have no common supertype.

use crate::error::{Error, Result};
use crate::types::{DataType, MAX_DECIMAL_PRECISION};
use alloc::format;

/// Determines the type two operands coerce to for comparison or arithmetic.
pub fn resolve_type(a: DataType, b: DataType) -> Result<DataType> {
    if a == b {
        return Ok(a);
    }
    match (a, b) {
        (DataType::Null, t) | (t, DataType::Null) => Ok(t),
        (x, y) if x.is_numeric() && y.is_numeric() => Ok(resolve_numeric(x, y)),
        (DataType::Date, DataType::Timestamp) | (DataType::Timestamp, DataType::Date) => {
            Ok(DataType::Timestamp)
        }
        _ => Err(Error::type_error(format!(
            "no common type for {} and {}",
            a, b
        ))),
    }
}

/// Folds `resolve_type` over a sequence of types. An empty sequence yields
/// the `Null` type.
pub fn resolve_types<I>(types: I) -> Result<DataType>
where
    I: IntoIterator<Item = DataType>,
{
    types
        .into_iter()
        .try_fold(DataType::Null, resolve_type)
}

fn resolve_numeric(a: DataType, b: DataType) -> DataType {
    if a.is_float() || b.is_float() {
        let narrow = |t: DataType| {
            matches!(t, DataType::Float32 | DataType::Int8 | DataType::Int16)
        };
        return if narrow(a) && narrow(b) {
            DataType::Float32
        } else {
            DataType::Float64
        };
    }

    if a.is_integer() && b.is_integer() {
        return if a.bit_width() >= b.bit_width() { a } else { b };
    }

    let (int_a, scale_a) = decimal_parts(a);
    let (int_b, scale_b) = decimal_parts(b);
    let int_digits = int_a.max(int_b);
    let mut scale = scale_a.max(scale_b);
    if int_digits + scale > MAX_DECIMAL_PRECISION {
        scale = MAX_DECIMAL_PRECISION - int_digits;
    }
    DataType::Decimal {
        precision: int_digits + scale,
        scale,
    }
}

/// Splits an integer or decimal type into (integer digits, scale).
fn decimal_parts(t: DataType) -> (u8, u8) {
    match t {
        DataType::Decimal { precision, scale } => (precision.saturating_sub(scale), scale),
        other => (other.integer_digits().unwrap_or(MAX_DECIMAL_PRECISION), 0),
    }
}

/// Returns whether an explicit `CAST` from `from` to `to` is allowed.
pub fn can_cast(from: DataType, to: DataType) -> bool {
    if from == to || from == DataType::Null {
        return true;
    }
    match (from, to) {
        (f, t) if f.is_numeric() && t.is_numeric() => true,
        (DataType::Boolean, t) | (t, DataType::Boolean) if t.is_integer() => true,
        (f, t) if f.is_temporal() && t.is_temporal() => true,
        (_, DataType::String) => true,
        (DataType::String, t) => t != DataType::Null,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn dec(precision: u8, scale: u8) -> DataType {
        DataType::Decimal { precision, scale }
    }

    #[test]
    fn test_null_is_bottom() {
        assert_eq!(resolve_type(DataType::Null, DataType::String).unwrap(), DataType::String);
        assert_eq!(resolve_type(DataType::Int8, DataType::Null).unwrap(), DataType::Int8);
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(resolve_type(DataType::Int8, DataType::Int32).unwrap(), DataType::Int32);
        assert_eq!(resolve_type(DataType::Int64, DataType::Int16).unwrap(), DataType::Int64);
    }

    #[test]
    fn test_integer_and_decimal() {
        assert_eq!(resolve_type(DataType::Int32, dec(5, 2)).unwrap(), dec(12, 2));
        assert_eq!(resolve_type(dec(5, 0), dec(5, 4)).unwrap(), dec(9, 4));
        // Integer digits win over scale when precision runs out.
        assert_eq!(resolve_type(DataType::Int64, dec(28, 10)).unwrap(), dec(28, 9));
    }

    #[test]
    fn test_float_is_top() {
        assert_eq!(resolve_type(DataType::Int16, DataType::Float32).unwrap(), DataType::Float32);
        assert_eq!(resolve_type(DataType::Int32, DataType::Float32).unwrap(), DataType::Float64);
        assert_eq!(resolve_type(dec(4, 2), DataType::Float32).unwrap(), DataType::Float64);
        assert_eq!(resolve_type(DataType::Float64, DataType::Int8).unwrap(), DataType::Float64);
    }

    #[test]
    fn test_temporal() {
        assert_eq!(resolve_type(DataType::Date, DataType::Timestamp).unwrap(), DataType::Timestamp);
        assert!(resolve_type(DataType::Date, DataType::Int64).is_err());
    }

    #[test]
    fn test_incompatible() {
        assert!(resolve_type(DataType::String, DataType::Binary).is_err());
        assert!(resolve_type(DataType::Boolean, DataType::Int32).is_err());
        assert!(resolve_type(DataType::String, DataType::Int64).is_err());
    }

    #[test]
    fn test_resolve_types_fold() {
        let t = resolve_types(vec![DataType::Null, DataType::Int8, DataType::Int32]).unwrap();
        assert_eq!(t, DataType::Int32);
        assert_eq!(resolve_types(vec![]).unwrap(), DataType::Null);
    }

    #[test]
    fn test_can_cast() {
        assert!(can_cast(DataType::String, DataType::Int64));
        assert!(can_cast(DataType::Float64, DataType::Int8));
        assert!(can_cast(DataType::Boolean, DataType::Int32));
        assert!(can_cast(DataType::Binary, DataType::String));
        assert!(!can_cast(DataType::Binary, DataType::Int32));
        assert!(!can_cast(DataType::Date, DataType::Boolean));
    }
}
