//! Data type definitions for Quill.
//!
//! This module defines the canonical column types exchanged between the core
//! and every backend.

use crate::error::{Error, Result};
use alloc::format;
use core::fmt;

/// Largest decimal precision representable by the decimal value type.
pub const MAX_DECIMAL_PRECISION: u8 = 28;

/// Canonical column types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Type of an untyped `NULL` literal. Coerces to every other type.
    Null,
    /// Boolean type (true/false)
    Boolean,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point number
    Float32,
    /// 64-bit floating point number
    Float64,
    /// Fixed-point decimal with `precision` total digits, `scale` of them
    /// after the decimal point.
    Decimal { precision: u8, scale: u8 },
    /// UTF-8 string
    String,
    /// Calendar date stored as days since the Unix epoch
    Date,
    /// Timestamp stored as microseconds since the Unix epoch
    Timestamp,
    /// Binary data
    Binary,
}

impl DataType {
    /// Creates a decimal type, validating precision and scale.
    pub fn decimal(precision: u8, scale: u8) -> Result<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(Error::type_error(format!(
                "decimal precision must be between 1 and {}, got {}",
                MAX_DECIMAL_PRECISION, precision
            )));
        }
        if scale > precision {
            return Err(Error::type_error(format!(
                "decimal scale {} exceeds precision {}",
                scale, precision
            )));
        }
        Ok(DataType::Decimal { precision, scale })
    }

    /// Checks the parameters of a type built without [`DataType::decimal`].
    pub fn validate(&self) -> Result<()> {
        match *self {
            DataType::Decimal { precision, scale } => Self::decimal(precision, scale).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Returns whether this is an integer type.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Returns whether this is a floating point type.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Returns whether this is a decimal type.
    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, DataType::Decimal { .. })
    }

    /// Returns whether this type takes part in arithmetic.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_decimal()
    }

    /// Returns whether this is a date or timestamp type.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }

    /// Number of decimal digits needed to hold any value of an integer type.
    pub fn integer_digits(&self) -> Option<u8> {
        match self {
            DataType::Int8 => Some(3),
            DataType::Int16 => Some(5),
            DataType::Int32 => Some(10),
            DataType::Int64 => Some(19),
            _ => None,
        }
    }

    /// Bit width of integer and floating types.
    pub fn bit_width(&self) -> Option<u8> {
        match self {
            DataType::Int8 => Some(8),
            DataType::Int16 => Some(16),
            DataType::Int32 | DataType::Float32 => Some(32),
            DataType::Int64 | DataType::Float64 => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => f.write_str("null"),
            DataType::Boolean => f.write_str("boolean"),
            DataType::Int8 => f.write_str("int8"),
            DataType::Int16 => f.write_str("int16"),
            DataType::Int32 => f.write_str("int32"),
            DataType::Int64 => f.write_str("int64"),
            DataType::Float32 => f.write_str("float32"),
            DataType::Float64 => f.write_str("float64"),
            DataType::Decimal { precision, scale } => {
                write!(f, "decimal({},{})", precision, scale)
            }
            DataType::String => f.write_str("string"),
            DataType::Date => f.write_str("date"),
            DataType::Timestamp => f.write_str("timestamp"),
            DataType::Binary => f.write_str("binary"),
        }
    }
}
