//! Value type definitions for Quill.
//!
//! This module defines the `Value` enum which represents any value exchanged
//! between the core and a backend.
//!
//! `Value`'s `Eq`, `Hash` and `Ord` implement *identity* semantics: `Null`
//! equals `Null`, `NaN` equals `NaN` and `-0.0` equals `0.0`. They back
//! grouping, deduplication and hashing. SQL comparison semantics, where a
//! null operand makes the result unknown, live in the expression evaluator.

use crate::error::{Error, Result};
use crate::temporal::{self, MICROS_PER_DAY};
use crate::types::{DataType, MAX_DECIMAL_PRECISION};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// A single typed value or `Null`.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 8-bit signed integer
    Int8(i8),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Fixed-point decimal
    Decimal(Decimal),
    /// UTF-8 string
    String(String),
    /// Days since 1970-01-01
    Date(i32),
    /// Microseconds since 1970-01-01 00:00:00 UTC
    Timestamp(i64),
    /// Binary data
    Binary(Vec<u8>),
}

impl Value {
    /// Returns the data type of this value. `Null` has the `Null` type and a
    /// decimal reports the narrowest decimal type holding it.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Decimal(d) => {
                let scale = d.scale().min(MAX_DECIMAL_PRECISION as u32) as u8;
                let digits = decimal_digits(d.mantissa().unsigned_abs());
                DataType::Decimal {
                    precision: digits.max(scale).clamp(1, MAX_DECIMAL_PRECISION),
                    scale,
                }
            }
            Value::String(_) => DataType::String,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Binary(_) => DataType::Binary,
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns whether this value may be stored in a column of type `dt`.
    ///
    /// `Null` conforms to every type; nullability is checked by the caller.
    /// A decimal conforms when it fits the precision and scale exactly.
    pub fn conforms_to(&self, dt: DataType) -> bool {
        match (self, dt) {
            (Value::Null, _) => true,
            (Value::Decimal(d), DataType::Decimal { precision, scale }) => {
                rescale_decimal(*d, precision, scale).map_or(false, |r| r == *d)
            }
            (v, t) => v.data_type() == t,
        }
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integer value widened to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any numeric value as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::Decimal(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Returns the decimal value if this is a Decimal, None otherwise.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is Binary, None otherwise.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Converts this value to `target`.
    ///
    /// `Null` casts to `Null` of any type. Narrowing numeric conversions
    /// that overflow fail with an arithmetic error, as do decimals that do
    /// not fit the target precision. Unparseable strings and conversions
    /// with no defined meaning fail with a type error.
    pub fn cast_to(&self, target: DataType) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        match target {
            DataType::Null => Err(self.cast_error(target)),
            DataType::Boolean => self.cast_to_bool(),
            DataType::Int8 => {
                let v = self.cast_to_i64(target)?;
                i8::try_from(v).map(Value::Int8).map_err(|_| overflow(v, target))
            }
            DataType::Int16 => {
                let v = self.cast_to_i64(target)?;
                i16::try_from(v).map(Value::Int16).map_err(|_| overflow(v, target))
            }
            DataType::Int32 => {
                let v = self.cast_to_i64(target)?;
                i32::try_from(v).map(Value::Int32).map_err(|_| overflow(v, target))
            }
            DataType::Int64 => self.cast_to_i64(target).map(Value::Int64),
            DataType::Float32 => self.cast_to_f64(target).map(|v| Value::Float32(v as f32)),
            DataType::Float64 => self.cast_to_f64(target).map(Value::Float64),
            DataType::Decimal { precision, scale } => {
                let d = self.cast_to_decimal(target)?;
                rescale_decimal(d, precision, scale).map(Value::Decimal)
            }
            DataType::String => match self {
                Value::String(s) => Ok(Value::String(s.clone())),
                Value::Binary(b) => String::from_utf8(b.clone())
                    .map(Value::String)
                    .map_err(|_| Error::type_error("binary value is not valid UTF-8")),
                other => Ok(Value::String(other.to_string())),
            },
            DataType::Date => match self {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Timestamp(ts) => {
                    let days = ts.div_euclid(MICROS_PER_DAY);
                    i32::try_from(days)
                        .map(Value::Date)
                        .map_err(|_| overflow(days, target))
                }
                Value::String(s) => temporal::parse_date(s).map(Value::Date),
                _ => Err(self.cast_error(target)),
            },
            DataType::Timestamp => match self {
                Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
                Value::Date(d) => Ok(Value::Timestamp(*d as i64 * MICROS_PER_DAY)),
                Value::String(s) => temporal::parse_timestamp(s).map(Value::Timestamp),
                _ => Err(self.cast_error(target)),
            },
            DataType::Binary => match self {
                Value::Binary(b) => Ok(Value::Binary(b.clone())),
                Value::String(s) => Ok(Value::Binary(s.as_bytes().to_vec())),
                _ => Err(self.cast_error(target)),
            },
        }
    }

    fn cast_error(&self, target: DataType) -> Error {
        Error::type_error(format!("cannot cast {} to {}", self.data_type(), target))
    }

    fn cast_to_bool(&self) -> Result<Value> {
        match self {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Boolean(true)),
                "false" | "f" | "0" => Ok(Value::Boolean(false)),
                _ => Err(Error::type_error(format!("cannot parse '{}' as boolean", s))),
            },
            other => match other.as_i64() {
                Some(v) => Ok(Value::Boolean(v != 0)),
                None => Err(other.cast_error(DataType::Boolean)),
            },
        }
    }

    /// Float and decimal sources truncate toward zero.
    fn cast_to_i64(&self, target: DataType) -> Result<i64> {
        match self {
            Value::Boolean(b) => Ok(*b as i64),
            Value::Float32(_) | Value::Float64(_) => {
                let f = self.as_f64().unwrap_or(f64::NAN);
                // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
                if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(Error::arithmetic(format!("{} out of range for {}", f, target)))
                }
            }
            Value::Decimal(d) => d
                .trunc()
                .to_i64()
                .ok_or_else(|| Error::arithmetic(format!("{} out of range for {}", d, target))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::type_error(format!("cannot parse '{}' as {}", s, target))),
            other => other.as_i64().ok_or_else(|| other.cast_error(target)),
        }
    }

    fn cast_to_f64(&self, target: DataType) -> Result<f64> {
        match self {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::type_error(format!("cannot parse '{}' as {}", s, target))),
            Value::Boolean(_) => Err(self.cast_error(target)),
            other => other.as_f64().ok_or_else(|| other.cast_error(target)),
        }
    }

    fn cast_to_decimal(&self, target: DataType) -> Result<Decimal> {
        match self {
            Value::Decimal(d) => Ok(*d),
            Value::Float32(_) | Value::Float64(_) => {
                let f = self.as_f64().unwrap_or(f64::NAN);
                Decimal::from_f64(f)
                    .ok_or_else(|| Error::arithmetic(format!("{} out of range for {}", f, target)))
            }
            Value::String(s) => Decimal::from_str(s.trim())
                .map_err(|_| Error::type_error(format!("cannot parse '{}' as {}", s, target))),
            Value::Boolean(_) => Err(self.cast_error(target)),
            other => other
                .as_i64()
                .map(Decimal::from)
                .ok_or_else(|| other.cast_error(target)),
        }
    }

    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int8(_) => 2,
            Value::Int16(_) => 3,
            Value::Int32(_) => 4,
            Value::Int64(_) => 5,
            Value::Float32(_) => 6,
            Value::Float64(_) => 7,
            Value::Decimal(_) => 8,
            Value::String(_) => 9,
            Value::Date(_) => 10,
            Value::Timestamp(_) => 11,
            Value::Binary(_) => 12,
        }
    }
}

/// Rounds `d` half away from zero to `scale` digits and checks it fits
/// `precision` total digits.
pub fn rescale_decimal(d: Decimal, precision: u8, scale: u8) -> Result<Decimal> {
    let mut r = d.round_dp_with_strategy(scale as u32, RoundingStrategy::MidpointAwayFromZero);
    r.rescale(scale as u32);
    let fits = match 10u128.checked_pow(precision as u32) {
        Some(limit) => r.mantissa().unsigned_abs() < limit,
        None => true,
    };
    if r.scale() != scale as u32 || !fits {
        return Err(Error::arithmetic(format!(
            "value {} does not fit decimal({},{})",
            d, precision, scale
        )));
    }
    Ok(r)
}

fn decimal_digits(mut mantissa: u128) -> u8 {
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

fn overflow(v: i64, target: DataType) -> Error {
    Error::arithmetic(format!("{} out of range for {}", v, target))
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn float_cmp(a: f64, b: f64) -> Ordering {
    // NaN sorts after every other float.
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn float_bits(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => float_eq(*a as f64, *b as f64),
            (Value::Float64(a), Value::Float64(b)) => float_eq(*a, *b),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int8(i) => i.hash(state),
            Value::Int16(i) => i.hash(state),
            Value::Int32(i) => i.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float32(f) => float_bits(*f as f64).hash(state),
            Value::Float64(f) => float_bits(*f).hash(state),
            // Decimal's Hash agrees with its numeric equality (1.0 == 1.00).
            Value::Decimal(d) => d.hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Binary(b) => b.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int8(a), Value::Int8(b)) => a.cmp(b),
            (Value::Int16(a), Value::Int16(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float32(a), Value::Float32(b)) => float_cmp(*a as f64, *b as f64),
            (Value::Float64(a), Value::Float64(b)) => float_cmp(*a, *b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            // Null and mixed variants order by type.
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int8(i) => write!(f, "{}", i),
            Value::Int16(i) => write!(f, "{}", i),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => temporal::fmt_date(*d, f),
            Value::Timestamp(t) => temporal::fmt_timestamp(*t, f),
            Value::Binary(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
