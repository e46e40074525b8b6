//! Aggregate accumulators.
//!
//! Accumulators support partial aggregation: per-partition states are
//! combined with `merge` before `finish`.

use crate::ast::AggregateFunc;
use alloc::format;
use hashbrown::HashSet;
use quill_core::{
    rescale_decimal, DataType, Decimal, Error, Result, Value, MAX_DECIMAL_PRECISION,
};

/// Computes the result type of an aggregate over `input` (`None` for
/// `count(*)`).
pub fn aggregate_output_type(func: AggregateFunc, input: Option<DataType>) -> Result<DataType> {
    match func {
        AggregateFunc::Count | AggregateFunc::CountDistinct => Ok(DataType::Int64),
        AggregateFunc::Min | AggregateFunc::Max => Ok(input.unwrap_or(DataType::Null)),
        AggregateFunc::Sum => match input {
            Some(DataType::Null) | None => Ok(DataType::Int64),
            Some(t) if t.is_integer() => Ok(DataType::Int64),
            Some(t) if t.is_float() => Ok(DataType::Float64),
            Some(DataType::Decimal { scale, .. }) => {
                Ok(DataType::Decimal { precision: MAX_DECIMAL_PRECISION, scale })
            }
            Some(t) => Err(non_numeric(func, t)),
        },
        AggregateFunc::Avg => match input {
            Some(DataType::Null) | None => Ok(DataType::Float64),
            Some(t) if t.is_integer() || t.is_float() => Ok(DataType::Float64),
            Some(DataType::Decimal { scale, .. }) => Ok(DataType::Decimal {
                precision: MAX_DECIMAL_PRECISION,
                scale: (scale + 4).min(MAX_DECIMAL_PRECISION),
            }),
            Some(t) => Err(non_numeric(func, t)),
        },
    }
}

fn non_numeric(func: AggregateFunc, t: DataType) -> Error {
    Error::type_error(format!("{}() requires a numeric argument, got {}", func.name(), t))
}

#[derive(Clone, Debug)]
enum State {
    Count(i64),
    SumInt(Option<i64>),
    SumFloat(Option<f64>),
    SumDecimal(Option<Decimal>),
    AvgInt { sum: i128, count: i64 },
    AvgFloat { sum: f64, count: i64 },
    AvgDecimal { sum: Decimal, count: i64 },
    Min(Option<Value>),
    Max(Option<Value>),
    Distinct(HashSet<Value>),
}

/// Running state of one aggregate call.
#[derive(Clone, Debug)]
pub struct Accumulator {
    func: AggregateFunc,
    /// `count(*)` counts every row, nulls included.
    count_rows: bool,
    output_type: DataType,
    state: State,
}

impl Accumulator {
    /// Creates an accumulator for `func` over values of `input`, or for
    /// `count(*)` when `input` is `None`.
    pub fn new(func: AggregateFunc, input: Option<DataType>) -> Result<Self> {
        let output_type = aggregate_output_type(func, input)?;
        let input_type = input.unwrap_or(DataType::Null);
        let state = match func {
            AggregateFunc::Count => State::Count(0),
            AggregateFunc::CountDistinct => State::Distinct(HashSet::new()),
            AggregateFunc::Min => State::Min(None),
            AggregateFunc::Max => State::Max(None),
            AggregateFunc::Sum if input_type.is_float() => State::SumFloat(None),
            AggregateFunc::Sum if input_type.is_decimal() => State::SumDecimal(None),
            AggregateFunc::Sum => State::SumInt(None),
            AggregateFunc::Avg if input_type.is_float() => State::AvgFloat { sum: 0.0, count: 0 },
            AggregateFunc::Avg if input_type.is_decimal() => State::AvgDecimal {
                sum: Decimal::ZERO,
                count: 0,
            },
            AggregateFunc::Avg => State::AvgInt { sum: 0, count: 0 },
        };
        Ok(Self {
            func,
            count_rows: input.is_none() && func == AggregateFunc::Count,
            output_type,
            state,
        })
    }

    /// The type `finish` produces.
    pub fn output_type(&self) -> DataType {
        self.output_type
    }

    /// Folds one input value into the state.
    pub fn update(&mut self, value: &Value) -> Result<()> {
        if let State::Count(n) = &mut self.state {
            if self.count_rows || !value.is_null() {
                *n += 1;
            }
            return Ok(());
        }
        if value.is_null() {
            return Ok(());
        }
        let func = self.func;
        match &mut self.state {
            State::Count(_) => {}
            State::SumInt(sum) => {
                let v = expect_i64(func, value)?;
                *sum = Some(match sum {
                    Some(s) => s.checked_add(v).ok_or_else(sum_overflow)?,
                    None => v,
                });
            }
            State::SumFloat(sum) => {
                let v = expect_f64(func, value)?;
                *sum = Some(sum.unwrap_or(0.0) + v);
            }
            State::SumDecimal(sum) => {
                let v = expect_decimal(func, value)?;
                *sum = Some(match sum {
                    Some(s) => s.checked_add(v).ok_or_else(sum_overflow)?,
                    None => v,
                });
            }
            State::AvgInt { sum, count } => {
                *sum += expect_i64(func, value)? as i128;
                *count += 1;
            }
            State::AvgFloat { sum, count } => {
                *sum += expect_f64(func, value)?;
                *count += 1;
            }
            State::AvgDecimal { sum, count } => {
                *sum = sum
                    .checked_add(expect_decimal(func, value)?)
                    .ok_or_else(sum_overflow)?;
                *count += 1;
            }
            State::Min(current) => {
                if current.as_ref().map_or(true, |c| value < c) {
                    *current = Some(value.clone());
                }
            }
            State::Max(current) => {
                if current.as_ref().map_or(true, |c| value > c) {
                    *current = Some(value.clone());
                }
            }
            State::Distinct(seen) => {
                if !seen.contains(value) {
                    seen.insert(value.clone());
                }
            }
        }
        Ok(())
    }

    /// Combines another partial state of the same aggregate into this one.
    pub fn merge(&mut self, other: Accumulator) -> Result<()> {
        match (&mut self.state, other.state) {
            (State::Count(a), State::Count(b)) => *a += b,
            (State::SumInt(a), State::SumInt(b)) => {
                *a = match (*a, b) {
                    (Some(x), Some(y)) => Some(x.checked_add(y).ok_or_else(sum_overflow)?),
                    (x, y) => x.or(y),
                }
            }
            (State::SumFloat(a), State::SumFloat(b)) => {
                *a = match (*a, b) {
                    (Some(x), Some(y)) => Some(x + y),
                    (x, y) => x.or(y),
                }
            }
            (State::SumDecimal(a), State::SumDecimal(b)) => {
                *a = match (*a, b) {
                    (Some(x), Some(y)) => Some(x.checked_add(y).ok_or_else(sum_overflow)?),
                    (x, y) => x.or(y),
                }
            }
            (State::AvgInt { sum, count }, State::AvgInt { sum: s, count: c }) => {
                *sum += s;
                *count += c;
            }
            (State::AvgFloat { sum, count }, State::AvgFloat { sum: s, count: c }) => {
                *sum += s;
                *count += c;
            }
            (State::AvgDecimal { sum, count }, State::AvgDecimal { sum: s, count: c }) => {
                *sum = sum.checked_add(s).ok_or_else(sum_overflow)?;
                *count += c;
            }
            (State::Min(a), State::Min(b)) => {
                if let Some(b) = b {
                    if a.as_ref().map_or(true, |x| b < *x) {
                        *a = Some(b);
                    }
                }
            }
            (State::Max(a), State::Max(b)) => {
                if let Some(b) = b {
                    if a.as_ref().map_or(true, |x| b > *x) {
                        *a = Some(b);
                    }
                }
            }
            (State::Distinct(a), State::Distinct(b)) => a.extend(b),
            _ => {
                return Err(Error::type_error(format!(
                    "cannot merge {}() states of different shapes",
                    self.func.name()
                )))
            }
        }
        Ok(())
    }

    /// Produces the aggregate result.
    pub fn finish(self) -> Result<Value> {
        match self.state {
            State::Count(n) => Ok(Value::Int64(n)),
            State::Distinct(seen) => Ok(Value::Int64(seen.len() as i64)),
            State::SumInt(sum) => Ok(sum.map_or(Value::Null, Value::Int64)),
            State::SumFloat(sum) => Ok(sum.map_or(Value::Null, Value::Float64)),
            State::SumDecimal(None) => Ok(Value::Null),
            State::SumDecimal(Some(sum)) => self.fit_decimal(sum),
            State::AvgInt { count: 0, .. }
            | State::AvgFloat { count: 0, .. }
            | State::AvgDecimal { count: 0, .. } => Ok(Value::Null),
            State::AvgInt { sum, count } => Ok(Value::Float64(sum as f64 / count as f64)),
            State::AvgFloat { sum, count } => Ok(Value::Float64(sum / count as f64)),
            State::AvgDecimal { sum, count } => {
                let avg = sum
                    .checked_div(Decimal::from(count))
                    .ok_or_else(|| Error::arithmetic("decimal overflow in avg()"))?;
                self.fit_decimal(avg)
            }
            State::Min(v) | State::Max(v) => Ok(v.unwrap_or(Value::Null)),
        }
    }

    fn fit_decimal(&self, d: Decimal) -> Result<Value> {
        match self.output_type {
            DataType::Decimal { precision, scale } => {
                rescale_decimal(d, precision, scale).map(Value::Decimal)
            }
            _ => Ok(Value::Decimal(d)),
        }
    }
}

fn sum_overflow() -> Error {
    Error::arithmetic("overflow in sum()")
}

fn mismatch(func: AggregateFunc, value: &Value) -> Error {
    Error::type_error(format!(
        "{}() received a value of type {}",
        func.name(),
        value.data_type()
    ))
}

fn expect_i64(func: AggregateFunc, value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| mismatch(func, value))
}

fn expect_f64(func: AggregateFunc, value: &Value) -> Result<f64> {
    match value {
        Value::Float32(f) => Ok(*f as f64),
        Value::Float64(f) => Ok(*f),
        _ => Err(mismatch(func, value)),
    }
}

fn expect_decimal(func: AggregateFunc, value: &Value) -> Result<Decimal> {
    match value {
        Value::Decimal(d) => Ok(*d),
        _ => Err(mismatch(func, value)),
    }
}
