//! Scalar expression evaluation under SQL three-valued logic.
//!
//! Operands of binary operators, `IN` and `BETWEEN` already share one type
//! (resolution inserted the casts), so evaluation never coerces implicitly.

use crate::ast::{BinaryOp, ScalarFunc, TypedExpr, TypedExprKind, UnaryOp};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use quill_core::pattern_match::like;
use quill_core::{rescale_decimal, DataType, Decimal, Error, Result, Row, Value};
use rust_decimal::RoundingStrategy;

/// Evaluates an expression against a row.
pub fn evaluate(expr: &TypedExpr, row: &Row) -> Result<Value> {
    match &expr.kind {
        TypedExprKind::Column(index) => row.get(*index).cloned().ok_or_else(|| {
            Error::schema(format!(
                "column index {} out of range for row of width {}",
                index,
                row.len()
            ))
        }),
        TypedExprKind::Literal(value) => Ok(value.clone()),
        TypedExprKind::Binary { op, left, right } => {
            eval_binary(*op, left, right, row, expr.data_type)
        }
        TypedExprKind::Unary { op, expr: inner } => eval_unary(*op, evaluate(inner, row)?),
        TypedExprKind::Function { func, args } => {
            eval_function(*func, args, row, expr.data_type)
        }
        TypedExprKind::Case {
            when_then,
            otherwise,
        } => {
            for (cond, then) in when_then {
                if evaluate_predicate(cond, row)? {
                    return evaluate(then, row);
                }
            }
            match otherwise {
                Some(e) => evaluate(e, row),
                None => Ok(Value::Null),
            }
        }
        TypedExprKind::Cast(inner) => evaluate(inner, row)?.cast_to(expr.data_type),
        TypedExprKind::In {
            expr: probe,
            list,
            negated,
        } => eval_in(probe, list, *negated, row),
        TypedExprKind::Between {
            expr: probe,
            low,
            high,
            negated,
        } => {
            let v = evaluate(probe, row)?;
            let lo = evaluate(low, row)?;
            let hi = evaluate(high, row)?;
            let ge = compare_truth(&v, &lo, BinaryOp::Ge);
            let le = compare_truth(&v, &hi, BinaryOp::Le);
            let result = and3(ge, le);
            Ok(bool_value(if *negated { result.map(|b| !b) } else { result }))
        }
    }
}

/// Evaluates a predicate. `NULL` and `false` both reject the row.
pub fn evaluate_predicate(expr: &TypedExpr, row: &Row) -> Result<bool> {
    Ok(truth(evaluate(expr, row)?)?.unwrap_or(false))
}

/// Evaluates each expression against a row, producing the output row.
pub fn evaluate_row(exprs: &[TypedExpr], row: &Row) -> Result<Row> {
    exprs
        .iter()
        .map(|e| evaluate(e, row))
        .collect::<Result<Vec<_>>>()
        .map(Row::new)
}

/// Converts a boolean or null value to an optional truth value.
fn truth(value: Value) -> Result<Option<bool>> {
    match value {
        Value::Boolean(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(Error::type_error(format!(
            "expected boolean, got {}",
            other.data_type()
        ))),
    }
}

fn bool_value(v: Option<bool>) -> Value {
    match v {
        Some(b) => Value::Boolean(b),
        None => Value::Null,
    }
}

fn and3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// SQL comparison: unknown when either side is null.
fn compare_truth(l: &Value, r: &Value, op: BinaryOp) -> Option<bool> {
    let ord = super::compare::sql_compare(l, r)?;
    Some(match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::Ne => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Le => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::Ge => ord != Ordering::Less,
        _ => return None,
    })
}

fn eval_binary(
    op: BinaryOp,
    left: &TypedExpr,
    right: &TypedExpr,
    row: &Row,
    result_type: DataType,
) -> Result<Value> {
    match op {
        BinaryOp::And => {
            let l = truth(evaluate(left, row)?)?;
            if l == Some(false) {
                return Ok(Value::Boolean(false));
            }
            let r = truth(evaluate(right, row)?)?;
            Ok(bool_value(and3(l, r)))
        }
        BinaryOp::Or => {
            let l = truth(evaluate(left, row)?)?;
            if l == Some(true) {
                return Ok(Value::Boolean(true));
            }
            let r = truth(evaluate(right, row)?)?;
            Ok(bool_value(or3(l, r)))
        }
        _ => {
            let l = evaluate(left, row)?;
            let r = evaluate(right, row)?;
            if l.is_null() || r.is_null() {
                return Ok(Value::Null);
            }
            if op.is_comparison() {
                return Ok(bool_value(compare_truth(&l, &r, op)));
            }
            if op == BinaryOp::Like {
                return match (l.as_str(), r.as_str()) {
                    (Some(s), Some(p)) => Ok(Value::Boolean(like(s, p))),
                    _ => Err(Error::type_error("LIKE requires string operands")),
                };
            }
            arithmetic(op, &l, &r, result_type)
        }
    }
}

fn overflow(op: BinaryOp, t: DataType) -> Error {
    Error::arithmetic(format!("{} overflow in '{}'", t, op.symbol()))
}

fn division_by_zero() -> Error {
    Error::arithmetic("division by zero")
}

/// Checked integer arithmetic in i64; narrower widths are checked by the
/// caller when converting back.
fn int_arith(op: BinaryOp, a: i64, b: i64, t: DataType) -> Result<i64> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Err(division_by_zero()),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod if b == 0 => return Err(division_by_zero()),
        BinaryOp::Mod => a.checked_rem(b),
        _ => None,
    };
    result.ok_or_else(|| overflow(op, t))
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

fn float32_arith(op: BinaryOp, a: f32, b: f32) -> f32 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

fn decimal_arith(op: BinaryOp, a: Decimal, b: Decimal, t: DataType) -> Result<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b.is_zero() => return Err(division_by_zero()),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod if b.is_zero() => return Err(division_by_zero()),
        BinaryOp::Mod => a.checked_rem(b),
        _ => None,
    }
    .ok_or_else(|| overflow(op, t))?;
    match t {
        DataType::Decimal { precision, scale } => {
            rescale_decimal(result, precision, scale).map(Value::Decimal)
        }
        _ => Ok(Value::Decimal(result)),
    }
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value, t: DataType) -> Result<Value> {
    match (l, r) {
        (Value::Int8(a), Value::Int8(b)) => {
            let v = int_arith(op, *a as i64, *b as i64, t)?;
            i8::try_from(v).map(Value::Int8).map_err(|_| overflow(op, t))
        }
        (Value::Int16(a), Value::Int16(b)) => {
            let v = int_arith(op, *a as i64, *b as i64, t)?;
            i16::try_from(v).map(Value::Int16).map_err(|_| overflow(op, t))
        }
        (Value::Int32(a), Value::Int32(b)) => {
            let v = int_arith(op, *a as i64, *b as i64, t)?;
            i32::try_from(v).map(Value::Int32).map_err(|_| overflow(op, t))
        }
        (Value::Int64(a), Value::Int64(b)) => int_arith(op, *a, *b, t).map(Value::Int64),
        (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(float32_arith(op, *a, *b))),
        (Value::Float64(a), Value::Float64(b)) => Ok(Value::Float64(float_arith(op, *a, *b))),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_arith(op, *a, *b, t),
        _ => Err(Error::type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            l.data_type(),
            r.data_type()
        ))),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value> {
    match op {
        UnaryOp::IsNull => Ok(Value::Boolean(value.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Boolean(!value.is_null())),
        UnaryOp::Not => Ok(bool_value(truth(value)?.map(|b| !b))),
        UnaryOp::Neg => {
            let neg_overflow = |t: DataType| Error::arithmetic(format!("{} overflow in negation", t));
            match value {
                Value::Null => Ok(Value::Null),
                Value::Int8(i) => i.checked_neg().map(Value::Int8).ok_or_else(|| neg_overflow(DataType::Int8)),
                Value::Int16(i) => i.checked_neg().map(Value::Int16).ok_or_else(|| neg_overflow(DataType::Int16)),
                Value::Int32(i) => i.checked_neg().map(Value::Int32).ok_or_else(|| neg_overflow(DataType::Int32)),
                Value::Int64(i) => i.checked_neg().map(Value::Int64).ok_or_else(|| neg_overflow(DataType::Int64)),
                Value::Float32(f) => Ok(Value::Float32(-f)),
                Value::Float64(f) => Ok(Value::Float64(-f)),
                Value::Decimal(d) => Ok(Value::Decimal(-d)),
                other => Err(Error::type_error(format!(
                    "cannot negate {}",
                    other.data_type()
                ))),
            }
        }
    }
}

fn eval_in(probe: &TypedExpr, list: &[TypedExpr], negated: bool, row: &Row) -> Result<Value> {
    if list.is_empty() {
        return Ok(Value::Boolean(negated));
    }
    let v = evaluate(probe, row)?;
    if v.is_null() {
        return Ok(Value::Null);
    }
    let mut saw_null = false;
    for item in list {
        let candidate = evaluate(item, row)?;
        if candidate.is_null() {
            saw_null = true;
        } else {
            match compare_truth(&v, &candidate, BinaryOp::Eq) {
                Some(true) => return Ok(Value::Boolean(!negated)),
                Some(false) => {}
                None => saw_null = true,
            }
        }
    }
    if saw_null {
        Ok(Value::Null)
    } else {
        Ok(Value::Boolean(negated))
    }
}

fn arg<'a>(func: ScalarFunc, args: &'a [TypedExpr], index: usize) -> Result<&'a TypedExpr> {
    args.get(index).ok_or_else(|| {
        Error::type_error(format!(
            "{}() is missing argument {}",
            func.name(),
            index + 1
        ))
    })
}

fn eval_function(
    func: ScalarFunc,
    args: &[TypedExpr],
    row: &Row,
    result_type: DataType,
) -> Result<Value> {
    match func {
        ScalarFunc::Coalesce => {
            for a in args {
                let v = evaluate(a, row)?;
                if !v.is_null() {
                    return Ok(v);
                }
            }
            Ok(Value::Null)
        }
        ScalarFunc::NullIf => {
            let a = evaluate(arg(func, args, 0)?, row)?;
            let b = evaluate(arg(func, args, 1)?, row)?;
            if compare_truth(&a, &b, BinaryOp::Eq) == Some(true) {
                Ok(Value::Null)
            } else {
                Ok(a)
            }
        }
        ScalarFunc::Abs => abs(evaluate(arg(func, args, 0)?, row)?),
        ScalarFunc::Round => {
            let v = evaluate(arg(func, args, 0)?, row)?;
            let digits = match args.get(1) {
                Some(d) => match evaluate(d, row)? {
                    Value::Null => return Ok(Value::Null),
                    other => other
                        .as_i64()
                        .ok_or_else(|| Error::type_error("round() digits must be an integer"))?,
                },
                None => 0,
            };
            round(v, digits, result_type)
        }
        ScalarFunc::Upper | ScalarFunc::Lower => match evaluate(arg(func, args, 0)?, row)? {
            Value::Null => Ok(Value::Null),
            Value::String(s) if func == ScalarFunc::Upper => Ok(Value::String(s.to_uppercase())),
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            other => Err(Error::type_error(format!(
                "{}() expects string, got {}",
                func.name(),
                other.data_type()
            ))),
        },
        ScalarFunc::Length => match evaluate(arg(func, args, 0)?, row)? {
            Value::Null => Ok(Value::Null),
            Value::String(s) => Ok(Value::Int64(s.chars().count() as i64)),
            Value::Binary(b) => Ok(Value::Int64(b.len() as i64)),
            other => Err(Error::type_error(format!(
                "length() expects string or binary, got {}",
                other.data_type()
            ))),
        },
        ScalarFunc::Concat => {
            let mut out = String::new();
            for a in args {
                match evaluate(a, row)? {
                    Value::Null => return Ok(Value::Null),
                    Value::String(s) => out.push_str(&s),
                    other => out.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(out))
        }
    }
}

fn abs(v: Value) -> Result<Value> {
    let overflow = |t: DataType| Error::arithmetic(format!("{} overflow in abs()", t));
    match v {
        Value::Null => Ok(Value::Null),
        Value::Int8(i) => i.checked_abs().map(Value::Int8).ok_or_else(|| overflow(DataType::Int8)),
        Value::Int16(i) => i.checked_abs().map(Value::Int16).ok_or_else(|| overflow(DataType::Int16)),
        Value::Int32(i) => i.checked_abs().map(Value::Int32).ok_or_else(|| overflow(DataType::Int32)),
        Value::Int64(i) => i.checked_abs().map(Value::Int64).ok_or_else(|| overflow(DataType::Int64)),
        Value::Float32(f) => Ok(Value::Float32(libm::fabsf(f))),
        Value::Float64(f) => Ok(Value::Float64(libm::fabs(f))),
        Value::Decimal(d) => Ok(Value::Decimal(d.abs())),
        other => Err(Error::type_error(format!(
            "abs() expects a numeric argument, got {}",
            other.data_type()
        ))),
    }
}

/// Rounds half away from zero to `digits` decimal places; negative digits
/// round to tens, hundreds and so on.
fn round(v: Value, digits: i64, t: DataType) -> Result<Value> {
    match v {
        Value::Null => Ok(Value::Null),
        Value::Float64(f) => Ok(Value::Float64(round_f64(f, digits))),
        Value::Float32(f) => Ok(Value::Float32(round_f64(f as f64, digits) as f32)),
        Value::Decimal(d) => round_decimal(d, digits, t).map(Value::Decimal),
        other => match other.as_i64() {
            Some(i) => {
                let rounded = round_i64(i, digits, t)?;
                Value::Int64(rounded).cast_to(t)
            }
            None => Err(Error::type_error(format!(
                "round() expects a numeric argument, got {}",
                other.data_type()
            ))),
        },
    }
}

fn round_f64(x: f64, digits: i64) -> f64 {
    let factor = libm::pow(10.0, digits.clamp(-400, 400) as f64);
    if factor == 0.0 {
        return 0.0;
    }
    if !factor.is_finite() {
        return x;
    }
    let scaled = x * factor;
    if !scaled.is_finite() {
        return x;
    }
    libm::round(scaled) / factor
}

fn round_i64(i: i64, digits: i64, t: DataType) -> Result<i64> {
    if digits >= 0 {
        return Ok(i);
    }
    let exp = digits.unsigned_abs();
    if exp > 18 {
        return Ok(0);
    }
    let p = 10i64.pow(exp as u32);
    let q = i / p;
    let rem = i % p;
    let q = if rem.unsigned_abs() * 2 >= p as u64 {
        q + i.signum()
    } else {
        q
    };
    q.checked_mul(p)
        .ok_or_else(|| Error::arithmetic(format!("{} overflow in round()", t)))
}

fn round_decimal(d: Decimal, digits: i64, t: DataType) -> Result<Decimal> {
    let rounded = if digits >= 0 {
        d.round_dp_with_strategy(digits.min(28) as u32, RoundingStrategy::MidpointAwayFromZero)
    } else {
        let exp = digits.unsigned_abs();
        if exp > 28 {
            Decimal::ZERO
        } else {
            let factor = Decimal::try_from_i128_with_scale(10i128.pow(exp as u32), 0)
                .map_err(|_| Error::arithmetic("round() digits out of range"))?;
            d.checked_div(factor)
                .map(|q| q.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
                .and_then(|q| q.checked_mul(factor))
                .ok_or_else(|| Error::arithmetic("decimal overflow in round()"))?
        }
    };
    match t {
        DataType::Decimal { precision, scale } => rescale_decimal(rounded, precision, scale),
        _ => Ok(rounded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypedExprKind as K;
    use alloc::boxed::Box;
    use alloc::vec;
    use core::str::FromStr;
    use quill_core::ErrorKind;

    fn lit(v: impl Into<Value>) -> TypedExpr {
        TypedExpr::literal(v.into())
    }

    fn null_bool() -> TypedExpr {
        TypedExpr::new(K::Literal(Value::Null), DataType::Boolean, true)
    }

    fn bin(op: BinaryOp, l: TypedExpr, r: TypedExpr, t: DataType) -> TypedExpr {
        TypedExpr::new(
            K::Binary {
                op,
                left: Box::new(l),
                right: Box::new(r),
            },
            t,
            true,
        )
    }

    fn eval(e: &TypedExpr) -> Result<Value> {
        evaluate(e, &Row::default())
    }

    #[test]
    fn test_three_valued_logic_table() {
        let b = DataType::Boolean;
        let and_nt = bin(BinaryOp::And, null_bool(), lit(true), b);
        let and_nf = bin(BinaryOp::And, null_bool(), lit(false), b);
        let or_nt = bin(BinaryOp::Or, null_bool(), lit(true), b);
        let or_nf = bin(BinaryOp::Or, null_bool(), lit(false), b);
        assert_eq!(eval(&and_nt).unwrap(), Value::Null);
        assert_eq!(eval(&and_nf).unwrap(), Value::Boolean(false));
        assert_eq!(eval(&or_nt).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&or_nf).unwrap(), Value::Null);
    }

    #[test]
    fn test_null_propagation() {
        let e = bin(
            BinaryOp::Add,
            TypedExpr::new(K::Literal(Value::Null), DataType::Int32, true),
            lit(1i32),
            DataType::Int32,
        );
        assert_eq!(eval(&e).unwrap(), Value::Null);

        let e = bin(
            BinaryOp::Eq,
            TypedExpr::new(K::Literal(Value::Null), DataType::Int32, true),
            TypedExpr::new(K::Literal(Value::Null), DataType::Int32, true),
            DataType::Boolean,
        );
        assert_eq!(eval(&e).unwrap(), Value::Null);

        let is_null = TypedExpr::new(
            K::Unary {
                op: UnaryOp::IsNull,
                expr: Box::new(lit(Value::Null)),
            },
            DataType::Boolean,
            false,
        );
        assert_eq!(eval(&is_null).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_predicate_rejects_null() {
        assert!(!evaluate_predicate(&null_bool(), &Row::default()).unwrap());
        assert!(evaluate_predicate(&lit(true), &Row::default()).unwrap());
    }

    #[test]
    fn test_integer_arithmetic_is_checked() {
        let e = bin(BinaryOp::Div, lit(1i32), lit(0i32), DataType::Int32);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let e = bin(BinaryOp::Mod, lit(1i64), lit(0i64), DataType::Int64);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let e = bin(BinaryOp::Add, lit(100i8), lit(100i8), DataType::Int8);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let e = bin(BinaryOp::Mul, lit(i64::MAX), lit(2i64), DataType::Int64);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let e = bin(BinaryOp::Div, lit(7i32), lit(-2i32), DataType::Int32);
        assert_eq!(eval(&e).unwrap(), Value::Int32(-3));
    }

    #[test]
    fn test_float_division_is_ieee() {
        let e = bin(BinaryOp::Div, lit(1.0f64), lit(0.0f64), DataType::Float64);
        assert_eq!(eval(&e).unwrap(), Value::Float64(f64::INFINITY));

        let e = bin(BinaryOp::Div, lit(-1.0f64), lit(0.0f64), DataType::Float64);
        assert_eq!(eval(&e).unwrap(), Value::Float64(f64::NEG_INFINITY));

        let e = bin(BinaryOp::Div, lit(0.0f64), lit(0.0f64), DataType::Float64);
        assert!(eval(&e).unwrap().as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_decimal_arithmetic_rounds_half_away() {
        let t = DataType::Decimal { precision: 10, scale: 2 };
        let a = lit(Decimal::from_str("1.00").unwrap());
        let b = lit(Decimal::from_str("8.00").unwrap());
        let e = bin(BinaryOp::Div, a, b, t);
        // 0.125 rounds to 0.13
        assert_eq!(eval(&e).unwrap(), Value::Decimal(Decimal::from_str("0.13").unwrap()));

        let a = lit(Decimal::from_str("-1.00").unwrap());
        let b = lit(Decimal::from_str("8.00").unwrap());
        let e = bin(BinaryOp::Div, a, b, t);
        assert_eq!(eval(&e).unwrap(), Value::Decimal(Decimal::from_str("-0.13").unwrap()));

        let zero = lit(Decimal::from_str("0.00").unwrap());
        let e = bin(BinaryOp::Div, lit(Decimal::from_str("1.00").unwrap()), zero, t);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let small = DataType::Decimal { precision: 3, scale: 2 };
        let e = bin(
            BinaryOp::Mul,
            lit(Decimal::from_str("9.99").unwrap()),
            lit(Decimal::from_str("9.99").unwrap()),
            small,
        );
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);
    }

    #[test]
    fn test_case_short_circuits() {
        // The ELSE branch would divide by zero if evaluated.
        let boom = bin(BinaryOp::Div, lit(1i32), lit(0i32), DataType::Int32);
        let e = TypedExpr::new(
            K::Case {
                when_then: vec![(lit(true), lit(7i32))],
                otherwise: Some(Box::new(boom)),
            },
            DataType::Int32,
            false,
        );
        assert_eq!(eval(&e).unwrap(), Value::Int32(7));
    }

    #[test]
    fn test_coalesce_short_circuits() {
        let boom = bin(BinaryOp::Div, lit(1i32), lit(0i32), DataType::Int32);
        let e = TypedExpr::new(
            K::Function {
                func: ScalarFunc::Coalesce,
                args: vec![lit(Value::Null), lit(3i32), boom],
            },
            DataType::Int32,
            false,
        );
        assert_eq!(eval(&e).unwrap(), Value::Int32(3));
    }

    #[test]
    fn test_in_list_three_valued() {
        let in_list = |probe: TypedExpr, list: Vec<TypedExpr>| {
            TypedExpr::new(
                K::In {
                    expr: Box::new(probe),
                    list,
                    negated: false,
                },
                DataType::Boolean,
                true,
            )
        };
        let e = in_list(lit(1i32), vec![lit(1i32), lit(Value::Null)]);
        assert_eq!(eval(&e).unwrap(), Value::Boolean(true));
        let e = in_list(lit(2i32), vec![lit(1i32), lit(Value::Null)]);
        assert_eq!(eval(&e).unwrap(), Value::Null);
        let e = in_list(lit(2i32), vec![lit(1i32)]);
        assert_eq!(eval(&e).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_nan_comparisons_are_unknown() {
        let b = DataType::Boolean;
        let nan = || lit(f64::NAN);
        let e = bin(BinaryOp::Gt, nan(), lit(0.5f64), b);
        assert_eq!(eval(&e).unwrap(), Value::Null);
        let e = bin(BinaryOp::Eq, nan(), nan(), b);
        assert_eq!(eval(&e).unwrap(), Value::Null);
        let e = bin(BinaryOp::Lt, lit(0.5f64), nan(), b);
        assert_eq!(eval(&e).unwrap(), Value::Null);
        let e = bin(BinaryOp::Gt, lit(1.5f64), lit(0.5f64), b);
        assert_eq!(eval(&e).unwrap(), Value::Boolean(true));

        let e = TypedExpr::new(
            K::In {
                expr: Box::new(nan()),
                list: vec![nan(), lit(1.0f64)],
                negated: false,
            },
            b,
            true,
        );
        assert_eq!(eval(&e).unwrap(), Value::Null);
    }

    #[test]
    fn test_between() {
        let e = TypedExpr::new(
            K::Between {
                expr: Box::new(lit(5i32)),
                low: Box::new(lit(1i32)),
                high: Box::new(lit(Value::Null)),
                negated: false,
            },
            DataType::Boolean,
            true,
        );
        assert_eq!(eval(&e).unwrap(), Value::Null);

        let e = TypedExpr::new(
            K::Between {
                expr: Box::new(lit(5i32)),
                low: Box::new(lit(6i32)),
                high: Box::new(lit(Value::Null)),
                negated: true,
            },
            DataType::Boolean,
            true,
        );
        assert_eq!(eval(&e).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_functions() {
        let call = |func, args, t| TypedExpr::new(K::Function { func, args }, t, true);
        let e = call(ScalarFunc::Upper, vec![lit("abc")], DataType::String);
        assert_eq!(eval(&e).unwrap(), Value::from("ABC"));

        let e = call(ScalarFunc::Length, vec![lit("héllo")], DataType::Int64);
        assert_eq!(eval(&e).unwrap(), Value::Int64(5));

        let e = call(ScalarFunc::Concat, vec![lit("a"), lit(1i32)], DataType::String);
        assert_eq!(eval(&e).unwrap(), Value::from("a1"));

        let e = call(ScalarFunc::Abs, vec![lit(i32::MIN)], DataType::Int32);
        assert_eq!(eval(&e).unwrap_err().kind(), ErrorKind::Arithmetic);

        let e = call(ScalarFunc::NullIf, vec![lit(3i32), lit(3i32)], DataType::Int32);
        assert_eq!(eval(&e).unwrap(), Value::Null);
    }

    #[test]
    fn test_round() {
        let call = |args, t| TypedExpr::new(K::Function { func: ScalarFunc::Round, args }, t, true);
        let e = call(vec![lit(2.5f64)], DataType::Float64);
        assert_eq!(eval(&e).unwrap(), Value::Float64(3.0));
        let e = call(vec![lit(-2.5f64)], DataType::Float64);
        assert_eq!(eval(&e).unwrap(), Value::Float64(-3.0));
        let e = call(vec![lit(1250i32), lit(-2i64)], DataType::Int32);
        assert_eq!(eval(&e).unwrap(), Value::Int32(1300));

        let t = DataType::Decimal { precision: 6, scale: 3 };
        let e = call(vec![lit(Decimal::from_str("1.245").unwrap()), lit(2i64)], t);
        assert_eq!(eval(&e).unwrap(), Value::Decimal(Decimal::from_str("1.250").unwrap()));
    }

    #[test]
    fn test_like() {
        let e = bin(BinaryOp::Like, lit("hello"), lit("h%o"), DataType::Boolean);
        assert_eq!(eval(&e).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_cast_node() {
        let e = lit(7i32).coerce_to(DataType::Int64);
        assert_eq!(eval(&e).unwrap(), Value::Int64(7));
    }

    #[test]
    fn test_column_reference() {
        let row = Row::new(vec![Value::Int32(1), Value::from("x")]);
        let e = TypedExpr::column(1, DataType::String, false);
        assert_eq!(evaluate(&e, &row).unwrap(), Value::from("x"));
        let e = TypedExpr::column(5, DataType::String, false);
        assert!(evaluate(&e, &row).is_err());
    }
}
