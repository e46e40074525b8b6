//! Expression resolution: binds column names to positions, infers types and
//! nullability, and inserts the implicit casts that give every operator's
//! operands one common type.

use crate::ast::{
    BinaryOp, Expr, NullOrder, ScalarFunc, SortKey, SortOrder, TypedExpr, TypedExprKind,
    TypedSortKey, UnaryOp,
};
use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use quill_core::schema::Schema;
use quill_core::{can_cast, resolve_type, resolve_types, DataType, Error, Result};

/// Resolves an expression against the schema of its input.
pub fn resolve_expr(expr: &Expr, schema: &Schema) -> Result<TypedExpr> {
    match expr {
        Expr::Column(name) => {
            let index = schema.resolve(name)?;
            let column = &schema.columns()[index];
            Ok(TypedExpr::column(
                index,
                column.data_type(),
                column.is_nullable(),
            ))
        }
        Expr::Literal(value) => Ok(TypedExpr::literal(value.clone())),
        Expr::Alias { expr, .. } => resolve_expr(expr, schema),
        Expr::BinaryOp { left, op, right } => resolve_binary(
            *op,
            resolve_expr(left, schema)?,
            resolve_expr(right, schema)?,
        ),
        Expr::UnaryOp { op, expr } => resolve_unary(*op, resolve_expr(expr, schema)?),
        Expr::Function { name, args } => {
            let func = ScalarFunc::from_name(name)
                .ok_or_else(|| Error::schema(format!("unknown function '{}'", name)))?;
            let args = resolve_all(args, schema)?;
            resolve_function(func, args)
        }
        Expr::Case {
            when_then,
            otherwise,
        } => resolve_case(when_then, otherwise.as_deref(), schema),
        Expr::Cast { expr, data_type } => {
            data_type.validate()?;
            let inner = resolve_expr(expr, schema)?;
            if !can_cast(inner.data_type, *data_type) {
                return Err(Error::type_error(format!(
                    "cannot cast {} to {}",
                    inner.data_type, data_type
                )));
            }
            Ok(inner.coerce_to(*data_type))
        }
        Expr::In {
            expr,
            list,
            negated,
        } => {
            let probe = resolve_expr(expr, schema)?;
            let items = resolve_all(list, schema)?;
            let t = resolve_types(
                core::iter::once(probe.data_type).chain(items.iter().map(|i| i.data_type)),
            )?;
            let nullable = probe.nullable || items.iter().any(|i| i.nullable);
            let kind = TypedExprKind::In {
                expr: Box::new(probe.coerce_to(t)),
                list: items.into_iter().map(|i| i.coerce_to(t)).collect(),
                negated: *negated,
            };
            Ok(TypedExpr::new(kind, DataType::Boolean, nullable))
        }
        Expr::Between {
            expr,
            low,
            high,
            negated,
        } => {
            let probe = resolve_expr(expr, schema)?;
            let low = resolve_expr(low, schema)?;
            let high = resolve_expr(high, schema)?;
            let t = resolve_types([probe.data_type, low.data_type, high.data_type])?;
            let nullable = probe.nullable || low.nullable || high.nullable;
            let kind = TypedExprKind::Between {
                expr: Box::new(probe.coerce_to(t)),
                low: Box::new(low.coerce_to(t)),
                high: Box::new(high.coerce_to(t)),
                negated: *negated,
            };
            Ok(TypedExpr::new(kind, DataType::Boolean, nullable))
        }
    }
}

/// Resolves an expression that must produce a boolean.
pub fn resolve_predicate(expr: &Expr, schema: &Schema) -> Result<TypedExpr> {
    let typed = resolve_expr(expr, schema)?;
    expect_boolean("predicate", typed.data_type)?;
    Ok(typed)
}

/// Resolves an ORDER BY key, fixing its effective null placement.
pub fn resolve_sort_key(key: &SortKey, schema: &Schema) -> Result<TypedSortKey> {
    Ok(TypedSortKey {
        expr: resolve_expr(&key.expr, schema)?,
        descending: key.order == SortOrder::Desc,
        nulls_first: key.null_order() == NullOrder::First,
    })
}

fn resolve_all(exprs: &[Expr], schema: &Schema) -> Result<Vec<TypedExpr>> {
    exprs.iter().map(|e| resolve_expr(e, schema)).collect()
}

fn expect_boolean(what: &str, t: DataType) -> Result<()> {
    match t {
        DataType::Boolean | DataType::Null => Ok(()),
        other => Err(Error::type_error(format!(
            "{} must be boolean, got {}",
            what, other
        ))),
    }
}

fn binary(op: BinaryOp, left: TypedExpr, right: TypedExpr, t: DataType, nullable: bool) -> TypedExpr {
    TypedExpr::new(
        TypedExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        t,
        nullable,
    )
}

fn resolve_binary(op: BinaryOp, left: TypedExpr, right: TypedExpr) -> Result<TypedExpr> {
    let nullable = left.nullable || right.nullable;
    match op {
        BinaryOp::And | BinaryOp::Or => {
            expect_boolean(op.symbol(), left.data_type)?;
            expect_boolean(op.symbol(), right.data_type)?;
            let left = left.coerce_to(DataType::Boolean);
            let right = right.coerce_to(DataType::Boolean);
            Ok(binary(op, left, right, DataType::Boolean, nullable))
        }
        BinaryOp::Like => {
            for t in [left.data_type, right.data_type] {
                if !matches!(t, DataType::String | DataType::Null) {
                    return Err(Error::type_error(format!(
                        "LIKE requires string operands, got {}",
                        t
                    )));
                }
            }
            let left = left.coerce_to(DataType::String);
            let right = right.coerce_to(DataType::String);
            Ok(binary(op, left, right, DataType::Boolean, nullable))
        }
        _ if op.is_comparison() => {
            let t = resolve_type(left.data_type, right.data_type)?;
            Ok(binary(
                op,
                left.coerce_to(t),
                right.coerce_to(t),
                DataType::Boolean,
                nullable,
            ))
        }
        _ => {
            let t = resolve_type(left.data_type, right.data_type)?;
            if !t.is_numeric() && t != DataType::Null {
                return Err(Error::type_error(format!(
                    "cannot apply '{}' to {} and {}",
                    op.symbol(),
                    left.data_type,
                    right.data_type
                )));
            }
            Ok(binary(op, left.coerce_to(t), right.coerce_to(t), t, nullable))
        }
    }
}

fn resolve_unary(op: UnaryOp, operand: TypedExpr) -> Result<TypedExpr> {
    let (data_type, nullable) = match op {
        UnaryOp::IsNull | UnaryOp::IsNotNull => (DataType::Boolean, false),
        UnaryOp::Not => {
            expect_boolean("NOT operand", operand.data_type)?;
            (DataType::Boolean, operand.nullable)
        }
        UnaryOp::Neg => {
            let t = operand.data_type;
            if !t.is_numeric() && t != DataType::Null {
                return Err(Error::type_error(format!("cannot negate {}", t)));
            }
            (t, operand.nullable)
        }
    };
    let operand = if op == UnaryOp::Not {
        operand.coerce_to(DataType::Boolean)
    } else {
        operand
    };
    Ok(TypedExpr::new(
        TypedExprKind::Unary {
            op,
            expr: Box::new(operand),
        },
        data_type,
        nullable,
    ))
}

fn check_arity(func: ScalarFunc, args: &[TypedExpr], min: usize, max: Option<usize>) -> Result<()> {
    let n = args.len();
    if n < min || max.map_or(false, |m| n > m) {
        return Err(Error::type_error(format!(
            "wrong number of arguments to {}(): {}",
            func.name(),
            n
        )));
    }
    Ok(())
}

fn expect_arg(func: ScalarFunc, t: DataType, ok: bool) -> Result<()> {
    if ok || t == DataType::Null {
        Ok(())
    } else {
        Err(Error::type_error(format!(
            "invalid argument type {} for {}()",
            t,
            func.name()
        )))
    }
}

fn call(func: ScalarFunc, args: Vec<TypedExpr>, t: DataType, nullable: bool) -> TypedExpr {
    TypedExpr::new(TypedExprKind::Function { func, args }, t, nullable)
}

fn resolve_function(func: ScalarFunc, args: Vec<TypedExpr>) -> Result<TypedExpr> {
    let any_nullable = args.iter().any(|a| a.nullable);
    match func {
        ScalarFunc::Coalesce => {
            check_arity(func, &args, 1, None)?;
            let t = resolve_types(args.iter().map(|a| a.data_type))?;
            let nullable = args.iter().all(|a| a.nullable);
            let args = args.into_iter().map(|a| a.coerce_to(t)).collect();
            Ok(call(func, args, t, nullable))
        }
        ScalarFunc::NullIf => {
            check_arity(func, &args, 2, Some(2))?;
            let t = resolve_types(args.iter().map(|a| a.data_type))?;
            let args = args.into_iter().map(|a| a.coerce_to(t)).collect();
            Ok(call(func, args, t, true))
        }
        ScalarFunc::Abs => {
            check_arity(func, &args, 1, Some(1))?;
            let t = args[0].data_type;
            expect_arg(func, t, t.is_numeric())?;
            Ok(call(func, args, t, any_nullable))
        }
        ScalarFunc::Round => {
            check_arity(func, &args, 1, Some(2))?;
            let t = args[0].data_type;
            expect_arg(func, t, t.is_numeric())?;
            if let Some(digits) = args.get(1) {
                expect_arg(func, digits.data_type, digits.data_type.is_integer())?;
            }
            Ok(call(func, args, t, any_nullable))
        }
        ScalarFunc::Upper | ScalarFunc::Lower => {
            check_arity(func, &args, 1, Some(1))?;
            let t = args[0].data_type;
            expect_arg(func, t, t == DataType::String)?;
            let args = args.into_iter().map(|a| a.coerce_to(DataType::String)).collect();
            Ok(call(func, args, DataType::String, any_nullable))
        }
        ScalarFunc::Length => {
            check_arity(func, &args, 1, Some(1))?;
            let t = args[0].data_type;
            expect_arg(func, t, matches!(t, DataType::String | DataType::Binary))?;
            Ok(call(func, args, DataType::Int64, any_nullable))
        }
        ScalarFunc::Concat => {
            check_arity(func, &args, 1, None)?;
            Ok(call(func, args, DataType::String, any_nullable))
        }
    }
}

fn resolve_case(
    when_then: &[(Expr, Expr)],
    otherwise: Option<&Expr>,
    schema: &Schema,
) -> Result<TypedExpr> {
    if when_then.is_empty() {
        return Err(Error::type_error("CASE requires at least one WHEN branch"));
    }
    let mut conditions = Vec::with_capacity(when_then.len());
    let mut results = Vec::with_capacity(when_then.len());
    for (cond, then) in when_then {
        let cond = resolve_expr(cond, schema)?;
        expect_boolean("CASE condition", cond.data_type)?;
        conditions.push(cond.coerce_to(DataType::Boolean));
        results.push(resolve_expr(then, schema)?);
    }
    let otherwise = otherwise.map(|e| resolve_expr(e, schema)).transpose()?;

    let t = resolve_types(
        results
            .iter()
            .chain(otherwise.iter())
            .map(|r| r.data_type),
    )?;
    let nullable = otherwise.as_ref().map_or(true, |o| o.nullable) || results.iter().any(|r| r.nullable);
    let when_then = conditions
        .into_iter()
        .zip(results)
        .map(|(c, r)| (c, r.coerce_to(t)))
        .collect();
    let otherwise = otherwise.map(|o| Box::new(o.coerce_to(t)));
    Ok(TypedExpr::new(
        TypedExprKind::Case {
            when_then,
            otherwise,
        },
        t,
        nullable,
    ))
}
