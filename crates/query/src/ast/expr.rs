//! Expression AST definitions.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use quill_core::{DataType, Value};

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // String/Pattern
    Like,
}

impl BinaryOp {
    /// Returns true for `=`, `<>`, `<`, `<=`, `>`, `>=`.
    #[inline]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns true for `+`, `-`, `*`, `/`, `%`.
    #[inline]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// SQL spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Like => "LIKE",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Expression AST node.
///
/// Column references are by name and are resolved against the input schema
/// of the operator that owns the expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Scalar function call.
    Function { name: String, args: Vec<Expr> },
    /// Searched CASE expression.
    Case {
        when_then: Vec<(Expr, Expr)>,
        otherwise: Option<Box<Expr>>,
    },
    /// Explicit CAST.
    Cast { expr: Box<Expr>, data_type: DataType },
    /// `[NOT] IN (list)` expression.
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    /// `[NOT] BETWEEN low AND high` expression.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    /// Names the output of an expression.
    Alias { expr: Box<Expr>, name: String },
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, expr: Expr) -> Expr {
    Expr::UnaryOp {
        op,
        expr: Box::new(expr),
    }
}

impl Expr {
    /// Creates a column reference expression.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// Creates a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates an untyped NULL literal.
    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// Creates an equality expression.
    pub fn eq(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Eq, right)
    }

    /// Creates a not-equal expression.
    pub fn ne(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Ne, right)
    }

    /// Creates a less-than expression.
    pub fn lt(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    pub fn le(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Le, right)
    }

    /// Creates a greater-than expression.
    pub fn gt(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    pub fn ge(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Ge, right)
    }

    /// Creates an AND expression.
    pub fn and(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::And, right)
    }

    /// Creates an OR expression.
    pub fn or(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Or, right)
    }

    /// Creates an addition.
    pub fn add(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Add, right)
    }

    /// Creates a subtraction.
    pub fn sub(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Sub, right)
    }

    /// Creates a multiplication.
    pub fn mul(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Mul, right)
    }

    /// Creates a division.
    pub fn div(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Div, right)
    }

    /// Creates a modulo.
    pub fn modulo(left: Expr, right: Expr) -> Self {
        binary(left, BinaryOp::Mod, right)
    }

    /// Creates a LIKE expression.
    pub fn like(expr: Expr, pattern: Expr) -> Self {
        binary(expr, BinaryOp::Like, pattern)
    }

    /// Creates a NOT expression.
    pub fn not(expr: Expr) -> Self {
        unary(UnaryOp::Not, expr)
    }

    /// Creates a negation.
    pub fn neg(expr: Expr) -> Self {
        unary(UnaryOp::Neg, expr)
    }

    /// Creates an IS NULL expression.
    pub fn is_null(expr: Expr) -> Self {
        unary(UnaryOp::IsNull, expr)
    }

    /// Creates an IS NOT NULL expression.
    pub fn is_not_null(expr: Expr) -> Self {
        unary(UnaryOp::IsNotNull, expr)
    }

    /// Creates a scalar function call.
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    /// Creates a COALESCE call.
    pub fn coalesce(args: Vec<Expr>) -> Self {
        Self::function("coalesce", args)
    }

    /// Creates a searched CASE expression.
    pub fn case(when_then: Vec<(Expr, Expr)>, otherwise: Option<Expr>) -> Self {
        Expr::Case {
            when_then,
            otherwise: otherwise.map(Box::new),
        }
    }

    /// Creates a CAST expression.
    pub fn cast(expr: Expr, data_type: DataType) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            data_type,
        }
    }

    /// Creates an IN expression.
    pub fn in_list(expr: Expr, list: Vec<Expr>) -> Self {
        Expr::In {
            expr: Box::new(expr),
            list,
            negated: false,
        }
    }

    /// Creates a NOT IN expression.
    pub fn not_in_list(expr: Expr, list: Vec<Expr>) -> Self {
        Expr::In {
            expr: Box::new(expr),
            list,
            negated: true,
        }
    }

    /// Creates a BETWEEN expression.
    pub fn between(expr: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    /// Creates a NOT BETWEEN expression.
    pub fn not_between(expr: Expr, low: Expr, high: Expr) -> Self {
        Expr::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: true,
        }
    }

    /// Names this expression's output.
    pub fn alias(self, name: impl Into<String>) -> Self {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// The output column name: the alias, the column name, or the display
    /// form of the expression.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Alias { name, .. } => name.clone(),
            Expr::Column(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match expr {
        Expr::BinaryOp { .. } | Expr::Between { .. } | Expr::In { .. } => write!(f, "({})", expr),
        _ => write!(f, "{}", expr),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::BinaryOp { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOp::Not => {
                    f.write_str("NOT ")?;
                    write_operand(f, expr)
                }
                UnaryOp::Neg => {
                    f.write_str("-")?;
                    write_operand(f, expr)
                }
                UnaryOp::IsNull => {
                    write_operand(f, expr)?;
                    f.write_str(" IS NULL")
                }
                UnaryOp::IsNotNull => {
                    write_operand(f, expr)?;
                    f.write_str(" IS NOT NULL")
                }
            },
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Case {
                when_then,
                otherwise,
            } => {
                f.write_str("CASE")?;
                for (cond, then) in when_then {
                    write!(f, " WHEN {} THEN {}", cond, then)?;
                }
                if let Some(e) = otherwise {
                    write!(f, " ELSE {}", e)?;
                }
                f.write_str(" END")
            }
            Expr::Cast { expr, data_type } => write!(f, "CAST({} AS {})", expr, data_type),
            Expr::In {
                expr,
                list,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT IN (" } else { " IN (" })?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " })?;
                write_operand(f, low)?;
                f.write_str(" AND ")?;
                write_operand(f, high)
            }
            Expr::Alias { expr, name } => write!(f, "{} AS {}", expr, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_expr_builders() {
        let col = Expr::col("c");
        assert!(matches!(col, Expr::Column(ref n) if n == "c"));

        let lit = Expr::literal(42i64);
        assert!(matches!(lit, Expr::Literal(Value::Int64(42))));

        let eq = Expr::eq(Expr::col("a"), Expr::col("b"));
        assert!(matches!(eq, Expr::BinaryOp { op: BinaryOp::Eq, .. }));
    }

    #[test]
    fn test_display() {
        let e = Expr::mul(Expr::add(Expr::col("a"), Expr::literal(1i32)), Expr::col("b"));
        assert_eq!(e.to_string(), "(a + 1) * b");

        let e = Expr::not_in_list(Expr::col("x"), vec![Expr::literal("p"), Expr::null()]);
        assert_eq!(e.to_string(), "x NOT IN ('p', NULL)");

        let e = Expr::case(
            vec![(Expr::is_null(Expr::col("x")), Expr::literal(0i32))],
            Some(Expr::col("x")),
        );
        assert_eq!(e.to_string(), "CASE WHEN x IS NULL THEN 0 ELSE x END");

        let e = Expr::cast(Expr::col("d"), DataType::Int64);
        assert_eq!(e.to_string(), "CAST(d AS int64)");
    }

    #[test]
    fn test_output_name() {
        assert_eq!(Expr::col("id").output_name(), "id");
        assert_eq!(Expr::col("id").alias("key").output_name(), "key");
        assert_eq!(
            Expr::function("upper", vec![Expr::col("name")]).output_name(),
            "upper(name)"
        );
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(!BinaryOp::And.is_comparison());
        assert!(BinaryOp::Mod.is_arithmetic());
        assert_eq!(BinaryOp::Ne.symbol(), "<>");
    }
}
