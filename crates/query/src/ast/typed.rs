//! Resolved expressions.
//!
//! A `TypedExpr` is an `Expr` bound to an input schema: column references
//! are positions, every node carries its type and nullability, and operands
//! have been coerced to a common type by explicit `Cast` nodes.

use super::expr::{BinaryOp, UnaryOp};
use alloc::boxed::Box;
use alloc::vec::Vec;
use quill_core::{DataType, Value};

/// Scalar functions known to the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarFunc {
    Coalesce,
    NullIf,
    Abs,
    Round,
    Upper,
    Lower,
    Length,
    Concat,
}

impl ScalarFunc {
    /// Looks up a function by case-insensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name.to_ascii_lowercase().as_str() {
            "coalesce" => ScalarFunc::Coalesce,
            "nullif" => ScalarFunc::NullIf,
            "abs" => ScalarFunc::Abs,
            "round" => ScalarFunc::Round,
            "upper" => ScalarFunc::Upper,
            "lower" => ScalarFunc::Lower,
            "length" => ScalarFunc::Length,
            "concat" => ScalarFunc::Concat,
            _ => return None,
        };
        Some(func)
    }

    /// Lowercase SQL name.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunc::Coalesce => "coalesce",
            ScalarFunc::NullIf => "nullif",
            ScalarFunc::Abs => "abs",
            ScalarFunc::Round => "round",
            ScalarFunc::Upper => "upper",
            ScalarFunc::Lower => "lower",
            ScalarFunc::Length => "length",
            ScalarFunc::Concat => "concat",
        }
    }
}

/// Node kinds of a resolved expression.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedExprKind {
    /// Column at a position of the input row.
    Column(usize),
    Literal(Value),
    /// Both operands share one type.
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<TypedExpr>,
    },
    Function {
        func: ScalarFunc,
        args: Vec<TypedExpr>,
    },
    Case {
        when_then: Vec<(TypedExpr, TypedExpr)>,
        otherwise: Option<Box<TypedExpr>>,
    },
    /// Conversion to the node's `data_type`.
    Cast(Box<TypedExpr>),
    /// The probe and list items share one type.
    In {
        expr: Box<TypedExpr>,
        list: Vec<TypedExpr>,
        negated: bool,
    },
    /// The probe and bounds share one type.
    Between {
        expr: Box<TypedExpr>,
        low: Box<TypedExpr>,
        high: Box<TypedExpr>,
        negated: bool,
    },
}

/// A resolved expression with its output type and nullability.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub data_type: DataType,
    pub nullable: bool,
}

impl TypedExpr {
    /// Creates a typed expression.
    pub fn new(kind: TypedExprKind, data_type: DataType, nullable: bool) -> Self {
        Self {
            kind,
            data_type,
            nullable,
        }
    }

    /// A reference to input column `index`.
    pub fn column(index: usize, data_type: DataType, nullable: bool) -> Self {
        Self::new(TypedExprKind::Column(index), data_type, nullable)
    }

    /// A literal; its type is the value's own type.
    pub fn literal(value: Value) -> Self {
        let data_type = value.data_type();
        let nullable = value.is_null();
        Self::new(TypedExprKind::Literal(value), data_type, nullable)
    }

    /// Wraps this expression in a cast to `target` unless it already has
    /// that type.
    pub fn coerce_to(self, target: DataType) -> Self {
        if self.data_type == target {
            return self;
        }
        let nullable = self.nullable;
        Self::new(TypedExprKind::Cast(Box::new(self)), target, nullable)
    }

    /// Returns the input column index if this is a bare column reference.
    pub fn as_column(&self) -> Option<usize> {
        match self.kind {
            TypedExprKind::Column(i) => Some(i),
            _ => None,
        }
    }
}

/// A resolved ORDER BY key.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedSortKey {
    pub expr: TypedExpr,
    pub descending: bool,
    pub nulls_first: bool,
}
