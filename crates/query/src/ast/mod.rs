//! AST module for query expressions, calls and sort keys.

mod calls;
mod expr;
mod join;
mod sort;
mod typed;

pub use calls::{
    AggregateCall, AggregateFunc, FrameBound, FrameUnits, WindowCall, WindowFrame, WindowFunc,
};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use join::JoinType;
pub use sort::{NullOrder, SortKey, SortOrder};
pub use typed::{ScalarFunc, TypedExpr, TypedExprKind, TypedSortKey};
