//! Projection kernel.

use alloc::vec::Vec;
use quill_core::{Result, Row};
use quill_query::eval::evaluate_row;
use quill_query::planner::ProjectOp;

/// Evaluates the projection list for every row.
pub struct ProjectExecutor<'a> {
    op: &'a ProjectOp,
}

impl<'a> ProjectExecutor<'a> {
    pub fn new(op: &'a ProjectOp) -> Self {
        Self { op }
    }

    pub fn execute(&self, input: Vec<Row>) -> Result<Vec<Row>> {
        input
            .iter()
            .map(|row| evaluate_row(&self.op.exprs, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use quill_core::schema::{Schema, SchemaBuilder};
    use quill_core::{row, DataType, ErrorKind};
    use quill_query::ast::Expr;
    use quill_query::planner::resolve_expr;

    fn op(exprs: &[Expr], input: &Schema) -> ProjectOp {
        ProjectOp {
            exprs: exprs.iter().map(|e| resolve_expr(e, input).unwrap()).collect(),
            schema: Schema::empty(),
        }
    }

    #[test]
    fn test_project_evaluates_expressions() {
        let input = SchemaBuilder::new()
            .add_required("a", DataType::Int32)
            .unwrap()
            .add_required("b", DataType::Int32)
            .unwrap()
            .build();
        let op = op(&[Expr::add(Expr::col("a"), Expr::col("b")), Expr::col("a")], &input);
        let rows = ProjectExecutor::new(&op)
            .execute(vec![row![1i32, 2i32], row![10i32, 20i32]])
            .unwrap();
        assert_eq!(rows, vec![row![3i32, 1i32], row![30i32, 10i32]]);
    }

    #[test]
    fn test_project_surfaces_arithmetic_errors() {
        let input = SchemaBuilder::new()
            .add_required("a", DataType::Int32)
            .unwrap()
            .build();
        let op = op(&[Expr::div(Expr::col("a"), Expr::literal(0i32))], &input);
        let err = ProjectExecutor::new(&op).execute(vec![row![1i32]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arithmetic);
    }
}
