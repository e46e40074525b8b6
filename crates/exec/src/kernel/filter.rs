//! Filter kernel.

use alloc::vec::Vec;
use quill_core::{Result, Row};
use quill_query::eval::evaluate_predicate;
use quill_query::planner::FilterOp;

/// Keeps the rows whose predicate evaluates to true; false and null drop.
pub struct FilterExecutor<'a> {
    op: &'a FilterOp,
}

impl<'a> FilterExecutor<'a> {
    pub fn new(op: &'a FilterOp) -> Self {
        Self { op }
    }

    pub fn execute(&self, input: Vec<Row>) -> Result<Vec<Row>> {
        let mut out = Vec::with_capacity(input.len());
        for row in input {
            if evaluate_predicate(&self.op.predicate, &row)? {
                out.push(row);
            }
        }
        Ok(out)
    }
}
