//! Limit kernel.

use alloc::vec::Vec;
use quill_core::Row;
use quill_query::planner::LimitOp;

/// Keeps the first `n` rows in upstream order.
pub struct LimitExecutor {
    n: usize,
}

impl LimitExecutor {
    pub fn new(op: &LimitOp) -> Self {
        Self { n: op.n }
    }

    pub fn execute(&self, mut input: Vec<Row>) -> Vec<Row> {
        input.truncate(self.n);
        input
    }
}
