//! Sort kernel.

use alloc::vec::Vec;
use quill_core::{Result, Row};
use quill_query::eval::{compare_keys, sort_key_values};
use quill_query::planner::SortOp;

/// Stable sort by the operator's keys.
pub struct SortExecutor<'a> {
    op: &'a SortOp,
}

impl<'a> SortExecutor<'a> {
    pub fn new(op: &'a SortOp) -> Self {
        Self { op }
    }

    /// Key values are computed once per row before sorting.
    pub fn execute(&self, input: Vec<Row>) -> Result<Vec<Row>> {
        let keys = &self.op.keys;
        let mut keyed = input
            .into_iter()
            .map(|row| Ok((sort_key_values(keys, &row)?, row)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|a, b| compare_keys(keys, &a.0, &b.0));
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}
