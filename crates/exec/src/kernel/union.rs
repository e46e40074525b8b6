//! Union kernel.

use alloc::vec::Vec;
use hashbrown::HashSet;
use quill_core::{Result, Row};
use quill_query::planner::UnionOp;

/// Concatenates left then right, conforming values to the union's types.
pub struct UnionExecutor<'a> {
    op: &'a UnionOp,
}

impl<'a> UnionExecutor<'a> {
    pub fn new(op: &'a UnionOp) -> Self {
        Self { op }
    }

    pub fn conform(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
        rows.into_iter().map(|r| self.op.conform(r)).collect()
    }

    pub fn execute(&self, left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        let mut out = self.conform(left)?;
        out.extend(self.conform(right)?);
        if self.op.distinct {
            out = dedup(out);
        }
        Ok(out)
    }
}

/// Removes duplicate rows, keeping first occurrences. Nulls compare equal.
pub fn dedup(rows: Vec<Row>) -> Vec<Row> {
    let mut seen: HashSet<Row> = HashSet::with_capacity(rows.len());
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.contains(&row) {
            seen.insert(row.clone());
            out.push(row);
        }
    }
    out
}
