//! Hash join kernel.

use alloc::vec::Vec;
use hashbrown::HashMap;
use quill_core::{Result, Row, Value};
use quill_query::ast::JoinType;
use quill_query::planner::JoinOp;

/// Hash join: builds a table over the right input, probes it with the left.
///
/// Output order follows the left input; for right and full joins the
/// unmatched right rows follow in right-input order. Null keys never match.
pub struct HashJoin<'a> {
    op: &'a JoinOp,
}

impl<'a> HashJoin<'a> {
    pub fn new(op: &'a JoinOp) -> Self {
        Self { op }
    }

    pub fn execute(&self, left: Vec<Row>, right: Vec<Row>) -> Result<Vec<Row>> {
        let op = self.op;

        // Build phase
        let mut table: HashMap<Vec<Value>, Vec<usize>> = HashMap::with_capacity(right.len());
        for (idx, row) in right.iter().enumerate() {
            if let Some(key) = op.right_key(row)? {
                table.entry(key).or_default().push(idx);
            }
        }

        // Probe phase
        let mut right_matched = alloc::vec![false; right.len()];
        let mut out = Vec::with_capacity(left.len());
        for row in left {
            let matches = match op.left_key(&row)? {
                Some(key) => table.get(&key),
                None => None,
            };
            match op.kind {
                JoinType::Semi => {
                    if matches.is_some() {
                        out.push(row);
                    }
                }
                JoinType::Anti => {
                    if matches.is_none() {
                        out.push(row);
                    }
                }
                _ => match matches {
                    Some(indices) => {
                        for &idx in indices {
                            right_matched[idx] = true;
                            out.push(op.output_row(Some(&row), Some(&right[idx]))?);
                        }
                    }
                    None if op.kind.preserves_left() => out.push(op.output_row(Some(&row), None)?),
                    None => {}
                },
            }
        }

        if op.kind.preserves_right() {
            for (idx, row) in right.iter().enumerate() {
                if !right_matched[idx] {
                    out.push(op.output_row(None, Some(row))?);
                }
            }
        }
        Ok(out)
    }
}
