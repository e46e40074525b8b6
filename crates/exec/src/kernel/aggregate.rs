//! Hash aggregation kernel.
//!
//! Aggregation runs in two steps that backends may split: `partial` folds
//! rows into a [`GroupTable`] of accumulator states, and `finish` turns the
//! states into output rows. Partial tables built over disjoint row sets can
//! be combined with [`GroupTable::merge`] before finishing.

use alloc::vec::Vec;
use hashbrown::HashMap;
use quill_core::{Result, Row, Value};
use quill_query::eval::{evaluate, Accumulator};
use quill_query::planner::{AggregateOp, TypedAggregate};

/// Accumulator states keyed by group, in first-seen group order.
#[derive(Clone, Debug, Default)]
pub struct GroupTable {
    index: HashMap<Vec<Value>, usize>,
    groups: Vec<(Vec<Value>, Vec<Accumulator>)>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn states_mut(
        &mut self,
        key: Vec<Value>,
        aggregates: &[TypedAggregate],
    ) -> Result<&mut Vec<Accumulator>> {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let states = aggregates
                    .iter()
                    .map(TypedAggregate::accumulator)
                    .collect::<Result<Vec<_>>>()?;
                let slot = self.groups.len();
                self.index.insert(key.clone(), slot);
                self.groups.push((key, states));
                slot
            }
        };
        Ok(&mut self.groups[slot].1)
    }

    /// Adds one group's states, merging with an existing group of the same key.
    pub fn merge_group(&mut self, key: Vec<Value>, states: Vec<Accumulator>) -> Result<()> {
        match self.index.get(&key) {
            Some(&slot) => {
                for (acc, other) in self.groups[slot].1.iter_mut().zip(states) {
                    acc.merge(other)?;
                }
            }
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, states));
            }
        }
        Ok(())
    }

    /// Merges every group of `other` into this table.
    pub fn merge(&mut self, other: GroupTable) -> Result<()> {
        for (key, states) in other.groups {
            self.merge_group(key, states)?;
        }
        Ok(())
    }

    /// Consumes the table, yielding groups in first-seen order.
    pub fn into_groups(self) -> impl Iterator<Item = (Vec<Value>, Vec<Accumulator>)> {
        self.groups.into_iter()
    }
}

/// Groups rows by the operator's keys and evaluates its aggregates.
pub struct AggregateExecutor<'a> {
    op: &'a AggregateOp,
}

impl<'a> AggregateExecutor<'a> {
    pub fn new(op: &'a AggregateOp) -> Self {
        Self { op }
    }

    /// Folds `input` into a table of partial states.
    pub fn partial(&self, input: &[Row]) -> Result<GroupTable> {
        let mut table = GroupTable::new();
        for row in input {
            let key = self
                .op
                .group_by
                .iter()
                .map(|e| evaluate(e, row))
                .collect::<Result<Vec<_>>>()?;
            let states = table.states_mut(key, &self.op.aggregates)?;
            for (acc, call) in states.iter_mut().zip(&self.op.aggregates) {
                match &call.arg {
                    Some(arg) => acc.update(&evaluate(arg, row)?)?,
                    None => acc.update(&Value::Null)?,
                }
            }
        }
        Ok(table)
    }

    /// Produces output rows: group keys followed by aggregate results.
    ///
    /// A global aggregate (no group keys) yields exactly one row even when
    /// the table is empty.
    pub fn finish(&self, mut table: GroupTable) -> Result<Vec<Row>> {
        if table.is_empty() && self.op.group_by.is_empty() {
            table.states_mut(Vec::new(), &self.op.aggregates)?;
        }
        let mut out = Vec::with_capacity(table.len());
        for (key, states) in table.into_groups() {
            let mut values = key;
            values.reserve(states.len());
            for acc in states {
                values.push(acc.finish()?);
            }
            out.push(Row::new(values));
        }
        Ok(out)
    }

    pub fn execute(&self, input: Vec<Row>) -> Result<Vec<Row>> {
        let table = self.partial(&input)?;
        self.finish(table)
    }
}
