//! Eager in-memory backend.
//!
//! Every handle holds its materialized rows. Operators run to completion
//! when dispatched, so errors surface at the failing node and results keep
//! the orders the operators define (scan order, left-driven join order,
//! first-seen groups, stable sort).

use crate::kernel::{
    AggregateExecutor, FilterExecutor, HashJoin, LimitExecutor, ProjectExecutor, SortExecutor,
    UnionExecutor, WindowExecutor,
};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use log::{debug, trace};
use quill_core::schema::Schema;
use quill_core::{Error, Result, Row};
use quill_query::planner::{
    AggregateOp, FilterOp, JoinOp, LimitOp, NodeRef, ProjectOp, ScanOp, SortOp, UnionOp, ValuesOp,
    WindowOp,
};
use quill_query::{Backend, ExecutionResult};

const NAME: &str = "memory";

/// A materialized relation.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryRelation {
    schema: Schema,
    rows: Vec<Row>,
}

impl MemoryRelation {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Registered tables held as row vectors.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<String, MemoryRelation>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a table. Every row must match `schema`.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Result<()> {
        let name = name.into();
        for row in &rows {
            schema.check_row(row)?;
        }
        debug!("registered table {} with {} rows", name, rows.len());
        self.tables.insert(name, MemoryRelation::new(schema, rows));
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&MemoryRelation> {
        self.tables.get(name)
    }
}

impl Backend for MemoryBackend {
    type Handle = MemoryRelation;

    fn name(&self) -> &str {
        NAME
    }

    fn scan(&self, op: &ScanOp, _: NodeRef) -> Result<MemoryRelation> {
        let table = self
            .tables
            .get(&op.table)
            .ok_or_else(|| Error::backend(NAME, format!("table '{}' is not registered", op.table)))?;
        trace!("scan {}: {} rows", op.table, table.len());
        Ok(table.clone())
    }

    fn values(&self, op: &ValuesOp, _: NodeRef) -> Result<MemoryRelation> {
        Ok(MemoryRelation::new(op.schema.clone(), op.rows.clone()))
    }

    fn project(&self, input: MemoryRelation, op: &ProjectOp, _: NodeRef) -> Result<MemoryRelation> {
        let rows = ProjectExecutor::new(op).execute(input.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn filter(&self, input: MemoryRelation, op: &FilterOp, _: NodeRef) -> Result<MemoryRelation> {
        let rows = FilterExecutor::new(op).execute(input.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn join(
        &self,
        left: MemoryRelation,
        right: MemoryRelation,
        op: &JoinOp,
        _: NodeRef,
    ) -> Result<MemoryRelation> {
        let rows = HashJoin::new(op).execute(left.rows, right.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn aggregate(
        &self,
        input: MemoryRelation,
        op: &AggregateOp,
        _: NodeRef,
    ) -> Result<MemoryRelation> {
        let rows = AggregateExecutor::new(op).execute(input.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn sort(&self, input: MemoryRelation, op: &SortOp, _: NodeRef) -> Result<MemoryRelation> {
        let rows = SortExecutor::new(op).execute(input.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn window(&self, input: MemoryRelation, op: &WindowOp, _: NodeRef) -> Result<MemoryRelation> {
        let rows = WindowExecutor::new(op, NAME).execute(input.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn union(
        &self,
        left: MemoryRelation,
        right: MemoryRelation,
        op: &UnionOp,
        _: NodeRef,
    ) -> Result<MemoryRelation> {
        let rows = UnionExecutor::new(op).execute(left.rows, right.rows)?;
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn limit(&self, input: MemoryRelation, op: &LimitOp, _: NodeRef) -> Result<MemoryRelation> {
        let rows = LimitExecutor::new(op).execute(input.rows);
        Ok(MemoryRelation::new(op.schema.clone(), rows))
    }

    fn schema(&self, handle: &MemoryRelation) -> Schema {
        handle.schema.clone()
    }

    fn collect(&self, handle: MemoryRelation) -> ExecutionResult<Vec<Row>> {
        Ok(handle.rows)
    }
}
