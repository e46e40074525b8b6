//! Lazy hash-partitioned backend.
//!
//! Handles describe deferred work over a fixed number of partitions and run
//! only on `collect`, so execution errors surface there, tagged with the
//! node whose work failed. Scans split tables
//! into contiguous chunks; joins, grouped aggregation, windows and distinct
//! unions shuffle rows by key hash so that equal keys meet in one partition.
//! Sort and limit gather everything into a single partition.
//!
//! Row order across partitions is unspecified except after a sort.

use crate::kernel::{
    dedup, AggregateExecutor, FilterExecutor, GroupTable, HashJoin, LimitExecutor,
    ProjectExecutor, SortExecutor, UnionExecutor, WindowExecutor,
};
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;
use log::{debug, trace};
use quill_core::schema::Schema;
use quill_core::{Error, Result, Row};
use quill_query::ast::TypedExpr;
use quill_query::eval::evaluate;
use quill_query::planner::{
    AggregateOp, FilterOp, JoinOp, LimitOp, NodeRef, ProjectOp, ScanOp, SortOp, UnionOp, ValuesOp,
    WindowOp,
};
use quill_query::{Backend, ExecutionError, ExecutionResult};

const NAME: &str = "partitioned";

type Partitions = Vec<Vec<Row>>;
type Deferred = Box<dyn FnOnce() -> ExecutionResult<Partitions>>;

/// Partitioned backend configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartitionedConfig {
    /// Number of partitions every shuffle produces.
    pub partitions: usize,
}

impl Default for PartitionedConfig {
    fn default() -> Self {
        Self { partitions: 4 }
    }
}

impl PartitionedConfig {
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }
}

/// A deferred partitioned relation.
pub struct PartitionedRelation {
    schema: Schema,
    deferred: Deferred,
}

impl PartitionedRelation {
    /// A relation with no inputs; its work cannot fail.
    fn source(schema: Schema, rows: impl FnOnce() -> Partitions + 'static) -> Self {
        Self {
            schema,
            deferred: Box::new(move || Ok(rows())),
        }
    }

    /// A relation computed from one input. Input failures pass through;
    /// failures of `work` are attributed to `node`.
    fn unary(
        schema: Schema,
        node: NodeRef,
        input: PartitionedRelation,
        work: impl FnOnce(Partitions) -> Result<Partitions> + 'static,
    ) -> Self {
        Self {
            schema,
            deferred: Box::new(move || {
                let parts = input.materialize()?;
                work(parts).map_err(|e| ExecutionError::at(node, e))
            }),
        }
    }

    /// A relation computed from two inputs; the left runs first.
    fn binary(
        schema: Schema,
        node: NodeRef,
        left: PartitionedRelation,
        right: PartitionedRelation,
        work: impl FnOnce(Partitions, Partitions) -> Result<Partitions> + 'static,
    ) -> Self {
        Self {
            schema,
            deferred: Box::new(move || {
                let l = left.materialize()?;
                let r = right.materialize()?;
                work(l, r).map_err(|e| ExecutionError::at(node, e))
            }),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Runs the deferred work, returning rows per partition.
    pub fn materialize(self) -> ExecutionResult<Partitions> {
        (self.deferred)()
    }
}

impl fmt::Debug for PartitionedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedRelation")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registered tables shared with deferred scans.
pub struct PartitionedBackend {
    tables: HashMap<String, (Schema, Rc<Vec<Row>>)>,
    config: PartitionedConfig,
    hasher: DefaultHashBuilder,
}

impl PartitionedBackend {
    /// Creates a backend with the default configuration.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            config: PartitionedConfig::default(),
            hasher: DefaultHashBuilder::default(),
        }
    }

    /// Creates a backend; at least one partition is required.
    pub fn with_config(config: PartitionedConfig) -> Result<Self> {
        if config.partitions == 0 {
            return Err(Error::config("partitioned backend needs at least one partition"));
        }
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &PartitionedConfig {
        &self.config
    }

    /// Registers (or replaces) a table. Every row must match `schema`.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Result<()> {
        let name = name.into();
        for row in &rows {
            schema.check_row(row)?;
        }
        debug!("registered table {} with {} rows", name, rows.len());
        self.tables.insert(name, (schema, Rc::new(rows)));
        Ok(())
    }
}

impl Default for PartitionedBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits rows into `n` contiguous chunks; trailing chunks may be empty.
fn split(rows: &[Row], n: usize) -> Partitions {
    let size = rows.len().div_ceil(n).max(1);
    let mut parts: Partitions = rows.chunks(size).map(|c| c.to_vec()).collect();
    parts.resize_with(n, Vec::new);
    parts
}

fn gather(parts: Partitions) -> Vec<Row> {
    parts.into_iter().flatten().collect()
}

fn bucket<K: Hash + ?Sized>(hasher: &DefaultHashBuilder, key: &K, n: usize) -> usize {
    (hasher.hash_one(key) % n as u64) as usize
}

/// Redistributes rows into `n` partitions, preserving relative order within
/// each target partition.
fn shuffle(
    parts: Partitions,
    n: usize,
    mut route: impl FnMut(&Row) -> Result<usize>,
) -> Result<Partitions> {
    let mut out: Partitions = vec![Vec::new(); n];
    let mut moved = 0usize;
    for row in parts.into_iter().flatten() {
        let target = route(&row)?;
        out[target].push(row);
        moved += 1;
    }
    trace!("shuffled {} rows into {} partitions", moved, n);
    Ok(out)
}

/// Partition keys shared by every call, if any. Windows with no shared keys
/// run in a single partition.
fn shared_partition_keys(op: &WindowOp) -> Option<Vec<TypedExpr>> {
    let first = op.calls.first()?;
    if first.partition_by.is_empty()
        || op.calls.iter().any(|c| c.partition_by != first.partition_by)
    {
        return None;
    }
    Some(first.partition_by.clone())
}

impl Backend for PartitionedBackend {
    type Handle = PartitionedRelation;

    fn name(&self) -> &str {
        NAME
    }

    fn scan(&self, op: &ScanOp, _: NodeRef) -> Result<PartitionedRelation> {
        let (schema, rows) = self
            .tables
            .get(&op.table)
            .ok_or_else(|| Error::backend(NAME, format!("table '{}' is not registered", op.table)))?;
        let rows = Rc::clone(rows);
        let n = self.config.partitions;
        Ok(PartitionedRelation::source(schema.clone(), move || split(&rows, n)))
    }

    fn values(&self, op: &ValuesOp, _: NodeRef) -> Result<PartitionedRelation> {
        let rows = op.rows.clone();
        let n = self.config.partitions;
        Ok(PartitionedRelation::source(op.schema.clone(), move || split(&rows, n)))
    }

    fn project(
        &self,
        input: PartitionedRelation,
        op: &ProjectOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            let exec = ProjectExecutor::new(&op);
            parts.into_iter().map(|part| exec.execute(part)).collect()
        }))
    }

    fn filter(
        &self,
        input: PartitionedRelation,
        op: &FilterOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            let exec = FilterExecutor::new(&op);
            parts.into_iter().map(|part| exec.execute(part)).collect()
        }))
    }

    fn join(
        &self,
        left: PartitionedRelation,
        right: PartitionedRelation,
        op: &JoinOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        let hasher = self.hasher.clone();
        let n = self.config.partitions;
        Ok(PartitionedRelation::binary(schema, node, left, right, move |l, r| {
            // Null keys never match; they land in partition 0 so outer joins
            // still emit them once.
            let l = shuffle(l, n, |row| {
                Ok(op.left_key(row)?.map_or(0, |k| bucket(&hasher, &k, n)))
            })?;
            let r = shuffle(r, n, |row| {
                Ok(op.right_key(row)?.map_or(0, |k| bucket(&hasher, &k, n)))
            })?;
            let join = HashJoin::new(&op);
            l.into_iter().zip(r).map(|(l, r)| join.execute(l, r)).collect()
        }))
    }

    fn aggregate(
        &self,
        input: PartitionedRelation,
        op: &AggregateOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        let hasher = self.hasher.clone();
        let n = self.config.partitions;
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            let exec = AggregateExecutor::new(&op);
            let mut tables: Vec<GroupTable> = (0..n).map(|_| GroupTable::new()).collect();
            for part in parts {
                for (key, states) in exec.partial(&part)?.into_groups() {
                    let target = bucket(&hasher, &key, n);
                    tables[target].merge_group(key, states)?;
                }
            }
            trace!("merged partial aggregates into {} partitions", n);
            if op.group_by.is_empty() {
                // Every partial shares the empty key; finish once.
                let table = tables
                    .into_iter()
                    .find(|t| !t.is_empty())
                    .unwrap_or_default();
                return Ok(vec![exec.finish(table)?]);
            }
            tables.into_iter().map(|t| exec.finish(t)).collect()
        }))
    }

    fn sort(
        &self,
        input: PartitionedRelation,
        op: &SortOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            Ok(vec![SortExecutor::new(&op).execute(gather(parts))?])
        }))
    }

    fn window(
        &self,
        input: PartitionedRelation,
        op: &WindowOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        // Both layouts below keep each window partition whole, so the
        // kernel's frame support applies unchanged.
        WindowExecutor::new(op, NAME).check_frames()?;
        let op = op.clone();
        let schema = op.schema.clone();
        let keys = shared_partition_keys(&op);
        let hasher = self.hasher.clone();
        let n = self.config.partitions;
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            let parts = match &keys {
                Some(keys) => shuffle(parts, n, |row| {
                    let key = keys
                        .iter()
                        .map(|e| evaluate(e, row))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(bucket(&hasher, &key, n))
                })?,
                None => vec![gather(parts)],
            };
            let exec = WindowExecutor::new(&op, NAME);
            parts.into_iter().map(|part| exec.execute(part)).collect()
        }))
    }

    fn union(
        &self,
        left: PartitionedRelation,
        right: PartitionedRelation,
        op: &UnionOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        let hasher = self.hasher.clone();
        let n = self.config.partitions;
        Ok(PartitionedRelation::binary(schema, node, left, right, move |mut parts, right| {
            let exec = UnionExecutor::new(&op);
            parts.extend(right);
            let parts = parts
                .into_iter()
                .map(|part| exec.conform(part))
                .collect::<Result<Partitions>>()?;
            if !op.distinct {
                return Ok(parts);
            }
            let parts = shuffle(parts, n, |row| Ok(bucket(&hasher, row, n)))?;
            Ok(parts.into_iter().map(dedup).collect())
        }))
    }

    fn limit(
        &self,
        input: PartitionedRelation,
        op: &LimitOp,
        node: NodeRef,
    ) -> Result<PartitionedRelation> {
        let op = op.clone();
        let schema = op.schema.clone();
        Ok(PartitionedRelation::unary(schema, node, input, move |parts| {
            Ok(vec![LimitExecutor::new(&op).execute(gather(parts))])
        }))
    }

    fn schema(&self, handle: &PartitionedRelation) -> Schema {
        handle.schema.clone()
    }

    fn collect(&self, handle: PartitionedRelation) -> ExecutionResult<Vec<Row>> {
        let parts = handle.materialize()?;
        trace!("materialized {} partitions", parts.len());
        Ok(gather(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::schema::SchemaBuilder;
    use quill_core::{row, DataType, ErrorKind};
    use quill_query::ast::{AggregateCall, Expr, FrameBound, SortKey, WindowCall, WindowFrame};
    use crate::MemoryBackend;
    use quill_query::{Driver, LogicalPlan, PlanBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .add_required("k", DataType::Int64)
            .unwrap()
            .add_column("v", DataType::Int64)
            .unwrap()
            .build()
    }

    fn backend(partitions: usize) -> PartitionedBackend {
        let config = PartitionedConfig::default().with_partitions(partitions);
        let mut backend = PartitionedBackend::with_config(config).unwrap();
        let rows = (0..10i64).map(|i| row![i % 3, i]).collect();
        backend.register("t", schema(), rows).unwrap();
        backend
    }

    fn memory() -> MemoryBackend {
        let mut backend = MemoryBackend::new();
        let rows = (0..10i64).map(|i| row![i % 3, i]).collect();
        backend.register("t", schema(), rows).unwrap();
        backend
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let config = PartitionedConfig::default().with_partitions(0);
        let err = PartitionedBackend::with_config(config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_split_covers_all_rows() {
        let rows: Vec<Row> = (0..5i64).map(|i| row![i]).collect();
        let parts = split(&rows, 3);
        assert_eq!(parts.len(), 3);
        assert_eq!(gather(parts), rows);
        assert_eq!(split(&[], 2), vec![Vec::<Row>::new(), Vec::new()]);
    }

    #[test]
    fn test_errors_surface_at_collect() {
        let backend = backend(3);
        let plan = PlanBuilder::scan("t", schema())
            .project(vec![Expr::div(Expr::col("v"), Expr::literal(0i64))])
            .limit(10)
            .build();
        let driver = Driver::new(&backend);
        assert!(driver.execute(&plan).is_ok());
        let err = driver.collect(&plan).unwrap_err();
        assert_eq!(err.node, Some(NodeRef { id: 1, operator: "Project" }));
        assert_eq!(err.error.kind(), ErrorKind::Arithmetic);

        let eager = Driver::new(&memory()).collect(&plan).unwrap_err();
        assert_eq!(eager.node, err.node);
    }

    #[test]
    fn test_join_input_error_keeps_its_node() {
        let backend = backend(2);
        let failing = PlanBuilder::scan("t", schema())
            .filter(Expr::gt(
                Expr::div(Expr::col("v"), Expr::literal(0i64)),
                Expr::literal(1i64),
            ))
            .build();
        let scan = PlanBuilder::scan("t", schema()).build();
        let plan = LogicalPlan::inner_join(scan, failing, "k", "k");
        let err = Driver::new(&backend).collect(&plan).unwrap_err();
        assert_eq!(err.node, Some(NodeRef { id: 2, operator: "Filter" }));
    }

    #[test]
    fn test_grouped_and_global_aggregates() {
        let backend = backend(4);
        let plan = PlanBuilder::scan("t", schema())
            .aggregate(vec![Expr::col("k")], vec![AggregateCall::sum(Expr::col("v"))])
            .sort(vec![SortKey::asc(Expr::col("k"))])
            .build();
        let rows = Driver::new(&backend).collect(&plan).unwrap();
        assert_eq!(rows, vec![row![0i64, 18i64], row![1i64, 12i64], row![2i64, 15i64]]);

        let plan = PlanBuilder::scan("t", schema())
            .filter(Expr::lt(Expr::col("v"), Expr::literal(0i64)))
            .aggregate(vec![], vec![AggregateCall::count_star()])
            .build();
        let rows = Driver::new(&backend).collect(&plan).unwrap();
        assert_eq!(rows, vec![row![0i64]]);
    }

    #[test]
    fn test_range_offset_frames_unsupported() {
        let backend = backend(2);
        let plan = PlanBuilder::scan("t", schema())
            .window(vec![WindowCall::aggregate(AggregateCall::sum(Expr::col("v")))
                .order_by(vec![SortKey::asc(Expr::col("v"))])
                .frame(WindowFrame::range(FrameBound::Preceding(1), FrameBound::CurrentRow))])
            .build();
        let err = Driver::new(&backend).execute(&plan).unwrap_err();
        assert_eq!(
            err.error,
            Error::unsupported(NAME, "RANGE BETWEEN 1 PRECEDING AND CURRENT ROW frame")
        );
        assert_eq!(err.node.map(|n| n.operator), Some("Window"));
    }

    #[test]
    fn test_range_peer_frames_match_memory() {
        let frame = WindowFrame::range(FrameBound::UnboundedPreceding, FrameBound::CurrentRow);
        let running = |partition: Vec<Expr>| {
            PlanBuilder::scan("t", schema())
                .window(vec![WindowCall::aggregate(AggregateCall::sum(Expr::col("v")))
                    .partition_by(partition)
                    .order_by(vec![SortKey::asc(Expr::col("k"))])
                    .frame(frame)])
                .sort(vec![SortKey::asc(Expr::col("v"))])
                .build()
        };
        let memory = memory();

        for plan in [running(vec![]), running(vec![Expr::col("k")])] {
            let expected = Driver::new(&memory).collect(&plan).unwrap();
            for partitions in [1, 3] {
                let rows = Driver::new(&backend(partitions)).collect(&plan).unwrap();
                assert_eq!(rows, expected);
            }
        }

        // Peers share the frame end: every k = 0 row sees 0 + 3 + 6 + 9.
        let rows = Driver::new(&memory).collect(&running(vec![])).unwrap();
        assert_eq!(rows[0], row![0i64, 0i64, 18i64]);
    }
}
