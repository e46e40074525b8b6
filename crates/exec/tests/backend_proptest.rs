//! Property-based tests: both reference backends agree on every operator.
//!
//! The partitioned backend may order rows differently, so results are
//! compared as multisets.

use proptest::prelude::*;
use quill_core::schema::{Schema, SchemaBuilder};
use quill_core::{DataType, Row, Value};
use quill_exec::{MemoryBackend, PartitionedBackend, PartitionedConfig};
use quill_query::ast::{AggregateCall, Expr, JoinType, SortKey, WindowCall};
use quill_query::{Backend, Driver, LogicalPlan, PlanBuilder};

fn schema() -> Schema {
    SchemaBuilder::new()
        .add_column("k", DataType::Int64)
        .unwrap()
        .add_column("v", DataType::Int64)
        .unwrap()
        .build()
}

/// Rows with a small, nullable key domain so joins and groups collide.
fn rows_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((prop::option::of(0i64..5), -50i64..50), 0..max_rows).prop_map(
        |values| {
            values
                .into_iter()
                .map(|(k, v)| Row::new(vec![Value::from(k), Value::Int64(v)]))
                .collect()
        },
    )
}

fn run<B: Backend>(backend: &B, plan: &LogicalPlan) -> Vec<Row> {
    let mut rows = Driver::new(backend).collect(plan).unwrap();
    rows.sort_by(|a, b| a.values().cmp(b.values()));
    rows
}

fn both(left: Vec<Row>, right: Vec<Row>, partitions: usize) -> (MemoryBackend, PartitionedBackend) {
    let mut memory = MemoryBackend::new();
    memory.register("l", schema(), left.clone()).unwrap();
    memory.register("r", schema(), right.clone()).unwrap();

    let config = PartitionedConfig::default().with_partitions(partitions);
    let mut partitioned = PartitionedBackend::with_config(config).unwrap();
    partitioned.register("l", schema(), left).unwrap();
    partitioned.register("r", schema(), right).unwrap();
    (memory, partitioned)
}

fn scan(table: &str) -> PlanBuilder {
    PlanBuilder::scan(table, schema())
}

proptest! {
    /// Property: every join type yields the same multiset on both backends.
    #[test]
    fn joins_agree(
        left in rows_strategy(30),
        right in rows_strategy(30),
        partitions in 1usize..6,
    ) {
        let (memory, partitioned) = both(left, right, partitions);
        for kind in [
            JoinType::Inner,
            JoinType::Left,
            JoinType::Right,
            JoinType::Full,
            JoinType::Semi,
            JoinType::Anti,
        ] {
            let plan = scan("l").join(scan("r"), kind, &[("k", "k")]).qualifiers("l", "r").build();
            prop_assert_eq!(run(&memory, &plan), run(&partitioned, &plan));
        }
    }

    /// Property: grouped and global aggregates agree.
    #[test]
    fn aggregates_agree(rows in rows_strategy(40), partitions in 1usize..6) {
        let (memory, partitioned) = both(rows, Vec::new(), partitions);
        let calls = vec![
            AggregateCall::count_star(),
            AggregateCall::count(Expr::col("k")),
            AggregateCall::sum(Expr::col("v")),
            AggregateCall::avg(Expr::col("v")),
            AggregateCall::min(Expr::col("v")),
            AggregateCall::max(Expr::col("v")),
            AggregateCall::count_distinct(Expr::col("v")),
        ];
        let grouped = scan("l").aggregate(vec![Expr::col("k")], calls.clone()).build();
        prop_assert_eq!(run(&memory, &grouped), run(&partitioned, &grouped));

        let global = scan("l").aggregate(vec![], calls).build();
        let rows = run(&memory, &global);
        prop_assert_eq!(rows.len(), 1);
        prop_assert_eq!(rows, run(&partitioned, &global));
    }

    /// Property: distinct union agrees and contains no duplicates.
    #[test]
    fn distinct_union_agrees(
        left in rows_strategy(30),
        right in rows_strategy(30),
        partitions in 1usize..6,
    ) {
        let (memory, partitioned) = both(left, right, partitions);
        let plan = scan("l").union(scan("r")).build();
        let rows = run(&memory, &plan);
        let mut deduped = rows.clone();
        deduped.dedup();
        prop_assert_eq!(&rows, &deduped);
        prop_assert_eq!(rows, run(&partitioned, &plan));
    }

    /// Property: partitioned windows agree with the single-partition result.
    #[test]
    fn windows_agree(rows in rows_strategy(40), partitions in 1usize..6) {
        let (memory, partitioned) = both(rows, Vec::new(), partitions);
        let by_k = || vec![Expr::col("k")];
        let by_v = || vec![SortKey::asc(Expr::col("v"))];
        let plan = scan("l")
            .window(vec![
                WindowCall::row_number().partition_by(by_k()).order_by(by_v()),
                WindowCall::rank().partition_by(by_k()).order_by(by_v()),
                WindowCall::lag(Expr::col("v"), 1).partition_by(by_k()).order_by(by_v()),
                WindowCall::aggregate(AggregateCall::sum(Expr::col("v")))
                    .partition_by(by_k())
                    .order_by(by_v()),
            ])
            .build();
        prop_assert_eq!(run(&memory, &plan), run(&partitioned, &plan));
    }

    /// Property: sort then limit is deterministic across backends.
    #[test]
    fn sorted_limit_agrees(rows in rows_strategy(40), n in 0i64..20, partitions in 1usize..6) {
        let (memory, partitioned) = both(rows, Vec::new(), partitions);
        let plan = scan("l")
            .sort(vec![SortKey::asc(Expr::col("k")), SortKey::desc(Expr::col("v"))])
            .limit(n)
            .build();
        let expected = Driver::new(&memory).collect(&plan).unwrap();
        prop_assert_eq!(expected, Driver::new(&partitioned).collect(&plan).unwrap());
    }
}
