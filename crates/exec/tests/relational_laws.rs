//! End-to-end tests of relational laws, run against both reference backends.

use quill_core::schema::{Schema, SchemaBuilder};
use quill_core::{row, DataType, ErrorKind, Row, Value};
use quill_exec::{MemoryBackend, PartitionedBackend, PartitionedConfig};
use quill_query::ast::{AggregateCall, Expr, JoinType, SortKey};
use quill_query::{Backend, Driver, LogicalPlan, PlanBuilder};

fn orders_schema() -> Schema {
    SchemaBuilder::new()
        .add_required("id", DataType::Int64)
        .unwrap()
        .add_column("amount", DataType::Float64)
        .unwrap()
        .build()
}

fn customers_schema() -> Schema {
    SchemaBuilder::new()
        .add_required("id", DataType::Int64)
        .unwrap()
        .add_column("name", DataType::String)
        .unwrap()
        .build()
}

fn orders() -> Vec<Row> {
    vec![
        row![1i64, 10.0],
        row![2i64, Option::<f64>::None],
        row![1i64, 5.0],
        row![3i64, 7.5],
        row![4i64, 2.5],
    ]
}

fn customers() -> Vec<Row> {
    vec![row![1i64, "Ada"], row![2i64, "Grace"], row![1i64, "Ada B"], row![9i64, "Nobody"]]
}

fn memory() -> MemoryBackend {
    let mut backend = MemoryBackend::new();
    backend.register("orders", orders_schema(), orders()).unwrap();
    backend.register("customers", customers_schema(), customers()).unwrap();
    backend
}

fn partitioned() -> PartitionedBackend {
    let config = PartitionedConfig::default().with_partitions(3);
    let mut backend = PartitionedBackend::with_config(config).unwrap();
    backend.register("orders", orders_schema(), orders()).unwrap();
    backend.register("customers", customers_schema(), customers()).unwrap();
    backend
}

fn collect<B: Backend>(backend: &B, plan: &LogicalPlan) -> Vec<Row> {
    Driver::new(backend).collect(plan).unwrap()
}

fn sorted(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(|a, b| a.values().cmp(b.values()));
    rows
}

/// Runs `check` against every backend.
fn for_each_backend(check: impl Fn(&dyn Fn(&LogicalPlan) -> Vec<Row>)) {
    let memory = memory();
    check(&|plan: &LogicalPlan| collect(&memory, plan));
    let partitioned = partitioned();
    check(&|plan: &LogicalPlan| collect(&partitioned, plan));
}

#[test]
fn test_group_by_sum_scenario() {
    let schema = orders_schema();
    let rows = vec![row![1i64, 10.0], row![2i64, Option::<f64>::None], row![1i64, 5.0]];
    let plan = PlanBuilder::values(schema, rows)
        .aggregate(vec![Expr::col("id")], vec![AggregateCall::sum(Expr::col("amount"))])
        .build();

    let expected = vec![row![1i64, 15.0], row![2i64, Option::<f64>::None]];
    assert_eq!(collect(&memory(), &plan), expected);
    assert_eq!(sorted(collect(&partitioned(), &plan)), sorted(expected));
}

#[test]
fn test_limit_scenarios() {
    let rows = vec![row![1i64, 1.0], row![2i64, 2.0], row![3i64, 3.0]];
    let plan = PlanBuilder::values(orders_schema(), rows.clone()).limit(5).build();
    assert_eq!(collect(&memory(), &plan), rows);

    let plan = PlanBuilder::values(orders_schema(), rows).limit(-1).build();
    let err = Driver::new(&memory()).collect(&plan).unwrap_err();
    assert_eq!(err.error.kind(), ErrorKind::Config);
    assert_eq!(err.node.map(|n| n.operator), Some("Limit"));
}

#[test]
fn test_left_join_unmatched_row_is_null_padded() {
    let plan = PlanBuilder::scan("orders", orders_schema())
        .join(
            PlanBuilder::scan("customers", customers_schema()),
            JoinType::Left,
            &[("id", "id")],
        )
        .build();
    for_each_backend(|run| {
        let rows = run(&plan);
        assert!(rows.len() >= orders().len());
        let unmatched: Vec<&Row> = rows
            .iter()
            .filter(|r| r.get(0) == Some(&Value::Int64(3)))
            .collect();
        assert_eq!(unmatched, vec![&row![3i64, 7.5, Option::<&str>::None]]);
    });
}

#[test]
fn test_inner_join_count_law() {
    let plan = PlanBuilder::scan("orders", orders_schema())
        .join(
            PlanBuilder::scan("customers", customers_schema()),
            JoinType::Inner,
            &[("id", "id")],
        )
        .build();
    // id 1: 2 orders x 2 customers, id 2: 1 x 1
    for_each_backend(|run| assert_eq!(run(&plan).len(), 5));
}

#[test]
fn test_filter_is_idempotent() {
    let predicate = Expr::gt(Expr::col("amount"), Expr::literal(4.0));
    let once = PlanBuilder::scan("orders", orders_schema())
        .filter(predicate.clone())
        .build();
    let twice = PlanBuilder::from_plan(once.clone()).filter(predicate).build();
    for_each_backend(|run| {
        let rows = run(&once);
        assert_eq!(rows.len(), 3);
        assert_eq!(sorted(run(&twice)), sorted(rows));
    });
}

#[test]
fn test_global_aggregate_returns_one_row() {
    let plan = PlanBuilder::scan("orders", orders_schema())
        .filter(Expr::literal(false))
        .aggregate(
            vec![],
            vec![AggregateCall::count_star(), AggregateCall::max(Expr::col("amount"))],
        )
        .build();
    for_each_backend(|run| {
        assert_eq!(run(&plan), vec![row![0i64, Option::<f64>::None]]);
    });
}

#[test]
fn test_sort_twice_equals_sort_once() {
    let keys = vec![SortKey::desc(Expr::col("amount"))];
    let once = PlanBuilder::scan("orders", orders_schema())
        .sort(keys.clone())
        .build();
    let twice = PlanBuilder::from_plan(once.clone()).sort(keys).build();
    for_each_backend(|run| {
        let rows = run(&once);
        // Nulls come first for descending keys by default.
        assert_eq!(rows[0], row![2i64, Option::<f64>::None]);
        assert_eq!(run(&twice), rows);
    });
}

#[test]
fn test_union_with_itself_is_identity() {
    let table = PlanBuilder::scan("orders", orders_schema());
    let plan = table.clone().union(table.clone()).build();
    let all = table.clone().union_all(table).build();
    for_each_backend(|run| {
        assert_eq!(sorted(run(&plan)), sorted(orders()));
        assert_eq!(run(&all).len(), orders().len() * 2);
    });
}

#[test]
fn test_three_valued_logic() {
    let schema = SchemaBuilder::new()
        .add_column("unknown", DataType::Boolean)
        .unwrap()
        .build();
    let unknown = || Expr::col("unknown");
    let plan = PlanBuilder::values(schema, vec![row![Option::<bool>::None]])
        .project(vec![
            Expr::and(unknown(), Expr::literal(true)).alias("and_true"),
            Expr::and(unknown(), Expr::literal(false)).alias("and_false"),
            Expr::or(unknown(), Expr::literal(true)).alias("or_true"),
            Expr::or(unknown(), Expr::literal(false)).alias("or_false"),
        ])
        .build();
    for_each_backend(|run| {
        assert_eq!(
            run(&plan),
            vec![Row::new(vec![
                Value::Null,
                Value::Boolean(false),
                Value::Boolean(true),
                Value::Null,
            ])]
        );
    });
}

#[test]
fn test_schema_errors_precede_execution() {
    let plan = PlanBuilder::scan("orders", orders_schema())
        .project(vec![Expr::col("missing")])
        .build();
    let err = Driver::new(&memory()).collect(&plan).unwrap_err();
    assert_eq!(err.error.kind(), ErrorKind::Schema);
    assert_eq!(err.node.map(|n| n.id), Some(0));
}

#[test]
fn test_nan_never_satisfies_a_comparison() {
    let rows = vec![row![1i64, f64::NAN], row![2i64, 0.75], row![3i64, 0.25]];
    let plan = PlanBuilder::values(orders_schema(), rows)
        .filter(Expr::gt(Expr::col("amount"), Expr::literal(0.5)))
        .project(vec![Expr::col("id")])
        .build();
    for_each_backend(|run| assert_eq!(run(&plan), vec![row![2i64]]));
}

#[test]
fn test_execution_errors_name_the_same_node_on_every_backend() {
    let plan = PlanBuilder::scan("orders", orders_schema())
        .project(vec![Expr::div(Expr::col("id"), Expr::literal(0i64)).alias("q")])
        .limit(10)
        .build();
    let eager = Driver::new(&memory()).collect(&plan).unwrap_err();
    let lazy = Driver::new(&partitioned()).collect(&plan).unwrap_err();
    assert_eq!(eager.node.map(|n| n.to_string()), Some("#1 Project".to_string()));
    assert_eq!(lazy.node, eager.node);
    assert_eq!(lazy.error.kind(), ErrorKind::Arithmetic);
}
