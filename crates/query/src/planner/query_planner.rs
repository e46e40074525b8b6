//! Query planner: turns a logical plan into a fully resolved physical plan.
//!
//! Planning is pure and happens before any backend call, so type, schema and
//! parameter errors are reported without side effects. Every node is
//! resolved against the output schemas of its already-resolved inputs.
//!
//! ## Usage
//!
//! ```ignore
//! let physical = QueryPlanner::new().plan(&logical)?;
//! ```

use super::logical::LogicalPlan;
use super::physical::{
    AggregateOp, FilterOp, JoinOp, JoinOutputColumn, LimitOp, NodeRef, PhysicalOp, PhysicalPlan,
    ProjectOp, ScanOp, SortOp, TypedAggregate, TypedWindow, UnionOp, ValuesOp, WindowOp,
};
use super::resolve::{resolve_expr, resolve_predicate, resolve_sort_key};
use crate::ast::{
    AggregateCall, AggregateFunc, Expr, JoinType, SortKey, TypedSortKey, WindowCall, WindowFrame,
    WindowFunc,
};
use crate::eval::aggregate_output_type;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use quill_core::schema::{Column, Schema};
use quill_core::{resolve_type, DataType, Error, Result, Row};

/// A planning failure attributed to the node that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanError {
    pub node: NodeRef,
    pub error: Error,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planning {} failed: {}", self.node, self.error)
    }
}

/// Resolves logical plans into physical plans.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans the whole tree, assigning node ids in pre-order.
    pub fn plan(&self, plan: &LogicalPlan) -> core::result::Result<PhysicalPlan, PlanError> {
        let mut next_id = 0;
        self.plan_node(plan, &mut next_id)
    }

    fn plan_node(
        &self,
        plan: &LogicalPlan,
        next_id: &mut usize,
    ) -> core::result::Result<PhysicalPlan, PlanError> {
        let id = *next_id;
        *next_id += 1;

        let mut inputs = Vec::new();
        for input in plan.inputs() {
            inputs.push(self.plan_node(input, next_id)?);
        }
        let schemas: Vec<&Schema> = inputs.iter().map(|p| p.schema()).collect();
        let op = resolve_operator(plan, &schemas).map_err(|error| PlanError {
            node: NodeRef {
                id,
                operator: plan.operator_name(),
            },
            error,
        })?;
        Ok(PhysicalPlan { id, op, inputs })
    }
}

/// Computes one node's output schema from its inputs' schemas, without data.
///
/// `inputs` holds the schemas of the node's children, left before right;
/// the children themselves are not inspected.
pub fn infer_output_schema(plan: &LogicalPlan, inputs: &[Schema]) -> Result<Schema> {
    let refs: Vec<&Schema> = inputs.iter().collect();
    resolve_operator(plan, &refs).map(|op| op.schema().clone())
}

fn input<'a>(plan: &LogicalPlan, inputs: &[&'a Schema], index: usize) -> Result<&'a Schema> {
    inputs.get(index).copied().ok_or_else(|| {
        Error::schema(format!(
            "{} expects {} input schemas, got {}",
            plan.operator_name(),
            plan.inputs().len(),
            inputs.len()
        ))
    })
}

fn resolve_operator(plan: &LogicalPlan, inputs: &[&Schema]) -> Result<PhysicalOp> {
    match plan {
        LogicalPlan::Scan { table, schema } => Ok(PhysicalOp::Scan(ScanOp {
            table: table.clone(),
            schema: schema.clone(),
        })),
        LogicalPlan::Values { schema, rows } => plan_values(schema, rows),
        LogicalPlan::Project { exprs, .. } => plan_project(exprs, input(plan, inputs, 0)?),
        LogicalPlan::Filter { predicate, .. } => {
            let schema = input(plan, inputs, 0)?;
            Ok(PhysicalOp::Filter(FilterOp {
                predicate: resolve_predicate(predicate, schema)?,
                schema: schema.clone(),
            }))
        }
        LogicalPlan::Join {
            kind,
            on,
            left_qualifier,
            right_qualifier,
            ..
        } => plan_join(
            *kind,
            on,
            (left_qualifier.as_str(), right_qualifier.as_str()),
            input(plan, inputs, 0)?,
            input(plan, inputs, 1)?,
        ),
        LogicalPlan::Aggregate {
            group_by,
            aggregates,
            ..
        } => plan_aggregate(group_by, aggregates, input(plan, inputs, 0)?),
        LogicalPlan::Sort { keys, .. } => {
            let schema = input(plan, inputs, 0)?;
            Ok(PhysicalOp::Sort(SortOp {
                keys: resolve_sort_keys(keys, schema)?,
                schema: schema.clone(),
            }))
        }
        LogicalPlan::Window { calls, .. } => plan_window(calls, input(plan, inputs, 0)?),
        LogicalPlan::Union { distinct, .. } => plan_union(
            *distinct,
            input(plan, inputs, 0)?,
            input(plan, inputs, 1)?,
        ),
        LogicalPlan::Limit { n, .. } => {
            let schema = input(plan, inputs, 0)?;
            let n = usize::try_from(*n)
                .map_err(|_| Error::config(format!("limit must be non-negative, got {}", n)))?;
            Ok(PhysicalOp::Limit(LimitOp {
                n,
                schema: schema.clone(),
            }))
        }
    }
}

fn plan_values(schema: &Schema, rows: &[Row]) -> Result<PhysicalOp> {
    for row in rows {
        schema.check_row(row)?;
    }
    Ok(PhysicalOp::Values(ValuesOp {
        rows: rows.to_vec(),
        schema: schema.clone(),
    }))
}

fn plan_project(exprs: &[Expr], input: &Schema) -> Result<PhysicalOp> {
    let mut typed = Vec::with_capacity(exprs.len());
    let mut columns = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let t = resolve_expr(expr, input)?;
        columns.push(Column::new(expr.output_name(), t.data_type).nullable(t.nullable));
        typed.push(t);
    }
    Ok(PhysicalOp::Project(ProjectOp {
        exprs: typed,
        schema: Schema::new(columns)?,
    }))
}

fn resolve_sort_keys(keys: &[SortKey], schema: &Schema) -> Result<Vec<TypedSortKey>> {
    keys.iter().map(|k| resolve_sort_key(k, schema)).collect()
}

fn plan_join(
    kind: JoinType,
    on: &[(String, String)],
    (left_qualifier, right_qualifier): (&str, &str),
    left: &Schema,
    right: &Schema,
) -> Result<PhysicalOp> {
    let mut left_keys = Vec::with_capacity(on.len());
    let mut right_keys = Vec::with_capacity(on.len());
    let mut key_types = Vec::with_capacity(on.len());
    for (l, r) in on {
        let li = left.resolve(l)?;
        let ri = right.resolve(r)?;
        let lt = left.columns()[li].data_type();
        let rt = right.columns()[ri].data_type();
        let t = resolve_type(lt, rt).map_err(|_| {
            Error::schema(format!(
                "join key type mismatch: {} {} vs {} {}",
                l, lt, r, rt
            ))
        })?;
        left_keys.push(li);
        right_keys.push(ri);
        key_types.push(t);
    }

    if !kind.emits_right() {
        return Ok(PhysicalOp::Join(JoinOp {
            kind,
            output: (0..left.len()).map(JoinOutputColumn::Left).collect(),
            left_keys,
            right_keys,
            key_types,
            schema: left.clone(),
        }));
    }

    let right_nullable = kind.preserves_left();
    let left_nullable = kind.preserves_right();
    let mut left_merged = alloc::vec![false; left.len()];
    let mut right_merged = alloc::vec![false; right.len()];
    let mut output = Vec::new();
    let mut columns = Vec::new();

    for (k, (&li, &ri)) in left_keys.iter().zip(&right_keys).enumerate() {
        let lc = &left.columns()[li];
        let rc = &right.columns()[ri];
        if lc.name() != rc.name() || left_merged[li] || right_merged[ri] {
            continue;
        }
        left_merged[li] = true;
        right_merged[ri] = true;
        let nullable = match kind {
            JoinType::Left => lc.is_nullable(),
            JoinType::Right => rc.is_nullable(),
            JoinType::Full => lc.is_nullable() || rc.is_nullable(),
            _ => false,
        };
        output.push(JoinOutputColumn::Merged { key: k });
        columns.push(Column::new(lc.name(), key_types[k]).nullable(nullable));
    }

    let remaining_right: Vec<&str> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| !right_merged[*i])
        .map(|(_, c)| c.name())
        .collect();
    let remaining_left: Vec<&str> = left
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| !left_merged[*i])
        .map(|(_, c)| c.name())
        .collect();

    for (i, c) in left.columns().iter().enumerate() {
        if left_merged[i] {
            continue;
        }
        let column = if remaining_right.contains(&c.name()) {
            c.renamed(format!("{}.{}", left_qualifier, c.name()))
        } else {
            c.clone()
        };
        let nullable = column.is_nullable() || left_nullable;
        output.push(JoinOutputColumn::Left(i));
        columns.push(column.nullable(nullable));
    }
    for (i, c) in right.columns().iter().enumerate() {
        if right_merged[i] {
            continue;
        }
        let column = if remaining_left.contains(&c.name()) {
            c.renamed(format!("{}.{}", right_qualifier, c.name()))
        } else {
            c.clone()
        };
        let nullable = column.is_nullable() || right_nullable;
        output.push(JoinOutputColumn::Right(i));
        columns.push(column.nullable(nullable));
    }

    Ok(PhysicalOp::Join(JoinOp {
        kind,
        left_keys,
        right_keys,
        key_types,
        output,
        schema: Schema::new(columns)?,
    }))
}

fn plan_aggregate_call(call: &AggregateCall, input: &Schema) -> Result<TypedAggregate> {
    let arg = match &call.arg {
        Some(e) => Some(resolve_expr(e, input)?),
        None if call.func == AggregateFunc::Count => None,
        None => {
            return Err(Error::type_error(format!(
                "{}() requires an argument",
                call.func.name()
            )))
        }
    };
    let output_type = aggregate_output_type(call.func, arg.as_ref().map(|a| a.data_type))?;
    Ok(TypedAggregate {
        func: call.func,
        arg,
        output_type,
    })
}

fn is_count(func: AggregateFunc) -> bool {
    matches!(func, AggregateFunc::Count | AggregateFunc::CountDistinct)
}

fn plan_aggregate(
    group_by: &[Expr],
    aggregates: &[AggregateCall],
    input: &Schema,
) -> Result<PhysicalOp> {
    let mut columns = Vec::with_capacity(group_by.len() + aggregates.len());
    let mut keys = Vec::with_capacity(group_by.len());
    for expr in group_by {
        let t = resolve_expr(expr, input)?;
        columns.push(Column::new(expr.output_name(), t.data_type).nullable(t.nullable));
        keys.push(t);
    }
    let mut typed = Vec::with_capacity(aggregates.len());
    for call in aggregates {
        let agg = plan_aggregate_call(call, input)?;
        columns.push(Column::new(call.output_name(), agg.output_type).nullable(!is_count(agg.func)));
        typed.push(agg);
    }
    Ok(PhysicalOp::Aggregate(AggregateOp {
        group_by: keys,
        aggregates: typed,
        schema: Schema::new(columns)?,
    }))
}

fn plan_window_call(call: &WindowCall, input: &Schema) -> Result<(TypedWindow, bool)> {
    let partition_by = call
        .partition_by
        .iter()
        .map(|e| resolve_expr(e, input))
        .collect::<Result<Vec<_>>>()?;
    let order_by = resolve_sort_keys(&call.order_by, input)?;
    let frame = call
        .frame
        .unwrap_or_else(|| WindowFrame::default_for(!order_by.is_empty()));
    frame.validate()?;
    let arg = call
        .arg
        .as_deref()
        .map(|e| resolve_expr(e, input))
        .transpose()?;

    let require_arg = |name: &str| {
        arg.as_ref()
            .ok_or_else(|| Error::type_error(format!("{}() requires an argument", name)))
    };

    let (func, data_type, nullable) = match &call.func {
        WindowFunc::RowNumber | WindowFunc::Rank | WindowFunc::DenseRank => {
            if arg.is_some() {
                return Err(Error::type_error(format!(
                    "{}() takes no argument",
                    call.func.name()
                )));
            }
            (call.func.clone(), DataType::Int64, false)
        }
        WindowFunc::Lag { offset, default } | WindowFunc::Lead { offset, default } => {
            let a = require_arg(call.func.name())?;
            if *offset < 0 {
                return Err(Error::config(format!(
                    "{}() offset must be non-negative, got {}",
                    call.func.name(),
                    offset
                )));
            }
            let default = default
                .as_ref()
                .map(|d| d.cast_to(a.data_type))
                .transpose()?;
            let nullable = a.nullable || default.as_ref().map_or(true, |d| d.is_null());
            let func = match call.func {
                WindowFunc::Lag { .. } => WindowFunc::Lag {
                    offset: *offset,
                    default,
                },
                _ => WindowFunc::Lead {
                    offset: *offset,
                    default,
                },
            };
            (func, a.data_type, nullable)
        }
        WindowFunc::Aggregate(agg) => {
            if arg.is_none() && *agg != AggregateFunc::Count {
                require_arg(agg.name())?;
            }
            let t = aggregate_output_type(*agg, arg.as_ref().map(|a| a.data_type))?;
            (call.func.clone(), t, !is_count(*agg))
        }
    };

    Ok((
        TypedWindow {
            func,
            arg,
            partition_by,
            order_by,
            frame,
            data_type,
        },
        nullable,
    ))
}

fn plan_window(calls: &[WindowCall], input: &Schema) -> Result<PhysicalOp> {
    let mut columns: Vec<Column> = input.columns().to_vec();
    let mut typed = Vec::with_capacity(calls.len());
    for call in calls {
        let (window, nullable) = plan_window_call(call, input)?;
        columns.push(Column::new(call.output_name(), window.data_type).nullable(nullable));
        typed.push(window);
    }
    Ok(PhysicalOp::Window(WindowOp {
        calls: typed,
        schema: Schema::new(columns)?,
    }))
}

fn plan_union(distinct: bool, left: &Schema, right: &Schema) -> Result<PhysicalOp> {
    if left.len() != right.len() {
        return Err(Error::schema(format!(
            "union inputs have {} and {} columns",
            left.len(),
            right.len()
        )));
    }
    let mut columns = Vec::with_capacity(left.len());
    for (l, r) in left.columns().iter().zip(right.columns()) {
        let t = resolve_type(l.data_type(), r.data_type())?;
        columns.push(Column::new(l.name(), t).nullable(l.is_nullable() || r.is_nullable()));
    }
    Ok(PhysicalOp::Union(UnionOp {
        distinct,
        schema: Schema::new(columns)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FrameBound;
    use alloc::string::ToString;
    use alloc::vec;
    use quill_core::schema::SchemaBuilder;
    use quill_core::{ErrorKind, Value};

    fn users() -> Schema {
        SchemaBuilder::new()
            .add_required("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .build()
    }

    fn orders() -> Schema {
        SchemaBuilder::new()
            .add_required("id", DataType::Int32)
            .unwrap()
            .add_column("amount", DataType::Float64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .build()
    }

    fn names(schema: &Schema) -> Vec<&str> {
        schema.names().collect()
    }

    #[test]
    fn test_plan_assigns_preorder_ids() {
        let plan = LogicalPlan::limit(
            LogicalPlan::inner_join(
                LogicalPlan::scan("users", users()),
                LogicalPlan::scan("orders", orders()),
                "id",
                "id",
            ),
            3,
        );
        let physical = QueryPlanner::new().plan(&plan).unwrap();
        assert_eq!(physical.id, 0);
        assert_eq!(physical.inputs[0].id, 1);
        assert_eq!(physical.inputs[0].inputs[0].id, 2);
        assert_eq!(physical.inputs[0].inputs[1].id, 3);
    }

    #[test]
    fn test_plan_error_names_node() {
        let plan = LogicalPlan::limit(
            LogicalPlan::filter(
                LogicalPlan::scan("users", users()),
                Expr::eq(Expr::col("missing"), Expr::literal(1i64)),
            ),
            3,
        );
        let err = QueryPlanner::new().plan(&plan).unwrap_err();
        assert_eq!(err.node, NodeRef { id: 1, operator: "Filter" });
        assert_eq!(err.error.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_join_output_schema() {
        let plan = LogicalPlan::left_join(
            LogicalPlan::scan("users", users()),
            LogicalPlan::scan("orders", orders()),
            "id",
            "id",
        );
        let schema = infer_output_schema(&plan, &[users(), orders()]).unwrap();
        assert_eq!(names(&schema), vec!["id", "left.name", "amount", "right.name"]);
        let id = schema.field("id").unwrap();
        assert_eq!(id.data_type(), DataType::Int64);
        assert!(!id.is_nullable());
        assert!(schema.field("amount").unwrap().is_nullable());

        let plan = plan.with_qualifiers("u", "o");
        let schema = infer_output_schema(&plan, &[users(), orders()]).unwrap();
        assert_eq!(names(&schema), vec!["id", "u.name", "amount", "o.name"]);
    }

    #[test]
    fn test_join_key_mismatch_is_schema_error() {
        let plan = LogicalPlan::inner_join(
            LogicalPlan::scan("users", users()),
            LogicalPlan::scan("orders", orders()),
            "name",
            "amount",
        );
        let err = infer_output_schema(&plan, &[users(), orders()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_semi_join_outputs_left() {
        let plan = LogicalPlan::join(
            LogicalPlan::scan("users", users()),
            LogicalPlan::scan("orders", orders()),
            JoinType::Semi,
            vec![("id".to_string(), "id".to_string())],
        );
        assert_eq!(infer_output_schema(&plan, &[users(), orders()]).unwrap(), users());
    }

    #[test]
    fn test_project_duplicate_names() {
        let plan = LogicalPlan::project(
            LogicalPlan::scan("users", users()),
            vec![Expr::col("id"), Expr::col("name").alias("id")],
        );
        let err = infer_output_schema(&plan, &[users()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_aggregate_schema() {
        let plan = LogicalPlan::aggregate(
            LogicalPlan::scan("orders", orders()),
            vec![Expr::col("name")],
            vec![AggregateCall::count_star(), AggregateCall::sum(Expr::col("amount"))],
        );
        let schema = infer_output_schema(&plan, &[orders()]).unwrap();
        assert_eq!(names(&schema), vec!["name", "count(*)", "sum(amount)"]);
        assert!(!schema.field("count(*)").unwrap().is_nullable());
        assert_eq!(schema.field("sum(amount)").unwrap().data_type(), DataType::Float64);

        let plan = LogicalPlan::aggregate(
            LogicalPlan::scan("orders", orders()),
            vec![],
            vec![AggregateCall::sum(Expr::col("name"))],
        );
        let err = infer_output_schema(&plan, &[orders()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_window_schema_and_validation() {
        let call = WindowCall::row_number().order_by(vec![SortKey::asc(Expr::col("id"))]);
        let plan = LogicalPlan::window(LogicalPlan::scan("users", users()), vec![call]);
        let schema = infer_output_schema(&plan, &[users()]).unwrap();
        assert_eq!(names(&schema), vec!["id", "name", "row_number()"]);

        let bad = WindowCall::aggregate(AggregateCall::sum(Expr::col("id")))
            .frame(WindowFrame::rows(FrameBound::Following(1), FrameBound::Preceding(1)));
        let plan = LogicalPlan::window(LogicalPlan::scan("users", users()), vec![bad]);
        let err = infer_output_schema(&plan, &[users()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let lag = WindowCall::lag(Expr::col("id"), -1);
        let plan = LogicalPlan::window(LogicalPlan::scan("users", users()), vec![lag]);
        let err = infer_output_schema(&plan, &[users()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_union_schema() {
        let a = Schema::new(vec![Column::new("x", DataType::Int32).nullable(false)]).unwrap();
        let b = Schema::new(vec![Column::new("y", DataType::Int64)]).unwrap();
        let plan = LogicalPlan::union_all(
            LogicalPlan::values(a.clone(), vec![]),
            LogicalPlan::values(b.clone(), vec![]),
        );
        let schema = infer_output_schema(&plan, &[a.clone(), b]).unwrap();
        assert_eq!(names(&schema), vec!["x"]);
        assert_eq!(schema.column(0).unwrap().data_type(), DataType::Int64);
        assert!(schema.column(0).unwrap().is_nullable());

        let c = Schema::new(vec![Column::new("s", DataType::String)]).unwrap();
        let plan = LogicalPlan::union_all(
            LogicalPlan::values(a.clone(), vec![]),
            LogicalPlan::values(c.clone(), vec![]),
        );
        let err = infer_output_schema(&plan, &[a.clone(), c]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let err = infer_output_schema(&plan, &[a.clone(), users()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_negative_limit_is_config_error() {
        let plan = LogicalPlan::limit(LogicalPlan::scan("users", users()), -1);
        let err = QueryPlanner::new().plan(&plan).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Config);
        assert_eq!(err.node.id, 0);
    }

    #[test]
    fn test_values_rows_are_type_checked() {
        let plan = LogicalPlan::values(users(), vec![Row::new(vec![Value::from("x"), Value::Null])]);
        let err = QueryPlanner::new().plan(&plan).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Type);
    }
}
