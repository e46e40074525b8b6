//! Fluent construction of logical plans.

use super::logical::LogicalPlan;
use super::query_planner::QueryPlanner;
use crate::ast::{AggregateCall, Expr, JoinType, SortKey, WindowCall};
use alloc::string::String;
use alloc::vec::Vec;
use quill_core::schema::Schema;
use quill_core::{Result, Row};

/// Builds a logical plan bottom-up.
///
/// ```ignore
/// let plan = PlanBuilder::scan("orders", orders_schema)
///     .filter(Expr::gt(Expr::col("amount"), Expr::literal(10.0)))
///     .aggregate(vec![Expr::col("id")], vec![AggregateCall::sum(Expr::col("amount"))])
///     .sort(vec![SortKey::asc(Expr::col("id"))])
///     .limit(5)
///     .build();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PlanBuilder {
    plan: LogicalPlan,
}

impl PlanBuilder {
    /// Starts from a table scan.
    pub fn scan(table: impl Into<String>, schema: Schema) -> Self {
        Self::from_plan(LogicalPlan::scan(table, schema))
    }

    /// Starts from inline rows.
    pub fn values(schema: Schema, rows: Vec<Row>) -> Self {
        Self::from_plan(LogicalPlan::values(schema, rows))
    }

    /// Continues from an existing plan.
    pub fn from_plan(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    pub fn project(self, exprs: Vec<Expr>) -> Self {
        Self::from_plan(LogicalPlan::project(self.plan, exprs))
    }

    pub fn filter(self, predicate: Expr) -> Self {
        Self::from_plan(LogicalPlan::filter(self.plan, predicate))
    }

    /// Joins with `right` on pairs of (left column, right column) names.
    pub fn join(self, right: impl Into<LogicalPlan>, kind: JoinType, on: &[(&str, &str)]) -> Self {
        let on = on
            .iter()
            .map(|(l, r)| (String::from(*l), String::from(*r)))
            .collect();
        Self::from_plan(LogicalPlan::join(self.plan, right.into(), kind, on))
    }

    /// Sets the rename qualifiers of the join just added.
    pub fn qualifiers(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::from_plan(self.plan.with_qualifiers(left, right))
    }

    pub fn aggregate(self, group_by: Vec<Expr>, aggregates: Vec<AggregateCall>) -> Self {
        Self::from_plan(LogicalPlan::aggregate(self.plan, group_by, aggregates))
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        Self::from_plan(LogicalPlan::sort(self.plan, keys))
    }

    pub fn window(self, calls: Vec<WindowCall>) -> Self {
        Self::from_plan(LogicalPlan::window(self.plan, calls))
    }

    pub fn union_all(self, other: impl Into<LogicalPlan>) -> Self {
        Self::from_plan(LogicalPlan::union_all(self.plan, other.into()))
    }

    pub fn union(self, other: impl Into<LogicalPlan>) -> Self {
        Self::from_plan(LogicalPlan::union(self.plan, other.into()))
    }

    pub fn limit(self, n: i64) -> Self {
        Self::from_plan(LogicalPlan::limit(self.plan, n))
    }

    /// Plans the tree built so far and returns its output schema.
    pub fn schema(&self) -> Result<Schema> {
        QueryPlanner::new()
            .plan(&self.plan)
            .map(|p| p.schema().clone())
            .map_err(|e| e.error)
    }

    pub fn build(self) -> LogicalPlan {
        self.plan
    }
}

impl From<PlanBuilder> for LogicalPlan {
    fn from(builder: PlanBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use quill_core::schema::SchemaBuilder;
    use quill_core::DataType;

    fn orders() -> Schema {
        SchemaBuilder::new()
            .add_required("id", DataType::Int64)
            .unwrap()
            .add_column("amount", DataType::Float64)
            .unwrap()
            .build()
    }

    #[test]
    fn test_builder_matches_constructors() {
        let built = PlanBuilder::scan("orders", orders())
            .filter(Expr::gt(Expr::col("amount"), Expr::literal(10.0)))
            .limit(5)
            .build();
        let direct = LogicalPlan::limit(
            LogicalPlan::filter(
                LogicalPlan::scan("orders", orders()),
                Expr::gt(Expr::col("amount"), Expr::literal(10.0)),
            ),
            5,
        );
        assert_eq!(built, direct);
    }

    #[test]
    fn test_builder_schema() {
        let schema = PlanBuilder::scan("a", orders())
            .join(PlanBuilder::scan("b", orders()), JoinType::Inner, &[("id", "id")])
            .qualifiers("a", "b")
            .schema()
            .unwrap();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["id", "a.amount", "b.amount"]);
    }
}
