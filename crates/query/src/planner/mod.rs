//! Query planner module.

mod builder;
mod logical;
mod physical;
mod query_planner;
mod resolve;

pub use builder::PlanBuilder;
pub use logical::LogicalPlan;
pub use physical::{
    AggregateOp, FilterOp, JoinOp, JoinOutputColumn, LimitOp, NodeRef, PhysicalOp, PhysicalPlan,
    ProjectOp, ScanOp, SortOp, TypedAggregate, TypedWindow, UnionOp, ValuesOp, WindowOp,
};
pub use query_planner::{infer_output_schema, PlanError, QueryPlanner};
pub use resolve::{resolve_expr, resolve_predicate, resolve_sort_key};
