//! Logical query plan definitions.

use crate::ast::{AggregateCall, Expr, JoinType, SortKey, WindowCall};
use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write;
use quill_core::schema::Schema;
use quill_core::Row;

/// Logical query plan node.
///
/// Plans are trees: every node has a single owner, so a node is visited
/// exactly once by any traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicalPlan {
    /// Backend table with its declared schema.
    Scan { table: String, schema: Schema },

    /// Inline literal rows.
    Values { schema: Schema, rows: Vec<Row> },

    /// Projection (SELECT list).
    Project {
        input: Box<LogicalPlan>,
        exprs: Vec<Expr>,
    },

    /// Filter (WHERE clause).
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },

    /// Equi-join on pairs of (left column, right column) names.
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        kind: JoinType,
        on: Vec<(String, String)>,
        /// Prefix for colliding left column names.
        left_qualifier: String,
        /// Prefix for colliding right column names.
        right_qualifier: String,
    },

    /// Aggregation (GROUP BY).
    Aggregate {
        input: Box<LogicalPlan>,
        group_by: Vec<Expr>,
        aggregates: Vec<AggregateCall>,
    },

    /// Sort (ORDER BY).
    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<SortKey>,
    },

    /// Window functions appended to every input row.
    Window {
        input: Box<LogicalPlan>,
        calls: Vec<WindowCall>,
    },

    /// Union of two relations; `distinct` removes duplicate rows.
    Union {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        distinct: bool,
    },

    /// At most `n` rows. Negative `n` is rejected at planning.
    Limit { input: Box<LogicalPlan>, n: i64 },
}

impl LogicalPlan {
    /// Creates a table scan plan.
    pub fn scan(table: impl Into<String>, schema: Schema) -> Self {
        LogicalPlan::Scan {
            table: table.into(),
            schema,
        }
    }

    /// Creates an inline table.
    pub fn values(schema: Schema, rows: Vec<Row>) -> Self {
        LogicalPlan::Values { schema, rows }
    }

    /// Creates a projection plan.
    pub fn project(input: LogicalPlan, exprs: Vec<Expr>) -> Self {
        LogicalPlan::Project {
            input: Box::new(input),
            exprs,
        }
    }

    /// Creates a filter plan.
    pub fn filter(input: LogicalPlan, predicate: Expr) -> Self {
        LogicalPlan::Filter {
            input: Box::new(input),
            predicate,
        }
    }

    /// Creates a join plan with the default `left`/`right` qualifiers.
    pub fn join(
        left: LogicalPlan,
        right: LogicalPlan,
        kind: JoinType,
        on: Vec<(String, String)>,
    ) -> Self {
        LogicalPlan::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind,
            on,
            left_qualifier: "left".into(),
            right_qualifier: "right".into(),
        }
    }

    /// Creates an inner join on a single pair of columns.
    pub fn inner_join(
        left: LogicalPlan,
        right: LogicalPlan,
        left_key: impl Into<String>,
        right_key: impl Into<String>,
    ) -> Self {
        Self::join(
            left,
            right,
            JoinType::Inner,
            alloc::vec![(left_key.into(), right_key.into())],
        )
    }

    /// Creates a left outer join on a single pair of columns.
    pub fn left_join(
        left: LogicalPlan,
        right: LogicalPlan,
        left_key: impl Into<String>,
        right_key: impl Into<String>,
    ) -> Self {
        Self::join(
            left,
            right,
            JoinType::Left,
            alloc::vec![(left_key.into(), right_key.into())],
        )
    }

    /// Creates a cross product (inner join without keys).
    pub fn cross_product(left: LogicalPlan, right: LogicalPlan) -> Self {
        Self::join(left, right, JoinType::Inner, Vec::new())
    }

    /// Replaces the qualifiers used to rename colliding join columns.
    /// No effect on other nodes.
    pub fn with_qualifiers(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        if let LogicalPlan::Join {
            left_qualifier,
            right_qualifier,
            ..
        } = &mut self
        {
            *left_qualifier = left.into();
            *right_qualifier = right.into();
        }
        self
    }

    /// Creates an aggregation plan.
    pub fn aggregate(
        input: LogicalPlan,
        group_by: Vec<Expr>,
        aggregates: Vec<AggregateCall>,
    ) -> Self {
        LogicalPlan::Aggregate {
            input: Box::new(input),
            group_by,
            aggregates,
        }
    }

    /// Creates a sort plan.
    pub fn sort(input: LogicalPlan, keys: Vec<SortKey>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(input),
            keys,
        }
    }

    /// Creates a window plan.
    pub fn window(input: LogicalPlan, calls: Vec<WindowCall>) -> Self {
        LogicalPlan::Window {
            input: Box::new(input),
            calls,
        }
    }

    /// Creates a UNION ALL plan.
    pub fn union_all(left: LogicalPlan, right: LogicalPlan) -> Self {
        LogicalPlan::Union {
            left: Box::new(left),
            right: Box::new(right),
            distinct: false,
        }
    }

    /// Creates a UNION (distinct) plan.
    pub fn union(left: LogicalPlan, right: LogicalPlan) -> Self {
        LogicalPlan::Union {
            left: Box::new(left),
            right: Box::new(right),
            distinct: true,
        }
    }

    /// Creates a limit plan.
    pub fn limit(input: LogicalPlan, n: i64) -> Self {
        LogicalPlan::Limit {
            input: Box::new(input),
            n,
        }
    }

    /// Returns the input plan(s) of this node, left before right.
    pub fn inputs(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } | LogicalPlan::Values { .. } => alloc::vec![],
            LogicalPlan::Project { input, .. }
            | LogicalPlan::Filter { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Window { input, .. }
            | LogicalPlan::Limit { input, .. } => alloc::vec![input.as_ref()],
            LogicalPlan::Join { left, right, .. } | LogicalPlan::Union { left, right, .. } => {
                alloc::vec![left.as_ref(), right.as_ref()]
            }
        }
    }

    /// The operator name used in explain output and error reports.
    pub fn operator_name(&self) -> &'static str {
        match self {
            LogicalPlan::Scan { .. } => "Scan",
            LogicalPlan::Values { .. } => "Values",
            LogicalPlan::Project { .. } => "Project",
            LogicalPlan::Filter { .. } => "Filter",
            LogicalPlan::Join { .. } => "Join",
            LogicalPlan::Aggregate { .. } => "Aggregate",
            LogicalPlan::Sort { .. } => "Sort",
            LogicalPlan::Window { .. } => "Window",
            LogicalPlan::Union { .. } => "Union",
            LogicalPlan::Limit { .. } => "Limit",
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.inputs().iter().map(|i| i.node_count()).sum::<usize>()
    }

    /// One-line description of this node without its inputs.
    pub fn describe(&self) -> String {
        let name = self.operator_name();
        match self {
            LogicalPlan::Scan { table, schema } => format!("{} {} {}", name, table, schema),
            LogicalPlan::Values { schema, rows } => {
                format!("{} {} rows={}", name, schema, rows.len())
            }
            LogicalPlan::Project { exprs, .. } => format!("{} [{}]", name, join_display(exprs)),
            LogicalPlan::Filter { predicate, .. } => format!("{} {}", name, predicate),
            LogicalPlan::Join { kind, on, .. } => {
                let keys: Vec<String> = on.iter().map(|(l, r)| format!("{} = {}", l, r)).collect();
                format!("{} {} on [{}]", name, kind, keys.join(", "))
            }
            LogicalPlan::Aggregate {
                group_by,
                aggregates,
                ..
            } => {
                let aggs: Vec<String> = aggregates.iter().map(|a| a.output_name()).collect();
                format!(
                    "{} group_by=[{}] aggregates=[{}]",
                    name,
                    join_display(group_by),
                    aggs.join(", ")
                )
            }
            LogicalPlan::Sort { keys, .. } => format!("{} [{}]", name, join_display(keys)),
            LogicalPlan::Window { calls, .. } => {
                let names: Vec<String> = calls.iter().map(|c| c.output_name()).collect();
                format!("{} [{}]", name, names.join(", "))
            }
            LogicalPlan::Union { distinct, .. } => {
                if *distinct {
                    name.to_string()
                } else {
                    format!("{} all", name)
                }
            }
            LogicalPlan::Limit { n, .. } => format!("{} {}", name, n),
        }
    }

    /// Renders the plan as an indented tree. Node ids are assigned in
    /// pre-order and match the ids reported in planning and execution
    /// errors.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        let mut next_id = 0;
        self.explain_into(&mut out, 0, &mut next_id);
        out
    }

    fn explain_into(&self, out: &mut String, depth: usize, next_id: &mut usize) {
        let id = *next_id;
        *next_id += 1;
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = writeln!(out, "#{} {}", id, self.describe());
        for input in self.inputs() {
            input.explain_into(out, depth + 1, next_id);
        }
    }
}

fn join_display<T: core::fmt::Display>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    parts.join(", ")
}
