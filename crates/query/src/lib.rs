//! Quill Query - backend-agnostic relational query execution.
//!
//! This crate provides:
//!
//! - `ast`: Expressions, aggregate and window calls, sort keys
//! - `planner`: Logical plans, the plan builder, and resolution into physical plans
//! - `eval`: Expression evaluation under three-valued logic, accumulators, sort comparison
//! - `backend`: The adapter interface execution backends implement
//! - `driver`: Plans a query and dispatches it to a backend
//!
//! # Example
//!
//! ```ignore
//! use quill_query::ast::{AggregateCall, Expr};
//! use quill_query::driver::Driver;
//! use quill_query::planner::PlanBuilder;
//!
//! let plan = PlanBuilder::scan("orders", orders_schema)
//!     .aggregate(vec![Expr::col("id")], vec![AggregateCall::sum(Expr::col("amount"))])
//!     .build();
//! let rows = Driver::new(&backend).collect(&plan)?;
//! ```

#![no_std]

extern crate alloc;

pub mod ast;
pub mod backend;
pub mod driver;
pub mod eval;
pub mod planner;

pub use backend::Backend;
pub use driver::{execute, Driver, DriverConfig, ExecutionError, ExecutionResult, SchemaCheck};
pub use planner::{infer_output_schema, LogicalPlan, PlanBuilder, QueryPlanner};
