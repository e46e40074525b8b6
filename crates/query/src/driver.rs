//! Execution driver.
//!
//! Execution has two phases. Planning resolves the whole logical plan before
//! any backend call; dispatch then walks the physical plan in post-order
//! (left input before right), hands each operator to the backend and checks
//! the schema the backend reports for the resulting handle.

use crate::backend::Backend;
use crate::planner::{LogicalPlan, NodeRef, PhysicalOp, PhysicalPlan, PlanError, QueryPlanner};
use alloc::format;
use alloc::vec::Vec;
use core::fmt;
use log::{debug, trace};
use quill_core::schema::Schema;
use quill_core::{Error, Row};

/// How strictly backend-reported schemas are compared with planned ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SchemaCheck {
    /// Names, types and nullability must match.
    #[default]
    Strict,
    /// Names and types must match; nullability is not compared.
    NamesAndTypes,
    /// No check.
    Off,
}

/// Driver configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DriverConfig {
    pub schema_check: SchemaCheck,
}

impl DriverConfig {
    pub fn with_schema_check(mut self, schema_check: SchemaCheck) -> Self {
        self.schema_check = schema_check;
        self
    }
}

/// An execution failure. `node` names the plan node whose work failed; it
/// is `None` only when a backend cannot attribute a failure to one.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    pub node: Option<NodeRef>,
    pub error: Error,
}

impl ExecutionError {
    pub fn at(node: NodeRef, error: Error) -> Self {
        Self {
            node: Some(node),
            error,
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{}: {}", node, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl From<PlanError> for ExecutionError {
    fn from(e: PlanError) -> Self {
        Self::at(e.node, e.error)
    }
}

/// Result type for driver operations.
pub type ExecutionResult<T> = core::result::Result<T, ExecutionError>;

/// Runs logical plans against a backend.
pub struct Driver<'a, B: Backend> {
    backend: &'a B,
    planner: QueryPlanner,
    config: DriverConfig,
}

impl<'a, B: Backend> Driver<'a, B> {
    /// Creates a driver with the default (strict) configuration.
    pub fn new(backend: &'a B) -> Self {
        Self::with_config(backend, DriverConfig::default())
    }

    pub fn with_config(backend: &'a B, config: DriverConfig) -> Self {
        Self {
            backend,
            planner: QueryPlanner::new(),
            config,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Plans and dispatches `plan`, returning the root handle and its schema.
    pub fn execute(&self, plan: &LogicalPlan) -> ExecutionResult<(B::Handle, Schema)> {
        let physical = self.planner.plan(plan)?;
        debug!(
            "planned {} nodes for backend {}",
            physical.node_count(),
            self.backend.name()
        );
        let handle = self.execute_node(&physical)?;
        Ok((handle, physical.schema().clone()))
    }

    /// Executes `plan` and materializes its rows.
    pub fn collect(&self, plan: &LogicalPlan) -> ExecutionResult<Vec<Row>> {
        let (handle, _) = self.execute(plan)?;
        let rows = self.backend.collect(handle)?;
        debug!("collected {} rows from {}", rows.len(), self.backend.name());
        Ok(rows)
    }

    fn execute_node(&self, node: &PhysicalPlan) -> ExecutionResult<B::Handle> {
        let mut handles = Vec::with_capacity(node.inputs.len());
        for input in &node.inputs {
            handles.push(self.execute_node(input)?);
        }

        let node_ref = node.node_ref();
        debug!("dispatching {} to {}", node_ref, self.backend.name());
        let handle = self
            .dispatch(&node.op, handles, node_ref)
            .map_err(|e| ExecutionError::at(node_ref, e))?;
        self.check_schema(node.schema(), &handle)
            .map_err(|e| ExecutionError::at(node_ref, e))?;
        trace!("schema check passed for {}", node_ref);
        Ok(handle)
    }

    fn dispatch(
        &self,
        op: &PhysicalOp,
        handles: Vec<B::Handle>,
        node: NodeRef,
    ) -> quill_core::Result<B::Handle> {
        let mut handles = handles.into_iter();
        let mut next = || {
            handles
                .next()
                .ok_or_else(|| Error::schema(format!("{} is missing an input", op.name())))
        };
        let b = self.backend;
        match op {
            PhysicalOp::Scan(op) => b.scan(op, node),
            PhysicalOp::Values(op) => b.values(op, node),
            PhysicalOp::Project(op) => b.project(next()?, op, node),
            PhysicalOp::Filter(op) => b.filter(next()?, op, node),
            PhysicalOp::Aggregate(op) => b.aggregate(next()?, op, node),
            PhysicalOp::Sort(op) => b.sort(next()?, op, node),
            PhysicalOp::Window(op) => b.window(next()?, op, node),
            PhysicalOp::Limit(op) => b.limit(next()?, op, node),
            PhysicalOp::Join(op) => {
                let left = next()?;
                let right = next()?;
                b.join(left, right, op, node)
            }
            PhysicalOp::Union(op) => {
                let left = next()?;
                let right = next()?;
                b.union(left, right, op, node)
            }
        }
    }

    fn check_schema(&self, expected: &Schema, handle: &B::Handle) -> quill_core::Result<()> {
        let matches = match self.config.schema_check {
            SchemaCheck::Off => return Ok(()),
            SchemaCheck::Strict => self.backend.schema(handle) == *expected,
            SchemaCheck::NamesAndTypes => {
                let reported = self.backend.schema(handle);
                reported.len() == expected.len()
                    && reported.columns().iter().zip(expected.columns()).all(|(r, e)| {
                        r.name() == e.name() && r.data_type() == e.data_type()
                    })
            }
        };
        if matches {
            Ok(())
        } else {
            Err(Error::schema(format!(
                "backend {} reported schema {}, expected {}",
                self.backend.name(),
                self.backend.schema(handle),
                expected
            )))
        }
    }
}

/// Executes `plan` on `backend` with the default configuration.
pub fn execute<B: Backend>(plan: &LogicalPlan, backend: &B) -> ExecutionResult<(B::Handle, Schema)> {
    Driver::new(backend).execute(plan)
}
