//! Backend adapter interface.
//!
//! A backend maps each resolved operator onto its own execution model. The
//! driver hands it physical operators in post-order and threads the opaque
//! handles it returns from children to parents.

use crate::driver::ExecutionResult;
use crate::planner::{
    AggregateOp, FilterOp, JoinOp, LimitOp, NodeRef, ProjectOp, ScanOp, SortOp, UnionOp, ValuesOp,
    WindowOp,
};
use alloc::vec::Vec;
use quill_core::schema::Schema;
use quill_core::{Result, Row};

/// An execution backend.
///
/// Every operator method receives the already-resolved operator, including
/// its output schema, and must preserve the operator's relational semantics
/// exactly. A backend that cannot serve a feature returns
/// `Error::Unsupported`; values that do not match a declared type are a
/// `Error::Type`.
///
/// Backends may be eager (handles hold rows) or lazy (handles describe
/// deferred work). `node` identifies the plan node being dispatched; a lazy
/// backend keeps it so that errors raised in `collect` name the operator
/// that failed, as an eager backend's errors do.
pub trait Backend {
    /// Backend-specific relation handle.
    type Handle;

    /// Name used in error messages.
    fn name(&self) -> &str;

    /// Reads a registered table.
    fn scan(&self, op: &ScanOp, node: NodeRef) -> Result<Self::Handle>;

    /// Materializes inline rows.
    fn values(&self, op: &ValuesOp, node: NodeRef) -> Result<Self::Handle>;

    fn project(&self, input: Self::Handle, op: &ProjectOp, node: NodeRef) -> Result<Self::Handle>;

    fn filter(&self, input: Self::Handle, op: &FilterOp, node: NodeRef) -> Result<Self::Handle>;

    fn join(
        &self,
        left: Self::Handle,
        right: Self::Handle,
        op: &JoinOp,
        node: NodeRef,
    ) -> Result<Self::Handle>;

    fn aggregate(&self, input: Self::Handle, op: &AggregateOp, node: NodeRef)
        -> Result<Self::Handle>;

    /// Stable sort.
    fn sort(&self, input: Self::Handle, op: &SortOp, node: NodeRef) -> Result<Self::Handle>;

    fn window(&self, input: Self::Handle, op: &WindowOp, node: NodeRef) -> Result<Self::Handle>;

    /// Concatenates left then right, deduplicating when `op.distinct`.
    fn union(
        &self,
        left: Self::Handle,
        right: Self::Handle,
        op: &UnionOp,
        node: NodeRef,
    ) -> Result<Self::Handle>;

    fn limit(&self, input: Self::Handle, op: &LimitOp, node: NodeRef) -> Result<Self::Handle>;

    /// The schema of the relation a handle stands for.
    fn schema(&self, handle: &Self::Handle) -> Schema;

    /// Materializes a handle into rows. Deferred failures carry the node
    /// whose work raised them.
    fn collect(&self, handle: Self::Handle) -> ExecutionResult<Vec<Row>>;
}
