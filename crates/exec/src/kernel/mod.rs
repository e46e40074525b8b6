//! Operator kernels over row vectors.
//!
//! Each kernel wraps a resolved operator and transforms whole inputs, in the
//! order the operator's semantics define. Backends compose them; the
//! partitioned backend also uses the split aggregation steps.

mod aggregate;
mod filter;
mod join;
mod limit;
mod project;
mod sort;
mod union;
mod window;

pub use aggregate::{AggregateExecutor, GroupTable};
pub use filter::FilterExecutor;
pub use join::HashJoin;
pub use limit::LimitExecutor;
pub use project::ProjectExecutor;
pub use sort::SortExecutor;
pub use union::{dedup, UnionExecutor};
pub use window::WindowExecutor;
