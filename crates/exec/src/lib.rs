//! Quill Exec - operator kernels and reference backends.
//!
//! This crate provides:
//!
//! - `kernel`: row-vector implementations of every resolved operator
//! - `MemoryBackend`: an eager backend whose handles hold materialized rows
//! - `PartitionedBackend`: a lazy backend that hash-partitions rows and
//!   defers all work to `collect`
//!
//! # Example
//!
//! ```rust
//! use quill_core::schema::SchemaBuilder;
//! use quill_core::{row, DataType};
//! use quill_exec::MemoryBackend;
//! use quill_query::ast::{AggregateCall, Expr, SortKey};
//! use quill_query::{Driver, PlanBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .add_required("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("amount", DataType::Int64)
//!     .unwrap()
//!     .build();
//!
//! let mut backend = MemoryBackend::new();
//! backend
//!     .register("orders", schema.clone(), vec![row![1i64, 10i64], row![2i64, 5i64], row![1i64, 20i64]])
//!     .unwrap();
//!
//! let plan = PlanBuilder::scan("orders", schema)
//!     .aggregate(vec![Expr::col("id")], vec![AggregateCall::sum(Expr::col("amount"))])
//!     .sort(vec![SortKey::asc(Expr::col("id"))])
//!     .build();
//!
//! let rows = Driver::new(&backend).collect(&plan).unwrap();
//! assert_eq!(rows, vec![row![1i64, 30i64], row![2i64, 5i64]]);
//! ```

#![no_std]

extern crate alloc;

pub mod kernel;
mod memory;
mod partitioned;

pub use memory::{MemoryBackend, MemoryRelation};
pub use partitioned::{PartitionedBackend, PartitionedConfig, PartitionedRelation};
