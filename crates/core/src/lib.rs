//! Quill Core - types, values and schemas shared by every Quill component.
//!
//! This crate provides the foundational types of the Quill relational core:
//!
//! - `DataType`: canonical column types, including fixed-point decimals
//! - `Value`: runtime values exchanged with backends
//! - `Row`: a positional sequence of values
//! - `schema`: `Column`, `Schema` and `SchemaBuilder`
//! - `resolve_type` / `can_cast`: type coercion rules
//! - `Error`: the error taxonomy shared by planning, evaluation and backends
//!
//! # Example
//!
//! ```rust
//! use quill_core::{resolve_type, DataType, Row, Value};
//! use quill_core::schema::SchemaBuilder;
//!
//! let schema = SchemaBuilder::new()
//!     .add_required("id", DataType::Int64)
//!     .unwrap()
//!     .add_column("name", DataType::String)
//!     .unwrap()
//!     .build();
//!
//! let row = Row::new(vec![Value::Int64(1), Value::String("Alice".into())]);
//! assert!(schema.check_row(&row).is_ok());
//!
//! assert_eq!(resolve_type(DataType::Int8, DataType::Int32).unwrap(), DataType::Int32);
//! ```

#![no_std]

extern crate alloc;

mod coercion;
mod error;
pub mod pattern_match;
mod row;
pub mod schema;
pub mod temporal;
mod types;
mod value;

pub use coercion::{can_cast, resolve_type, resolve_types};
pub use error::{Error, ErrorKind, Result};
pub use row::Row;
pub use rust_decimal::Decimal;
pub use types::{DataType, MAX_DECIMAL_PRECISION};
pub use value::{rescale_decimal, Value};

#[doc(hidden)]
pub mod __private {
    pub use alloc::vec;
}
