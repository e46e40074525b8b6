//! Schema module for Quill.
//!
//! A schema is the ordered, immutable list of columns describing a relation.

mod column;
mod layout;

pub use column::Column;
pub use layout::{Schema, SchemaBuilder};
