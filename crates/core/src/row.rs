//! Row structure for Quill.
//!
//! A `Row` is a positional sequence of values interpreted against a schema.

use crate::value::Value;
use alloc::vec::Vec;

/// A row of values, positional against a schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values.
    #[inline]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gets a value at the given column index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Appends a value.
    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Returns the number of values in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Concatenates two rows, left values first.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend(self.values.iter().cloned());
        values.extend(other.values.iter().cloned());
        Row { values }
    }

    /// Creates a row of `width` nulls.
    pub fn nulls(width: usize) -> Row {
        Row {
            values: alloc::vec![Value::Null; width],
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Builds a [`Row`] from a list of expressions convertible into [`Value`].
///
/// ```
/// use quill_core::{row, Value};
/// let r = row![1i64, "a", None::<i32>];
/// assert_eq!(r.get(2), Some(&Value::Null));
/// ```
#[macro_export]
macro_rules! row {
    ($($v:expr),* $(,)?) => {
        $crate::Row::new($crate::__private::vec![$($crate::Value::from($v)),*])
    };
}
