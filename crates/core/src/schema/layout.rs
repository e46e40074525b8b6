//! Relation schemas.

use super::column::Column;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Ordered sequence of uniquely named columns. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema, checking that names are non-empty and unique and
    /// that decimal columns have valid precision and scale.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        for (i, col) in columns.iter().enumerate() {
            check_name(col.name())?;
            col.data_type().validate()?;
            if columns[..i].iter().any(|c| c.name() == col.name()) {
                return Err(Error::schema(format!("duplicate column name '{}'", col.name())));
            }
        }
        Ok(Self { columns })
    }

    /// The schema with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a column by position.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Gets a column by name.
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column position by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Gets a column position by name, failing with a schema error.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| {
            Error::schema(format!("unknown column '{}' in {}", name, self))
        })
    }

    /// Iterates over column names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Iterates over column types.
    pub fn types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.columns.iter().map(|c| c.data_type())
    }

    /// Returns a copy of this schema with every column nullable.
    pub fn to_nullable(&self) -> Schema {
        Schema {
            columns: self.columns.iter().map(|c| c.clone().nullable(true)).collect(),
        }
    }

    /// Checks a row against this schema: arity, value types and nullability.
    pub fn check_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.len() {
            return Err(Error::type_error(format!(
                "row has {} values, schema {} has {} columns",
                row.len(),
                self,
                self.len()
            )));
        }
        for (value, col) in row.values().iter().zip(&self.columns) {
            if value.is_null() {
                if !col.is_nullable() {
                    return Err(Error::type_error(format!(
                        "null value in non-nullable column '{}'",
                        col.name()
                    )));
                }
            } else if !value.conforms_to(col.data_type()) {
                return Err(Error::type_error(format!(
                    "value {} does not match type {} of column '{}'",
                    value,
                    col.data_type(),
                    col.name()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", col)?;
        }
        f.write_str(")")
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::schema("column name cannot be empty"));
    }
    Ok(())
}

/// Builder for schemas.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a nullable column.
    pub fn add_column(self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        self.push(Column::new(name, data_type))
    }

    /// Adds a non-nullable column.
    pub fn add_required(self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        self.push(Column::new(name, data_type).nullable(false))
    }

    fn push(mut self, column: Column) -> Result<Self> {
        check_name(column.name())?;
        if column.data_type() == DataType::Null {
            return Err(Error::type_error(format!(
                "column '{}' cannot have the null type",
                column.name()
            )));
        }
        column.data_type().validate()?;
        if self.columns.iter().any(|c| c.name() == column.name()) {
            return Err(Error::schema(format!(
                "column already exists: {}",
                column.name()
            )));
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        Schema {
            columns: self.columns,
        }
    }
}
