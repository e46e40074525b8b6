//! Sort key definitions shared by Sort and Window.

use super::expr::Expr;
use core::fmt;

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Placement of nulls relative to non-null values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NullOrder {
    First,
    Last,
}

/// One ORDER BY key.
#[derive(Clone, Debug, PartialEq)]
pub struct SortKey {
    pub expr: Expr,
    pub order: SortOrder,
    /// Explicit null placement; `None` means nulls last for ascending and
    /// nulls first for descending keys.
    pub nulls: Option<NullOrder>,
}

impl SortKey {
    /// Creates an ascending key.
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Asc,
            nulls: None,
        }
    }

    /// Creates a descending key.
    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Desc,
            nulls: None,
        }
    }

    /// Places nulls before non-null values.
    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrder::First);
        self
    }

    /// Places nulls after non-null values.
    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrder::Last);
        self
    }

    /// The effective null placement.
    pub fn null_order(&self) -> NullOrder {
        match (self.nulls, self.order) {
            (Some(n), _) => n,
            (None, SortOrder::Asc) => NullOrder::Last,
            (None, SortOrder::Desc) => NullOrder::First,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.order {
            SortOrder::Asc => f.write_str(" ASC")?,
            SortOrder::Desc => f.write_str(" DESC")?,
        }
        match self.nulls {
            Some(NullOrder::First) => f.write_str(" NULLS FIRST"),
            Some(NullOrder::Last) => f.write_str(" NULLS LAST"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_default_null_order() {
        assert_eq!(SortKey::asc(Expr::col("a")).null_order(), NullOrder::Last);
        assert_eq!(SortKey::desc(Expr::col("a")).null_order(), NullOrder::First);
        assert_eq!(
            SortKey::desc(Expr::col("a")).nulls_last().null_order(),
            NullOrder::Last
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(SortKey::asc(Expr::col("a")).nulls_first().to_string(), "a ASC NULLS FIRST");
    }
}
