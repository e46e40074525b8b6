//! Join kinds.

use core::fmt;

/// Join type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    /// Left rows with at least one match; left columns only.
    Semi,
    /// Left rows with no match; left columns only.
    Anti,
}

impl JoinType {
    /// Returns true if unmatched left rows are emitted null-padded.
    pub fn preserves_left(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Returns true if unmatched right rows are emitted null-padded.
    pub fn preserves_right(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }

    /// Returns true if the output carries right-side columns.
    pub fn emits_right(&self) -> bool {
        !matches!(self, JoinType::Semi | JoinType::Anti)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Semi => "semi",
            JoinType::Anti => "anti",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
