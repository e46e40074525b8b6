//! Aggregate and window call definitions.

use super::expr::Expr;
use super::sort::SortKey;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use quill_core::{Error, Result, Value};

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    CountDistinct,
}

impl AggregateFunc {
    /// Lowercase SQL name.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::CountDistinct => "count_distinct",
        }
    }
}

/// An aggregate function applied to an optional argument.
///
/// `Count` without an argument is `count(*)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateCall {
    pub func: AggregateFunc,
    pub arg: Option<Expr>,
    pub alias: Option<String>,
}

impl AggregateCall {
    /// Creates an aggregate call.
    pub fn new(func: AggregateFunc, arg: Option<Expr>) -> Self {
        Self {
            func,
            arg,
            alias: None,
        }
    }

    /// Creates a COUNT(*) aggregate.
    pub fn count_star() -> Self {
        Self::new(AggregateFunc::Count, None)
    }

    /// Creates a COUNT(expr) aggregate.
    pub fn count(expr: Expr) -> Self {
        Self::new(AggregateFunc::Count, Some(expr))
    }

    /// Creates a SUM aggregate.
    pub fn sum(expr: Expr) -> Self {
        Self::new(AggregateFunc::Sum, Some(expr))
    }

    /// Creates an AVG aggregate.
    pub fn avg(expr: Expr) -> Self {
        Self::new(AggregateFunc::Avg, Some(expr))
    }

    /// Creates a MIN aggregate.
    pub fn min(expr: Expr) -> Self {
        Self::new(AggregateFunc::Min, Some(expr))
    }

    /// Creates a MAX aggregate.
    pub fn max(expr: Expr) -> Self {
        Self::new(AggregateFunc::Max, Some(expr))
    }

    /// Creates a COUNT(DISTINCT expr) aggregate.
    pub fn count_distinct(expr: Expr) -> Self {
        Self::new(AggregateFunc::CountDistinct, Some(expr))
    }

    /// Names the aggregate's output column.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// The output column name.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}", CallDisplay(self.func.name(), self.arg.as_ref())),
        }
    }
}

struct CallDisplay<'a>(&'a str, Option<&'a Expr>);

impl fmt::Display for CallDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            Some(arg) => write!(f, "{}({})", self.0, arg),
            None if self.0 == "count" => write!(f, "{}(*)", self.0),
            None => write!(f, "{}()", self.0),
        }
    }
}

/// Window functions.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowFunc {
    RowNumber,
    Rank,
    DenseRank,
    /// Value of the argument `offset` rows before the current row.
    Lag { offset: i64, default: Option<Value> },
    /// Value of the argument `offset` rows after the current row.
    Lead { offset: i64, default: Option<Value> },
    /// Any aggregate evaluated over the frame.
    Aggregate(AggregateFunc),
}

impl WindowFunc {
    /// Lowercase SQL name.
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunc::RowNumber => "row_number",
            WindowFunc::Rank => "rank",
            WindowFunc::DenseRank => "dense_rank",
            WindowFunc::Lag { .. } => "lag",
            WindowFunc::Lead { .. } => "lead",
            WindowFunc::Aggregate(func) => func.name(),
        }
    }

    /// Returns true for functions whose result depends on the frame.
    pub fn uses_frame(&self) -> bool {
        matches!(self, WindowFunc::Aggregate(_))
    }
}

/// Frame units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameUnits {
    /// Physical offsets in rows.
    Rows,
    /// Logical offsets over the ORDER BY value; `CurrentRow` includes peers.
    Range,
}

/// One end of a window frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    /// Position relative to the current row, with the unbounded ends at the
    /// extremes.
    fn position(&self) -> i128 {
        match self {
            FrameBound::UnboundedPreceding => i128::MIN,
            FrameBound::Preceding(n) => -(*n as i128),
            FrameBound::CurrentRow => 0,
            FrameBound::Following(n) => *n as i128,
            FrameBound::UnboundedFollowing => i128::MAX,
        }
    }

    /// Returns true for `n PRECEDING` and `n FOLLOWING`.
    pub fn is_offset(&self) -> bool {
        matches!(self, FrameBound::Preceding(_) | FrameBound::Following(_))
    }
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{} PRECEDING", n),
            FrameBound::CurrentRow => f.write_str("CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{} FOLLOWING", n),
            FrameBound::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
        }
    }
}

/// Window frame: `units BETWEEN start AND end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl WindowFrame {
    /// Creates a ROWS frame.
    pub fn rows(start: FrameBound, end: FrameBound) -> Self {
        Self {
            units: FrameUnits::Rows,
            start,
            end,
        }
    }

    /// Creates a RANGE frame.
    pub fn range(start: FrameBound, end: FrameBound) -> Self {
        Self {
            units: FrameUnits::Range,
            start,
            end,
        }
    }

    /// The frame used when none is given: running from the partition start
    /// to the current row when ordered, the whole partition otherwise.
    pub fn default_for(ordered: bool) -> Self {
        if ordered {
            Self::rows(FrameBound::UnboundedPreceding, FrameBound::CurrentRow)
        } else {
            Self::rows(FrameBound::UnboundedPreceding, FrameBound::UnboundedFollowing)
        }
    }

    /// Rejects frames whose start lies after their end.
    pub fn validate(&self) -> Result<()> {
        if self.start == FrameBound::UnboundedFollowing {
            return Err(Error::config("frame cannot start at UNBOUNDED FOLLOWING"));
        }
        if self.end == FrameBound::UnboundedPreceding {
            return Err(Error::config("frame cannot end at UNBOUNDED PRECEDING"));
        }
        if self.start.position() > self.end.position() {
            return Err(Error::config(format!(
                "frame start {} lies after frame end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Returns true if either bound is a numeric offset.
    pub fn has_offsets(&self) -> bool {
        self.start.is_offset() || self.end.is_offset()
    }
}

impl fmt::Display for WindowFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = match self.units {
            FrameUnits::Rows => "ROWS",
            FrameUnits::Range => "RANGE",
        };
        write!(f, "{} BETWEEN {} AND {}", units, self.start, self.end)
    }
}

/// A window function call with its partitioning, ordering and frame.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowCall {
    pub func: WindowFunc,
    pub arg: Option<Box<Expr>>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<SortKey>,
    pub frame: Option<WindowFrame>,
    pub alias: Option<String>,
}

impl WindowCall {
    /// Creates a window call with no partitioning, ordering or frame.
    pub fn new(func: WindowFunc, arg: Option<Expr>) -> Self {
        Self {
            func,
            arg: arg.map(Box::new),
            partition_by: Vec::new(),
            order_by: Vec::new(),
            frame: None,
            alias: None,
        }
    }

    /// Creates a ROW_NUMBER() call.
    pub fn row_number() -> Self {
        Self::new(WindowFunc::RowNumber, None)
    }

    /// Creates a RANK() call.
    pub fn rank() -> Self {
        Self::new(WindowFunc::Rank, None)
    }

    /// Creates a DENSE_RANK() call.
    pub fn dense_rank() -> Self {
        Self::new(WindowFunc::DenseRank, None)
    }

    /// Creates a LAG(expr, offset) call.
    pub fn lag(expr: Expr, offset: i64) -> Self {
        Self::new(
            WindowFunc::Lag {
                offset,
                default: None,
            },
            Some(expr),
        )
    }

    /// Creates a LEAD(expr, offset) call.
    pub fn lead(expr: Expr, offset: i64) -> Self {
        Self::new(
            WindowFunc::Lead {
                offset,
                default: None,
            },
            Some(expr),
        )
    }

    /// Creates an aggregate window call.
    pub fn aggregate(call: AggregateCall) -> Self {
        let mut w = Self::new(WindowFunc::Aggregate(call.func), call.arg);
        w.alias = call.alias;
        w
    }

    /// Sets the value LAG/LEAD return when the offset row does not exist.
    pub fn with_default(mut self, value: Value) -> Self {
        if let WindowFunc::Lag { default, .. } | WindowFunc::Lead { default, .. } = &mut self.func
        {
            *default = Some(value);
        }
        self
    }

    /// Sets the PARTITION BY expressions.
    pub fn partition_by(mut self, exprs: Vec<Expr>) -> Self {
        self.partition_by = exprs;
        self
    }

    /// Sets the ORDER BY keys.
    pub fn order_by(mut self, keys: Vec<SortKey>) -> Self {
        self.order_by = keys;
        self
    }

    /// Sets an explicit frame.
    pub fn frame(mut self, frame: WindowFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Names the call's output column.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// The output column name.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}", CallDisplay(self.func.name(), self.arg.as_deref())),
        }
    }
}
