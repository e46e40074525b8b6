//! Physical query plan definitions.
//!
//! A physical plan is a logical plan with every expression resolved against
//! its input schema and every output schema computed. Backends receive
//! these operators and never see column names or untyped expressions.

use crate::ast::{AggregateFunc, JoinType, TypedExpr, TypedSortKey, WindowFrame, WindowFunc};
use crate::eval::Accumulator;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use quill_core::schema::Schema;
use quill_core::{DataType, Result, Row, Value};

/// Identifies a plan node in errors and logs. Ids are assigned in pre-order
/// and match `LogicalPlan::explain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub id: usize,
    pub operator: &'static str,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.operator)
    }
}

/// Backend table read.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanOp {
    pub table: String,
    pub schema: Schema,
}

/// Inline rows, already checked against `schema`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuesOp {
    pub rows: Vec<Row>,
    pub schema: Schema,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectOp {
    pub exprs: Vec<TypedExpr>,
    pub schema: Schema,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterOp {
    pub predicate: TypedExpr,
    pub schema: Schema,
}

/// Source of one join output column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutputColumn {
    Left(usize),
    Right(usize),
    /// Coalesce of the left and right values of join key `key`.
    Merged { key: usize },
}

/// Equi-join with resolved key positions.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinOp {
    pub kind: JoinType,
    pub left_keys: Vec<usize>,
    pub right_keys: Vec<usize>,
    /// Common type of each key pair; key values are compared in this type.
    pub key_types: Vec<DataType>,
    pub output: Vec<JoinOutputColumn>,
    pub schema: Schema,
}

impl JoinOp {
    /// Extracts the join key of a left row; `None` if any key is null.
    pub fn left_key(&self, row: &Row) -> Result<Option<Vec<Value>>> {
        extract_key(row, &self.left_keys, &self.key_types)
    }

    /// Extracts the join key of a right row; `None` if any key is null.
    pub fn right_key(&self, row: &Row) -> Result<Option<Vec<Value>>> {
        extract_key(row, &self.right_keys, &self.key_types)
    }

    /// Builds an output row from a matched pair or a null-padded side.
    pub fn output_row(&self, left: Option<&Row>, right: Option<&Row>) -> Result<Row> {
        let get = |row: Option<&Row>, i: usize| {
            row.and_then(|r| r.get(i)).cloned().unwrap_or(Value::Null)
        };
        let mut values = Vec::with_capacity(self.output.len());
        for column in &self.output {
            let value = match *column {
                JoinOutputColumn::Left(i) => get(left, i),
                JoinOutputColumn::Right(i) => get(right, i),
                JoinOutputColumn::Merged { key } => {
                    let l = get(left, self.left_keys[key]);
                    let v = if l.is_null() {
                        get(right, self.right_keys[key])
                    } else {
                        l
                    };
                    v.cast_to(self.key_types[key])?
                }
            };
            values.push(value);
        }
        Ok(Row::new(values))
    }
}

fn extract_key(row: &Row, indices: &[usize], types: &[DataType]) -> Result<Option<Vec<Value>>> {
    let mut key = Vec::with_capacity(indices.len());
    for (&i, &t) in indices.iter().zip(types) {
        match row.get(i) {
            None | Some(Value::Null) => return Ok(None),
            Some(v) => key.push(v.cast_to(t)?),
        }
    }
    Ok(Some(key))
}

/// A resolved aggregate call.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedAggregate {
    pub func: AggregateFunc,
    /// `None` for `count(*)`.
    pub arg: Option<TypedExpr>,
    pub output_type: DataType,
}

impl TypedAggregate {
    /// Creates a fresh accumulator for this call.
    pub fn accumulator(&self) -> Result<Accumulator> {
        Accumulator::new(self.func, self.arg.as_ref().map(|a| a.data_type))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateOp {
    pub group_by: Vec<TypedExpr>,
    pub aggregates: Vec<TypedAggregate>,
    pub schema: Schema,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortOp {
    pub keys: Vec<TypedSortKey>,
    pub schema: Schema,
}

/// A resolved window call. `frame` is always explicit; lag/lead defaults
/// are already cast to the argument type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedWindow {
    pub func: WindowFunc,
    pub arg: Option<TypedExpr>,
    pub partition_by: Vec<TypedExpr>,
    pub order_by: Vec<TypedSortKey>,
    pub frame: WindowFrame,
    pub data_type: DataType,
}

impl TypedWindow {
    /// Creates an accumulator for aggregate window functions.
    pub fn accumulator(&self) -> Option<Result<Accumulator>> {
        match self.func {
            WindowFunc::Aggregate(func) => Some(Accumulator::new(
                func,
                self.arg.as_ref().map(|a| a.data_type),
            )),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowOp {
    pub calls: Vec<TypedWindow>,
    pub schema: Schema,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionOp {
    pub distinct: bool,
    pub schema: Schema,
}

impl UnionOp {
    /// Casts a row from either input to the union's column types.
    pub fn conform(&self, row: Row) -> Result<Row> {
        let mut values = row.into_values();
        for (value, column) in values.iter_mut().zip(self.schema.columns()) {
            if !value.is_null() && value.data_type() != column.data_type() {
                *value = value.cast_to(column.data_type())?;
            }
        }
        Ok(Row::new(values))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LimitOp {
    pub n: usize,
    pub schema: Schema,
}

/// A resolved operator.
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicalOp {
    Scan(ScanOp),
    Values(ValuesOp),
    Project(ProjectOp),
    Filter(FilterOp),
    Join(JoinOp),
    Aggregate(AggregateOp),
    Sort(SortOp),
    Window(WindowOp),
    Union(UnionOp),
    Limit(LimitOp),
}

impl PhysicalOp {
    /// The operator's output schema.
    pub fn schema(&self) -> &Schema {
        match self {
            PhysicalOp::Scan(op) => &op.schema,
            PhysicalOp::Values(op) => &op.schema,
            PhysicalOp::Project(op) => &op.schema,
            PhysicalOp::Filter(op) => &op.schema,
            PhysicalOp::Join(op) => &op.schema,
            PhysicalOp::Aggregate(op) => &op.schema,
            PhysicalOp::Sort(op) => &op.schema,
            PhysicalOp::Window(op) => &op.schema,
            PhysicalOp::Union(op) => &op.schema,
            PhysicalOp::Limit(op) => &op.schema,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PhysicalOp::Scan(_) => "Scan",
            PhysicalOp::Values(_) => "Values",
            PhysicalOp::Project(_) => "Project",
            PhysicalOp::Filter(_) => "Filter",
            PhysicalOp::Join(_) => "Join",
            PhysicalOp::Aggregate(_) => "Aggregate",
            PhysicalOp::Sort(_) => "Sort",
            PhysicalOp::Window(_) => "Window",
            PhysicalOp::Union(_) => "Union",
            PhysicalOp::Limit(_) => "Limit",
        }
    }
}

/// Physical query plan node.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalPlan {
    pub id: usize,
    pub op: PhysicalOp,
    /// Inputs, left before right.
    pub inputs: Vec<PhysicalPlan>,
}

impl PhysicalPlan {
    /// The node's output schema.
    pub fn schema(&self) -> &Schema {
        self.op.schema()
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            id: self.id,
            operator: self.op.name(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(|i| i.node_count()).sum::<usize>()
    }
}
