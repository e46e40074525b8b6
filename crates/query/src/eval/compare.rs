//! Value comparison for predicates and sorting.

use super::evaluator::evaluate;
use crate::ast::TypedSortKey;
use alloc::vec::Vec;
use core::cmp::Ordering;
use quill_core::{Result, Row, Value};

/// SQL comparison of two values of the same type.
///
/// Returns `None` when either side is null or a NaN float. Sorting and
/// grouping use the total order of [`Value`] instead.
pub fn sql_compare(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() || is_nan(a) || is_nan(b) {
        return None;
    }
    Some(a.cmp(b))
}

fn is_nan(v: &Value) -> bool {
    match v {
        Value::Float32(f) => f.is_nan(),
        Value::Float64(f) => f.is_nan(),
        _ => false,
    }
}

/// Evaluates the sort keys of a row.
pub fn sort_key_values(keys: &[TypedSortKey], row: &Row) -> Result<Vec<Value>> {
    keys.iter().map(|k| evaluate(&k.expr, row)).collect()
}

/// Compares two precomputed key tuples under the given sort keys.
pub fn compare_keys(keys: &[TypedSortKey], a: &[Value], b: &[Value]) -> Ordering {
    for (i, key) in keys.iter().enumerate() {
        let ord = compare_key(key, a.get(i), b.get(i));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_key(key: &TypedSortKey, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a_null = a.map_or(true, Value::is_null);
    let b_null = b.map_or(true, Value::is_null);
    match (a_null, b_null) {
        (true, true) => Ordering::Equal,
        // Null placement does not flip with direction.
        (true, false) => {
            if key.nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if key.nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => match (a, b) {
            (Some(a), Some(b)) => {
                let ord = a.cmp(b);
                if key.descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            _ => Ordering::Equal,
        },
    }
}
