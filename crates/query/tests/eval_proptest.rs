//! Property-based tests for three-valued logic and the sort comparator.

use proptest::prelude::*;
use quill_core::schema::{Schema, SchemaBuilder};
use quill_core::{DataType, Row, Value};
use quill_query::ast::{Expr, SortKey};
use quill_query::eval::{compare_keys, evaluate, sort_key_values};
use quill_query::planner::{resolve_expr, resolve_sort_key};
use std::cmp::Ordering;

fn truth_values() -> [Value; 3] {
    [Value::Boolean(true), Value::Boolean(false), Value::Null]
}

fn eval_constant(expr: Expr) -> Value {
    let typed = resolve_expr(&expr, &Schema::empty()).unwrap();
    evaluate(&typed, &Row::default()).unwrap()
}

#[test]
fn test_and_or_are_commutative() {
    for a in truth_values() {
        for b in truth_values() {
            let lit = |v: &Value| Expr::literal(v.clone());
            assert_eq!(
                eval_constant(Expr::and(lit(&a), lit(&b))),
                eval_constant(Expr::and(lit(&b), lit(&a)))
            );
            assert_eq!(
                eval_constant(Expr::or(lit(&a), lit(&b))),
                eval_constant(Expr::or(lit(&b), lit(&a)))
            );
        }
    }
}

#[test]
fn test_de_morgan_holds_under_nulls() {
    for a in truth_values() {
        for b in truth_values() {
            let lit = |v: &Value| Expr::literal(v.clone());
            let lhs = Expr::not(Expr::and(lit(&a), lit(&b)));
            let rhs = Expr::or(Expr::not(lit(&a)), Expr::not(lit(&b)));
            assert_eq!(eval_constant(lhs), eval_constant(rhs));
        }
    }
}

fn schema() -> Schema {
    SchemaBuilder::new()
        .add_column("x", DataType::Int64)
        .unwrap()
        .add_column("y", DataType::Float64)
        .unwrap()
        .build()
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (prop::option::of(-20i64..20), prop::option::of(-5.0f64..5.0))
        .prop_map(|(x, y)| Row::new(vec![Value::from(x), Value::from(y)]))
}

fn key_strategy() -> impl Strategy<Value = SortKey> {
    (any::<bool>(), any::<bool>(), prop::option::of(any::<bool>())).prop_map(
        |(on_x, desc, nulls_first)| {
            let expr = Expr::col(if on_x { "x" } else { "y" });
            let key = if desc { SortKey::desc(expr) } else { SortKey::asc(expr) };
            match nulls_first {
                Some(true) => key.nulls_first(),
                Some(false) => key.nulls_last(),
                None => key,
            }
        },
    )
}

proptest! {
    /// Property: the comparator is antisymmetric and places nulls per key.
    #[test]
    fn comparator_is_antisymmetric(
        a in row_strategy(),
        b in row_strategy(),
        keys in prop::collection::vec(key_strategy(), 1..3),
    ) {
        let schema = schema();
        let keys: Vec<_> = keys.iter().map(|k| resolve_sort_key(k, &schema).unwrap()).collect();
        let ka = sort_key_values(&keys, &a).unwrap();
        let kb = sort_key_values(&keys, &b).unwrap();
        prop_assert_eq!(compare_keys(&keys, &ka, &kb), compare_keys(&keys, &kb, &ka).reverse());

        let first = &keys[0];
        if ka[0].is_null() && !kb[0].is_null() {
            let expected = if first.nulls_first { Ordering::Less } else { Ordering::Greater };
            prop_assert_eq!(compare_keys(&keys, &ka, &kb), expected);
        }
    }

    /// Property: sorting by the comparator is idempotent and stable.
    #[test]
    fn sorting_is_idempotent(
        rows in prop::collection::vec(row_strategy(), 0..40),
        keys in prop::collection::vec(key_strategy(), 1..3),
    ) {
        let schema = schema();
        let keys: Vec<_> = keys.iter().map(|k| resolve_sort_key(k, &schema).unwrap()).collect();
        let sort = |rows: Vec<Row>| {
            let mut keyed: Vec<(Vec<Value>, Row)> = rows
                .into_iter()
                .map(|r| (sort_key_values(&keys, &r).unwrap(), r))
                .collect();
            keyed.sort_by(|a, b| compare_keys(&keys, &a.0, &b.0));
            keyed.into_iter().map(|(_, r)| r).collect::<Vec<_>>()
        };
        let once = sort(rows);
        let twice = sort(once.clone());
        prop_assert_eq!(once, twice);
    }
}
