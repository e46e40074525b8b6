//! Expression evaluation, aggregate accumulators and sort comparison.

mod accumulator;
mod compare;
mod evaluator;

pub use accumulator::{aggregate_output_type, Accumulator};
pub use compare::{compare_keys, sort_key_values, sql_compare};
pub use evaluator::{evaluate, evaluate_predicate, evaluate_row};
