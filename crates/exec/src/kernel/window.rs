//! Window function kernel.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::mem;
use hashbrown::HashMap;
use quill_core::{Error, Result, Row, Value};
use quill_query::ast::{FrameBound, FrameUnits, WindowFrame, WindowFunc};
use quill_query::eval::{compare_keys, evaluate, sort_key_values};
use quill_query::planner::{TypedWindow, WindowOp};

/// Appends one column per window call. Output rows keep input order.
pub struct WindowExecutor<'a> {
    op: &'a WindowOp,
    backend: &'a str,
}

/// One partition sorted by the call's order keys: (order key, input position).
type SortedPartition = Vec<(Vec<Value>, usize)>;

impl<'a> WindowExecutor<'a> {
    /// `backend` names the caller in unsupported-feature errors.
    pub fn new(op: &'a WindowOp, backend: &'a str) -> Self {
        Self { op, backend }
    }

    /// Rejects frames the kernel cannot evaluate.
    pub fn check_frames(&self) -> Result<()> {
        for call in &self.op.calls {
            if call.func.uses_frame()
                && call.frame.units == FrameUnits::Range
                && call.frame.has_offsets()
            {
                return Err(Error::unsupported(
                    self.backend,
                    alloc::format!("{} frame", call.frame),
                ));
            }
        }
        Ok(())
    }

    pub fn execute(&self, input: Vec<Row>) -> Result<Vec<Row>> {
        self.check_frames()?;
        let mut columns = Vec::with_capacity(self.op.calls.len());
        for call in &self.op.calls {
            columns.push(evaluate_call(call, &input)?);
        }
        let mut out = Vec::with_capacity(input.len());
        for (i, row) in input.into_iter().enumerate() {
            let mut values = row.into_values();
            for column in columns.iter_mut() {
                values.push(mem::replace(&mut column[i], Value::Null));
            }
            out.push(Row::new(values));
        }
        Ok(out)
    }
}

/// Computes one call's value for every input row, indexed by input position.
fn evaluate_call(call: &TypedWindow, rows: &[Row]) -> Result<Vec<Value>> {
    let mut result = vec![Value::Null; rows.len()];
    for partition in partitions(call, rows)? {
        let peers = peer_ranges(call, &partition);
        match &call.func {
            WindowFunc::RowNumber => {
                for (pos, (_, idx)) in partition.iter().enumerate() {
                    result[*idx] = Value::Int64(pos as i64 + 1);
                }
            }
            WindowFunc::Rank => {
                for (pos, (_, idx)) in partition.iter().enumerate() {
                    result[*idx] = Value::Int64(peers[pos].0 as i64 + 1);
                }
            }
            WindowFunc::DenseRank => {
                let mut rank = 0i64;
                for (pos, (_, idx)) in partition.iter().enumerate() {
                    if peers[pos].0 == pos {
                        rank += 1;
                    }
                    result[*idx] = Value::Int64(rank);
                }
            }
            WindowFunc::Lag { offset, default } | WindowFunc::Lead { offset, default } => {
                let lead = matches!(call.func, WindowFunc::Lead { .. });
                let args = arguments(call, rows, &partition)?;
                let offset = usize::try_from(*offset).unwrap_or(usize::MAX);
                for (pos, (_, idx)) in partition.iter().enumerate() {
                    let target = if lead {
                        pos.checked_add(offset).filter(|t| *t < args.len())
                    } else {
                        pos.checked_sub(offset)
                    };
                    result[*idx] = match target {
                        Some(t) => args[t].clone(),
                        None => default.clone().unwrap_or(Value::Null),
                    };
                }
            }
            WindowFunc::Aggregate(_) => {
                let args = arguments(call, rows, &partition)?;
                let values = frame_aggregate(call, &args, &peers)?;
                for ((_, idx), value) in partition.iter().zip(values) {
                    result[*idx] = value;
                }
            }
        }
    }
    Ok(result)
}

/// Splits rows by partition key in first-seen order, then stably sorts each
/// partition by the order keys.
fn partitions(call: &TypedWindow, rows: &[Row]) -> Result<Vec<SortedPartition>> {
    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut parts: Vec<SortedPartition> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let key = call
            .partition_by
            .iter()
            .map(|e| evaluate(e, row))
            .collect::<Result<Vec<_>>>()?;
        let order = sort_key_values(&call.order_by, row)?;
        let slot = *index.entry(key).or_insert_with(|| {
            parts.push(Vec::new());
            parts.len() - 1
        });
        parts[slot].push((order, i));
    }
    for part in parts.iter_mut() {
        part.sort_by(|a, b| compare_keys(&call.order_by, &a.0, &b.0));
    }
    Ok(parts)
}

/// For each position, the half-open range of its peer group.
fn peer_ranges(call: &TypedWindow, partition: &SortedPartition) -> Vec<(usize, usize)> {
    let mut ranges = vec![(0, 0); partition.len()];
    let mut start = 0;
    for pos in 1..=partition.len() {
        let boundary = pos == partition.len()
            || compare_keys(&call.order_by, &partition[start].0, &partition[pos].0)
                != Ordering::Equal;
        if boundary {
            for range in &mut ranges[start..pos] {
                *range = (start, pos);
            }
            start = pos;
        }
    }
    ranges
}

/// Evaluates the call's argument in partition order; `Null` for `count(*)`.
fn arguments(call: &TypedWindow, rows: &[Row], partition: &SortedPartition) -> Result<Vec<Value>> {
    partition
        .iter()
        .map(|(_, idx)| match &call.arg {
            Some(arg) => evaluate(arg, &rows[*idx]),
            None => Ok(Value::Null),
        })
        .collect()
}

/// Half-open frame of the row at `pos`.
fn frame_range(frame: &WindowFrame, pos: usize, len: usize, peers: (usize, usize)) -> (usize, usize) {
    let n = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);
    let range = frame.units == FrameUnits::Range;
    let start = match frame.start {
        FrameBound::UnboundedPreceding => 0,
        FrameBound::Preceding(k) => pos.saturating_sub(n(k)),
        FrameBound::CurrentRow if range => peers.0,
        FrameBound::CurrentRow => pos,
        FrameBound::Following(k) => pos.saturating_add(n(k)).min(len),
        FrameBound::UnboundedFollowing => len,
    };
    let end = match frame.end {
        FrameBound::UnboundedPreceding => 0,
        FrameBound::Preceding(k) => (pos + 1).saturating_sub(n(k)),
        FrameBound::CurrentRow if range => peers.1,
        FrameBound::CurrentRow => pos + 1,
        FrameBound::Following(k) => pos.saturating_add(n(k)).saturating_add(1).min(len),
        FrameBound::UnboundedFollowing => len,
    };
    (start, end.max(start))
}

fn frame_aggregate(call: &TypedWindow, args: &[Value], peers: &[(usize, usize)]) -> Result<Vec<Value>> {
    let fresh = || call.accumulator().unwrap_or_else(|| {
        Err(Error::type_error(alloc::format!("{} is not an aggregate", call.func.name())))
    });
    let mut out = Vec::with_capacity(args.len());

    // Frames anchored at the partition start only grow, so one running
    // accumulator serves every row.
    if call.frame.start == FrameBound::UnboundedPreceding {
        let mut running = fresh()?;
        let mut consumed = 0;
        for pos in 0..args.len() {
            let (_, end) = frame_range(&call.frame, pos, args.len(), peers[pos]);
            while consumed < end {
                running.update(&args[consumed])?;
                consumed += 1;
            }
            out.push(running.clone().finish()?);
        }
        return Ok(out);
    }

    for pos in 0..args.len() {
        let (start, end) = frame_range(&call.frame, pos, args.len(), peers[pos]);
        let mut acc = fresh()?;
        for value in &args[start..end] {
            acc.update(value)?;
        }
        out.push(acc.finish()?);
    }
    Ok(out)
}
