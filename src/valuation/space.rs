//! Feasible inventory space per period
//!
//! A period's grid only needs to cover inventories that are both reachable
//! from the starting inventory and able to reach the terminal inventory
//! bounds. The space is the intersection of the storage's physical bounds
//! with a backward pass (can still meet the end) and a forward pass
//! (reachable from the start).
//!
//! Each period's space is a sorted list of disjoint closed intervals. A rate
//! ratchet can split it: a level just below the ratchet may withdraw too
//! slowly to empty in time while the faster level above it can.
//!
//! Between the storage's inventory breakpoints the reach functions
//! `v - loss(v) + rate(v)` are non-decreasing, so each boundary is found by
//! bisection inside one segment. The bound kept is always the side on which
//! the exact predicate holds.

use crate::calendar::Period;
use crate::error::{Result, ValuationError};
use crate::storage::{InventoryRange, Storage};

/// Relative slack when comparing inventories against bounds
pub(crate) const FEASIBILITY_TOLERANCE: f64 = 1e-9;

const MAX_BISECTIONS: usize = 200;

fn slack(scale: f64) -> f64 {
    FEASIBILITY_TOLERANCE * (1.0 + scale.abs())
}

/// Largest float below a finite `x`
fn just_below(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x < 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}

fn physical_range<S: Storage + ?Sized>(storage: &S, period: Period) -> Result<InventoryRange> {
    let range = storage.inventory_range(period);
    if !(range.max >= range.min) {
        return Err(ValuationError::invalid_at(
            format!("max inventory {} is below min inventory {}", range.max, range.min),
            period,
            None,
        ));
    }
    Ok(range)
}

/// Lowest and highest inventory reachable in the next period from `inventory`
fn reach<S: Storage + ?Sized>(storage: &S, period: Period, inventory: f64) -> InventoryRange {
    let retained = inventory - storage.inventory_loss(period, inventory);
    let rates = storage.inject_withdraw_range(period, inventory);
    InventoryRange::new(retained + rates.min, retained + rates.max)
}

/// Closed pieces of `physical` on which the reach functions are continuous
fn segments<S: Storage + ?Sized>(storage: &S, period: Period, physical: InventoryRange) -> Vec<InventoryRange> {
    let mut edges: Vec<f64> = storage
        .inventory_breakpoints(period)
        .into_iter()
        .filter(|&b| b > physical.min && b < physical.max)
        .collect();
    edges.sort_by(f64::total_cmp);
    edges.dedup();

    let mut segments = Vec::with_capacity(edges.len() + 1);
    let mut lower = physical.min;
    for edge in edges {
        segments.push(InventoryRange::new(lower, just_below(edge)));
        lower = edge;
    }
    segments.push(InventoryRange::new(lower, physical.max));
    segments
}

/// Last point from `holds` (true at `a`) towards `b` (false) where it holds
fn bisect(mut a: f64, mut b: f64, holds: impl Fn(f64) -> bool) -> f64 {
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (a + b);
        if mid == a || mid == b || (b - a).abs() <= f64::EPSILON * (1.0 + a.abs().max(b.abs())) {
            break;
        }
        if holds(mid) {
            a = mid;
        } else {
            b = mid;
        }
    }
    a
}

/// Inventories in `segment` from which `target` can be reached
fn reaching<S: Storage + ?Sized>(
    storage: &S,
    period: Period,
    segment: InventoryRange,
    target: InventoryRange,
) -> Option<InventoryRange> {
    let low_enough = |v: f64| reach(storage, period, v).min <= target.max;
    let high_enough = |v: f64| reach(storage, period, v).max >= target.min;

    let upper = if low_enough(segment.max) {
        segment.max
    } else if low_enough(segment.min) {
        bisect(segment.min, segment.max, low_enough)
    } else {
        return None;
    };
    let lower = if high_enough(segment.min) {
        segment.min
    } else if high_enough(segment.max) {
        bisect(segment.max, segment.min, high_enough)
    } else {
        return None;
    };

    if lower <= upper {
        Some(InventoryRange::new(lower, upper))
    } else if lower - upper <= slack(upper) {
        // single feasible level that bisection brackets without hitting
        let point = 0.5 * (lower + upper);
        Some(InventoryRange::new(point, point))
    } else {
        None
    }
}

/// Sort, then join intervals that overlap or touch within tolerance
fn merge(mut ranges: Vec<InventoryRange>) -> Vec<InventoryRange> {
    ranges.sort_by(|a, b| a.min.total_cmp(&b.min));
    let mut merged: Vec<InventoryRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.min <= last.max + slack(last.max) => last.max = last.max.max(range.max),
            _ => merged.push(range),
        }
    }
    merged
}

/// Intersection of two sorted interval lists
fn intersect(a: &[InventoryRange], b: &[InventoryRange]) -> Vec<InventoryRange> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let lower = a[i].min.max(b[j].min);
        let upper = a[i].max.min(b[j].max);
        if lower <= upper {
            out.push(InventoryRange::new(lower, upper));
        } else if lower - upper <= slack(upper) {
            out.push(InventoryRange::new(upper, upper));
        }
        if a[i].max < b[j].max {
            i += 1;
        } else {
            j += 1;
        }
    }
    merge(out)
}

fn describe(ranges: &[InventoryRange]) -> String {
    ranges
        .iter()
        .map(|r| format!("[{}, {}]", r.min, r.max))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Feasible intervals for periods `first..=storage.end()`, index 0 being `first`
pub(crate) fn inventory_space<S: Storage + ?Sized>(
    storage: &S,
    first: Period,
    starting_inventory: f64,
) -> Result<Vec<Vec<InventoryRange>>> {
    let end = storage.end();
    let num_periods = end.periods_since(first).max(0) as usize;

    // Backward: inventories from which the terminal bounds stay reachable
    let mut backward = vec![Vec::new(); num_periods + 1];
    backward[num_periods] = vec![physical_range(storage, end)?];
    for i in (0..num_periods).rev() {
        let period = first.offset(i as i64);
        let physical = physical_range(storage, period)?;

        let mut pieces = Vec::new();
        for segment in segments(storage, period, physical) {
            for &target in &backward[i + 1] {
                pieces.extend(reaching(storage, period, segment, target));
            }
        }
        if pieces.is_empty() {
            return Err(ValuationError::invalid_at(
                format!(
                    "no inventory level in [{}, {}] can reach the next period's feasible inventory {}",
                    physical.min,
                    physical.max,
                    describe(&backward[i + 1])
                ),
                period,
                None,
            ));
        }
        backward[i] = merge(pieces);
    }

    let start = backward[0]
        .iter()
        .find(|range| range.contains(starting_inventory, slack(starting_inventory)))
        .map(|range| starting_inventory.clamp(range.min, range.max))
        .ok_or_else(|| {
            ValuationError::invalid_at(
                format!("starting inventory outside feasible inventory {}", describe(&backward[0])),
                first,
                Some(starting_inventory),
            )
        })?;

    // Forward: clip to what the starting inventory can actually reach
    let mut space = Vec::with_capacity(num_periods + 1);
    space.push(vec![InventoryRange::new(start, start)]);
    for i in 0..num_periods {
        let period = first.offset(i as i64);
        let segments = segments(storage, period, physical_range(storage, period)?);

        let mut images = Vec::new();
        for piece in &space[i] {
            for segment in &segments {
                let lower = piece.min.max(segment.min);
                let upper = piece.max.min(segment.max);
                if lower <= upper {
                    images.push(InventoryRange::new(
                        reach(storage, period, lower).min,
                        reach(storage, period, upper).max,
                    ));
                }
            }
        }
        let images = merge(images);

        let reachable = intersect(&images, &backward[i + 1]);
        if reachable.is_empty() {
            return Err(ValuationError::invalid_at(
                format!(
                    "inventory reachable from the start {} misses the feasible inventory {}",
                    describe(&images),
                    describe(&backward[i + 1])
                ),
                period.next(),
                None,
            ));
        }
        space.push(reachable);
    }

    Ok(space)
}
