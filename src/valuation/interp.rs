//! Value functions over an inventory grid

use crate::storage::InventoryRange;

/// Overshoot past the grid ends that is put down to floating-point noise
const BOUNDARY_TOLERANCE: f64 = 1e-8;

/// Values sampled on one interval of the inventory space
#[derive(Debug, Clone)]
struct Segment {
    grid: Vec<f64>,
    values: Vec<f64>,
}

impl Segment {
    fn min(&self) -> f64 {
        self.grid[0]
    }

    fn max(&self) -> f64 {
        self.grid[self.grid.len() - 1]
    }

    fn value_at(&self, inventory: f64) -> f64 {
        let last = self.grid.len() - 1;
        debug_assert!(
            inventory >= self.grid[0] - BOUNDARY_TOLERANCE * (1.0 + self.grid[0].abs())
                && inventory <= self.grid[last] + BOUNDARY_TOLERANCE * (1.0 + self.grid[last].abs()),
            "inventory {} outside value function grid [{}, {}]",
            inventory,
            self.grid[0],
            self.grid[last]
        );

        if inventory <= self.grid[0] {
            return self.values[0];
        }
        if inventory >= self.grid[last] {
            return self.values[last];
        }

        // first index with grid > inventory; in 1..=last here
        let upper = self.grid.partition_point(|&g| g <= inventory);
        let lower = upper - 1;
        let (x0, x1) = (self.grid[lower], self.grid[upper]);
        let weight = (inventory - x0) / (x1 - x0);
        self.values[lower] + weight * (self.values[upper] - self.values[lower])
    }
}

/// Per-period value function over one or more disjoint inventory intervals,
/// linear between grid points and flat beyond each interval's ends
#[derive(Debug, Clone)]
pub struct ValueFunction {
    segments: Vec<Segment>,
}

impl ValueFunction {
    /// Single interval; `grid` must be non-empty, non-decreasing and the same
    /// length as `values`
    pub fn new(grid: Vec<f64>, values: Vec<f64>) -> Self {
        Self::from_segments(vec![(grid, values)])
    }

    /// One `(grid, values)` pair per interval, intervals ascending and disjoint
    pub fn from_segments(segments: Vec<(Vec<f64>, Vec<f64>)>) -> Self {
        debug_assert!(!segments.is_empty());
        let segments: Vec<Segment> = segments
            .into_iter()
            .map(|(grid, values)| {
                debug_assert!(!grid.is_empty());
                debug_assert_eq!(grid.len(), values.len());
                debug_assert!(grid.windows(2).all(|w| w[0] <= w[1]));
                Segment { grid, values }
            })
            .collect();
        debug_assert!(segments.windows(2).all(|w| w[0].max() < w[1].min()));
        Self { segments }
    }

    /// Covered inventory intervals, ascending
    pub fn intervals(&self) -> impl Iterator<Item = InventoryRange> + '_ {
        self.segments.iter().map(|s| InventoryRange::new(s.min(), s.max()))
    }

    /// Lowest covered inventory
    pub fn min_inventory(&self) -> f64 {
        self.segments[0].min()
    }

    /// Highest covered inventory
    pub fn max_inventory(&self) -> f64 {
        self.segments[self.segments.len() - 1].max()
    }

    /// Interpolated value at `inventory`, which must lie in a covered interval
    pub fn value_at(&self, inventory: f64) -> f64 {
        let index = self
            .segments
            .partition_point(|s| s.max() < inventory)
            .min(self.segments.len() - 1);
        let mut segment = &self.segments[index];
        if index > 0 && inventory < segment.min() {
            let below = &self.segments[index - 1];
            if inventory - below.max() < segment.min() - inventory {
                segment = below;
            }
        }
        segment.value_at(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolates_linearly_between_points() {
        let vf = ValueFunction::new(vec![0.0, 10.0, 20.0], vec![0.0, 100.0, 150.0]);
        assert_relative_eq!(vf.value_at(5.0), 50.0);
        assert_relative_eq!(vf.value_at(15.0), 125.0);
        assert_relative_eq!(vf.value_at(10.0), 100.0);
        assert_relative_eq!(vf.value_at(20.0), 150.0);
        assert_relative_eq!(vf.value_at(0.0), 0.0);
    }

    #[test]
    fn test_flat_beyond_bounds_within_noise() {
        let vf = ValueFunction::new(vec![0.0, 10.0], vec![3.0, 7.0]);
        assert_eq!(vf.value_at(-1e-12), 3.0);
        assert_eq!(vf.value_at(10.0 + 1e-12), 7.0);
    }

    #[test]
    fn test_degenerate_grid_returns_single_value() {
        let vf = ValueFunction::new(vec![50.0; 3], vec![12.0; 3]);
        assert_eq!(vf.value_at(50.0), 12.0);
        assert_eq!(vf.min_inventory(), vf.max_inventory());
    }

    #[test]
    fn test_disjoint_intervals_interpolate_separately() {
        let vf = ValueFunction::from_segments(vec![
            (vec![0.0, 10.0], vec![0.0, 10.0]),
            (vec![20.0, 30.0], vec![100.0, 200.0]),
        ]);
        let intervals: Vec<_> = vf.intervals().collect();
        assert_eq!(intervals, vec![InventoryRange::new(0.0, 10.0), InventoryRange::new(20.0, 30.0)]);
        assert_relative_eq!(vf.value_at(5.0), 5.0);
        assert_relative_eq!(vf.value_at(25.0), 150.0);
        assert_eq!(vf.value_at(10.0 + 1e-12), 10.0);
        assert_eq!(vf.value_at(20.0 - 1e-12), 100.0);
        assert_eq!(vf.max_inventory(), 30.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside value function grid")]
    fn test_overshoot_is_an_invariant_violation() {
        let vf = ValueFunction::new(vec![0.0, 10.0], vec![3.0, 7.0]);
        vf.value_at(10.5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside value function grid")]
    fn test_gap_between_intervals_is_an_invariant_violation() {
        let vf = ValueFunction::from_segments(vec![(vec![0.0, 10.0], vec![0.0; 2]), (vec![20.0, 30.0], vec![0.0; 2])]);
        vf.value_at(15.0);
    }
}
