//! Inventory grid construction

use crate::error::{Result, ValuationError};

/// `num_points` evenly spaced inventory levels spanning `[min, max]`
///
/// The first point is exactly `min` and the last exactly `max`. When
/// `min == max` every point is equal.
pub fn inventory_grid(min: f64, max: f64, num_points: usize) -> Result<Vec<f64>> {
    if num_points < 2 {
        return Err(ValuationError::invalid(format!(
            "inventory grid needs at least 2 points, got {}",
            num_points
        )));
    }
    if !(max >= min) {
        return Err(ValuationError::invalid(format!(
            "inventory grid max {} is below min {}",
            max, min
        )));
    }

    let step = (max - min) / (num_points - 1) as f64;
    let mut grid: Vec<f64> = (0..num_points).map(|i| min + step * i as f64).collect();
    grid[num_points - 1] = max;
    Ok(grid)
}
