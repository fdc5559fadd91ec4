//! Pre-flight progress and cost estimation

use crate::config::CostConfig;

/// Remaining work for a grid, with its expected provider cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInfo {
    pub total_points: usize,
    pub processed_points: usize,
    pub remaining_points: usize,
    pub estimated_calls: f64,
    pub estimated_cost: f64,
}

impl GridInfo {
    /// Share of the grid already processed, in percent
    pub fn percent_complete(&self) -> f64 {
        if self.total_points == 0 {
            return 100.0;
        }
        self.processed_points as f64 / self.total_points as f64 * 100.0
    }
}

/// Estimates the calls and cost needed to finish a grid
///
/// `processed` is clamped to `total`.
pub fn estimate(total: usize, processed: usize, cost: &CostConfig) -> GridInfo {
    let processed = processed.min(total);
    let remaining = total - processed;
    let estimated_calls = remaining as f64 * cost.avg_pages_per_point;
    let estimated_cost = estimated_calls / 1000.0 * cost.price_per_1000_calls;

    GridInfo {
        total_points: total,
        processed_points: processed,
        remaining_points: remaining,
        estimated_calls,
        estimated_cost,
    }
}

/// Prints the estimate to stdout
pub fn print_grid_info(info: &GridInfo) {
    println!("Grid Points:");
    println!("  Total:     {}", info.total_points);
    println!(
        "  Processed: {} ({:.1}%)",
        info.processed_points,
        info.percent_complete()
    );
    println!("  Remaining: {}", info.remaining_points);
    println!();
    println!("Estimate:");
    println!("  Provider calls: ~{:.0}", info.estimated_calls);
    println!("  Cost:           ~${:.2}", info.estimated_cost);
}
