//! Reductions over a range of hourly steps.

use mwf_data::derived::ResolvedHour;
use mwf_data::statistics::mean;
use mwf_ensemble::{SeriesTable, Variable};
use std::ops::Range;

use crate::document::DailySnow;

/// Derived snowfall over `range`: each member's sum and largest hourly
/// value, averaged across members. Members with no valid step in the range
/// are left out.
pub fn snow_window(table: &SeriesTable, range: Range<usize>) -> DailySnow {
    let mut sums = Vec::new();
    let mut maxima = Vec::new();
    for (_, column) in table.all_columns(Variable::SnowDepth) {
        let valid: Vec<f64> = range.clone().filter_map(|idx| column.at(idx)).collect();
        if valid.is_empty() {
            continue;
        }
        sums.push(valid.iter().sum::<f64>());
        maxima.push(valid.iter().copied().fold(f64::MIN, f64::max));
    }
    DailySnow {
        total: mean(&sums),
        max_hourly: mean(&maxima),
    }
}

/// Strongest single-member wind in the slice. Alerts, ratings and key
/// concerns all read wind on this basis.
pub fn max_member_speed(resolved: &[ResolvedHour]) -> Option<f64> {
    resolved
        .iter()
        .filter_map(|r| r.wind.max_speed)
        .reduce(f64::max)
}

/// Index range of the first `hours` steps, clipped to `len`.
pub fn leading(len: usize, hours: usize) -> Range<usize> {
    0..hours.min(len)
}
