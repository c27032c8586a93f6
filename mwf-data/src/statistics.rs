//! Cross-member statistics.
//!
//! For each variable and timestep the valid values of every member of every
//! model are pooled and summarized. Percentiles use linear interpolation
//! between order statistics (the R-7 / numpy default), so
//! `min <= p10 <= p25 <= median <= p75 <= p90 <= max` always holds.

use log::debug;
use mwf_ensemble::{SeriesTable, Variable};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Samples in the trailing trend window.
pub const DEFAULT_TREND_WINDOW: usize = 3;

/// |rate| per step above which a trend is reported at all.
pub const TREND_STABLE_LIMIT: f64 = 0.5;

/// |rate| per step above which a trend is "rapid".
pub const TREND_RAPID_LIMIT: f64 = 2.0;

/// Direction of the ensemble mean over the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    RapidlyFalling,
    Falling,
    Stable,
    Rising,
    RapidlyRising,
}

impl Trend {
    /// Classify a per-step rate of change.
    pub fn from_rate(rate: f64) -> Trend {
        let magnitude = rate.abs();
        if magnitude <= TREND_STABLE_LIMIT {
            Trend::Stable
        } else if magnitude <= TREND_RAPID_LIMIT {
            if rate > 0.0 {
                Trend::Rising
            } else {
                Trend::Falling
            }
        } else if rate > 0.0 {
            Trend::RapidlyRising
        } else {
            Trend::RapidlyFalling
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::RapidlyFalling => "rapidly_falling",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
            Trend::Rising => "rising",
            Trend::RapidlyRising => "rapidly_rising",
        }
    }
}

/// Summary of all valid member values of one variable at one timestep.
///
/// With zero members every value is `None`; with a single member the
/// spread measures (std_dev, percentiles) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub p10: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
    pub member_count: usize,
    pub trend: Trend,
}

impl VariableStatistics {
    pub fn empty() -> Self {
        VariableStatistics {
            min: None,
            max: None,
            mean: None,
            median: None,
            std_dev: None,
            p10: None,
            p25: None,
            p75: None,
            p90: None,
            member_count: 0,
            trend: Trend::Stable,
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); needs at least two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (n); defined for any non-empty slice.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// `p`-th quantile (0..=1) of already sorted data, R-7 interpolation.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    let value = sorted[lo] + frac * (sorted[hi] - sorted[lo]);
    // keep rounding error from stepping past the upper order statistic
    Some(value.min(sorted[hi]))
}

/// Summarize one timestep's member values. Trend is left `Stable`;
/// [`assign_trends`] fills it in over the whole series.
pub fn summarize(values: &[f64]) -> VariableStatistics {
    if values.is_empty() {
        return VariableStatistics::empty();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let spread = sorted.len() >= 2;
    let q = |p: f64| {
        if spread {
            quantile_sorted(&sorted, p)
        } else {
            None
        }
    };

    VariableStatistics {
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: mean(&sorted),
        median: quantile_sorted(&sorted, 0.5),
        std_dev: sample_std_dev(&sorted),
        p10: q(0.10),
        p25: q(0.25),
        p75: q(0.75),
        p90: q(0.90),
        member_count: sorted.len(),
        trend: Trend::Stable,
    }
}

/// Label each timestep from the slope of the mean over a trailing window.
///
/// The first `window - 1` steps, and any step whose window endpoints have
/// no mean, stay `Stable`.
pub fn assign_trends(stats: &mut [VariableStatistics], window: usize) {
    let window = window.max(2);
    let means: Vec<Option<f64>> = stats.iter().map(|s| s.mean).collect();
    for (t, s) in stats.iter_mut().enumerate() {
        s.trend = if t + 1 < window {
            Trend::Stable
        } else {
            match (means[t + 1 - window], means[t]) {
                (Some(start), Some(end)) => Trend::from_rate((end - start) / (window - 1) as f64),
                _ => Trend::Stable,
            }
        };
    }
}

/// Statistics of one variable over the whole axis.
pub fn variable_statistics(
    table: &SeriesTable,
    variable: Variable,
    window: usize,
) -> Vec<VariableStatistics> {
    let mut stats: Vec<VariableStatistics> = (0..table.len())
        .map(|idx| summarize(&table.member_values(variable, idx)))
        .collect();
    assign_trends(&mut stats, window);
    stats
}

/// Statistics for every linear variable in the table, one rayon task per
/// variable. Direction variables are skipped; the wind resolver averages
/// them on the circle instead.
pub fn table_statistics(
    table: &SeriesTable,
    window: usize,
) -> BTreeMap<Variable, Vec<VariableStatistics>> {
    let variables: Vec<Variable> = table
        .variables()
        .into_iter()
        .filter(|v| !v.is_direction())
        .collect();
    debug!(
        "Computing statistics for {} variables over {} steps",
        variables.len(),
        table.len()
    );
    variables
        .par_iter()
        .map(|v| (*v, variable_statistics(table, *v, window)))
        .collect()
}
