//! Probability of threshold events across ensemble members.
//!
//! The probability at a timestep is the share of members with valid data
//! that satisfy the event's predicate. No-data members count in neither
//! numerator nor denominator; with no valid members the result is `None`.

use mwf_ensemble::{SeriesTable, Variable};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::derived::wind_members;

/// Built-in events reported for every hourly step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    PrecipitationMeasurable,
    PrecipitationHeavy,
    PrecipitationVeryHeavy,
    SnowPresent,
    SnowOver5cm,
    SnowOver10cm,
    Freezing,
    HardFreeze,
    WindOver25kmh,
    WindOver40kmh,
    WindOver60kmh,
}

/// Member values an event is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Variable(Variable),
    /// Whatever level the wind resolver picks at that step.
    ResolvedWind,
}

impl Event {
    pub const ALL: [Event; 11] = [
        Event::PrecipitationMeasurable,
        Event::PrecipitationHeavy,
        Event::PrecipitationVeryHeavy,
        Event::SnowPresent,
        Event::SnowOver5cm,
        Event::SnowOver10cm,
        Event::Freezing,
        Event::HardFreeze,
        Event::WindOver25kmh,
        Event::WindOver40kmh,
        Event::WindOver60kmh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PrecipitationMeasurable => "precipitation_measurable",
            Event::PrecipitationHeavy => "precipitation_heavy",
            Event::PrecipitationVeryHeavy => "precipitation_very_heavy",
            Event::SnowPresent => "snow_present",
            Event::SnowOver5cm => "snow_over_5cm",
            Event::SnowOver10cm => "snow_over_10cm",
            Event::Freezing => "freezing",
            Event::HardFreeze => "hard_freeze",
            Event::WindOver25kmh => "wind_over_25kmh",
            Event::WindOver40kmh => "wind_over_40kmh",
            Event::WindOver60kmh => "wind_over_60kmh",
        }
    }

    pub fn source(&self) -> EventSource {
        match self {
            Event::PrecipitationMeasurable
            | Event::PrecipitationHeavy
            | Event::PrecipitationVeryHeavy => EventSource::Variable(Variable::Precipitation),
            Event::SnowPresent | Event::SnowOver5cm | Event::SnowOver10cm => {
                EventSource::Variable(Variable::SnowDepth)
            }
            Event::Freezing | Event::HardFreeze => EventSource::Variable(Variable::Temperature2m),
            Event::WindOver25kmh | Event::WindOver40kmh | Event::WindOver60kmh => {
                EventSource::ResolvedWind
            }
        }
    }

    pub fn test(&self, value: f64) -> bool {
        match self {
            Event::PrecipitationMeasurable => value > 0.1,
            Event::PrecipitationHeavy => value > 5.0,
            Event::PrecipitationVeryHeavy => value > 10.0,
            Event::SnowPresent => value > 0.1,
            Event::SnowOver5cm => value > 5.0,
            Event::SnowOver10cm => value > 10.0,
            Event::Freezing => value <= 0.0,
            Event::HardFreeze => value < -5.0,
            Event::WindOver25kmh => value > 25.0,
            Event::WindOver40kmh => value > 40.0,
            Event::WindOver60kmh => value > 60.0,
        }
    }
}

/// Share of `values` satisfying `predicate`.
pub fn probability_of<F>(values: &[f64], predicate: F) -> Option<f64>
where
    F: Fn(f64) -> bool,
{
    if values.is_empty() {
        return None;
    }
    let hits = values.iter().filter(|v| predicate(**v)).count();
    Some(hits as f64 / values.len() as f64)
}

/// Probability series of an arbitrary predicate over one variable.
pub fn event_probability<F>(
    table: &SeriesTable,
    variable: Variable,
    predicate: F,
) -> Vec<Option<f64>>
where
    F: Fn(f64) -> bool,
{
    (0..table.len())
        .map(|idx| probability_of(&table.member_values(variable, idx), &predicate))
        .collect()
}

/// Probability series of a built-in event.
pub fn event_series(table: &SeriesTable, event: Event) -> Vec<Option<f64>> {
    match event.source() {
        EventSource::Variable(variable) => event_probability(table, variable, |v| event.test(v)),
        EventSource::ResolvedWind => (0..table.len())
            .map(|idx| probability_of(&wind_members(table, idx).speeds, |v| event.test(v)))
            .collect(),
    }
}

/// Every built-in event, one rayon task per event.
pub fn all_events(table: &SeriesTable) -> BTreeMap<Event, Vec<Option<f64>>> {
    Event::ALL
        .par_iter()
        .map(|e| (*e, event_series(table, *e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;
    use mwf_ensemble::Model;

    #[test]
    fn test_probability_of() {
        assert_eq!(probability_of(&[], |v| v > 0.0), None);
        assert_eq!(probability_of(&[1.0, 0.0, 2.0, 0.0], |v| v > 0.0), Some(0.5));
    }

    #[test]
    fn test_no_data_excluded_from_denominator() {
        let t = table(
            2,
            &[
                (
                    Variable::Precipitation,
                    Model::GfsSeamless,
                    vec![vec![Some(6.0), None], vec![None, None]],
                ),
                (
                    Variable::Precipitation,
                    Model::GemGlobal,
                    vec![vec![Some(0.0), None], vec![Some(0.2), None]],
                ),
            ],
        );
        let p = event_series(&t, Event::PrecipitationMeasurable);
        assert!((p[0].unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(p[1], None);
        let heavy = event_series(&t, Event::PrecipitationHeavy);
        assert!((heavy[0].unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_freezing_boundaries() {
        assert!(Event::Freezing.test(0.0));
        assert!(!Event::Freezing.test(0.1));
        assert!(Event::HardFreeze.test(-5.1));
        assert!(!Event::HardFreeze.test(-5.0));
    }

    #[test]
    fn test_wind_events_follow_resolver() {
        let t = table(
            2,
            &[
                (
                    Variable::WindSpeed80m,
                    Model::GfsSeamless,
                    vec![vec![Some(30.0), None]],
                ),
                (
                    Variable::WindSpeed10m,
                    Model::GemGlobal,
                    vec![vec![Some(10.0), Some(20.0)], vec![Some(10.0), Some(30.0)]],
                ),
            ],
        );
        let p = event_series(&t, Event::WindOver25kmh);
        // step 0 uses the single 80 m member only
        assert_eq!(p[0], Some(1.0));
        // step 1: 10 m x 1.4 = 28 and 42
        assert_eq!(p[1], Some(1.0));
        let p40 = event_series(&t, Event::WindOver40kmh);
        assert_eq!(p40[0], Some(0.0));
        assert_eq!(p40[1], Some(0.5));
    }

    #[test]
    fn test_all_events_bounded() {
        let t = table(
            3,
            &[
                (
                    Variable::Temperature2m,
                    Model::GemGlobal,
                    vec![
                        vec![Some(-6.0), Some(0.0), Some(3.0)],
                        vec![Some(-1.0), None, Some(4.0)],
                    ],
                ),
                (
                    Variable::SnowDepth,
                    Model::GemGlobal,
                    vec![vec![Some(12.0), Some(0.0), None]],
                ),
            ],
        );
        let events = all_events(&t);
        assert_eq!(events.len(), Event::ALL.len());
        for series in events.values() {
            assert_eq!(series.len(), 3);
            for p in series.iter().flatten() {
                assert!((0.0..=1.0).contains(p));
            }
        }
        assert_eq!(events[&Event::HardFreeze][0], Some(0.5));
        assert_eq!(events[&Event::Freezing][1], Some(1.0));
        assert_eq!(events[&Event::SnowOver10cm][0], Some(1.0));
        assert_eq!(events[&Event::SnowPresent][2], None);
        assert_eq!(events[&Event::WindOver25kmh][0], None);
    }

    #[test]
    fn test_custom_predicate() {
        let t = table(
            1,
            &[(
                Variable::CloudCover,
                Model::GemGlobal,
                vec![vec![Some(95.0)], vec![Some(20.0)], vec![Some(85.0)], vec![Some(10.0)]],
            )],
        );
        assert_eq!(event_probability(&t, Variable::CloudCover, |v| v > 80.0), vec![Some(0.5)]);
    }
}
