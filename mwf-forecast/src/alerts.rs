//! Threshold alerts, evaluated per fixed block of hourly steps.
//!
//! Alerts are classified only; delivering them is somebody else's job.

use mwf_data::derived::ResolvedHour;
use mwf_ensemble::SeriesTable;
use serde::Serialize;

use crate::config::AlertThresholds;
use crate::window::{max_member_speed, snow_window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HeavySnow,
    HighWind,
    FreezingLevelChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub valid_from: String,
    pub valid_to: String,
}

pub fn evaluate_alerts(
    table: &SeriesTable,
    resolved: &[ResolvedHour],
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let axis = table.axis();
    let len = axis.len().min(resolved.len());
    let step = thresholds.window_hours.max(1);
    let mut alerts = Vec::new();

    for start in (0..len).step_by(step) {
        let end = (start + step).min(len);
        let valid_from = mwf_utils::times::format_hour(&axis[start]);
        let valid_to = mwf_utils::times::format_hour(&axis[end - 1]);
        let block = &resolved[start..end];
        let mut raise = |alert_type, severity, message: String| {
            alerts.push(Alert {
                alert_type,
                severity,
                message,
                valid_from: valid_from.clone(),
                valid_to: valid_to.clone(),
            })
        };

        if let Some(total) = snow_window(table, start..end).total {
            if total > thresholds.heavy_snow_cm {
                raise(
                    AlertType::HeavySnow,
                    Severity::High,
                    format!(
                        "Heavy snow warning: {:.0}cm expected in {} hours",
                        total,
                        end - start
                    ),
                );
            }
        }

        // strongest single member, not the ensemble mean
        if let Some(max_wind) = max_member_speed(block) {
            if max_wind > thresholds.high_wind_kmh {
                raise(
                    AlertType::HighWind,
                    Severity::High,
                    format!("High wind warning: gusts to {:.0} km/h expected", max_wind),
                );
            }
        }

        let levels: Vec<f64> = block
            .iter()
            .filter_map(|r| r.freezing_level.value)
            .collect();
        if let (Some(first), Some(last)) = (levels.first(), levels.last()) {
            let change = last - first;
            if change.abs() > thresholds.freezing_level_change_m {
                raise(
                    AlertType::FreezingLevelChange,
                    Severity::Moderate,
                    format!(
                        "Significant freezing level {}: {:.0}m change",
                        if change > 0.0 { "rise" } else { "drop" },
                        change.abs()
                    ),
                );
            }
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mwf_data::derived::{DerivedValue, ResolvedWind, WindSource};
    use mwf_ensemble::{MemberColumn, Model, Resolution, Variable};

    fn hour(fl: Option<f64>, wind: Option<f64>) -> ResolvedHour {
        gusty_hour(fl, wind, wind)
    }

    fn gusty_hour(fl: Option<f64>, mean: Option<f64>, max: Option<f64>) -> ResolvedHour {
        let freezing_level = fl
            .map(DerivedValue::direct)
            .unwrap_or_else(DerivedValue::unavailable);
        ResolvedHour {
            freezing_level,
            snow_level: mwf_data::derived::snow_level(&freezing_level),
            wind: ResolvedWind {
                speed: mean
                    .map(DerivedValue::direct)
                    .unwrap_or_else(DerivedValue::unavailable),
                max_speed: max,
                direction: None,
                source: WindSource::Wind80m,
            },
        }
    }

    fn table(n: usize, snow_per_hour: f64) -> SeriesTable {
        let start = mwf_utils::times::parse_timestamp("2025-01-15T00:00").unwrap();
        let axis = (0..n).map(|i| start + Duration::hours(i as i64)).collect();
        let mut t = SeriesTable::new(Resolution::Hourly, axis);
        t.insert_block(
            Variable::SnowDepth,
            Model::GfsSeamless,
            vec![MemberColumn::new(0, vec![Some(snow_per_hour); n])],
        )
        .unwrap();
        t
    }

    #[test]
    fn test_heavy_snow_per_block() {
        let t = table(48, 1.5);
        let resolved: Vec<ResolvedHour> =
            (0..48).map(|_| hour(Some(1000.0), Some(20.0))).collect();
        let alerts = evaluate_alerts(&t, &resolved, &AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.alert_type == AlertType::HeavySnow));
        assert_eq!(alerts[0].valid_from, "2025-01-15T00:00");
        assert_eq!(alerts[0].valid_to, "2025-01-15T23:00");
        assert_eq!(alerts[1].valid_from, "2025-01-16T00:00");
        assert_eq!(alerts[0].message, "Heavy snow warning: 36cm expected in 24 hours");
    }

    #[test]
    fn test_high_wind_and_freezing_change() {
        let t = table(24, 0.0);
        let mut resolved: Vec<ResolvedHour> =
            (0..24).map(|_| hour(Some(1000.0), Some(30.0))).collect();
        resolved[5] = hour(None, Some(85.0));
        resolved[0] = hour(None, Some(30.0));
        resolved[1] = hour(Some(800.0), Some(30.0));
        resolved[23] = hour(Some(1400.0), None);
        let alerts = evaluate_alerts(&t, &resolved, &AlertThresholds::default());
        let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(types, vec![AlertType::HighWind, AlertType::FreezingLevelChange]);
        assert_eq!(alerts[1].severity, Severity::Moderate);
        assert_eq!(alerts[1].message, "Significant freezing level rise: 600m change");
        let json = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(json["type"], "HIGH_WIND");
        assert_eq!(json["severity"], "HIGH");
    }

    #[test]
    fn test_high_wind_from_strongest_member() {
        let t = table(24, 0.0);
        // members at 60 and 100 km/h: the mean stays at the threshold
        let resolved: Vec<ResolvedHour> = (0..24)
            .map(|_| gusty_hour(Some(1000.0), Some(80.0), Some(100.0)))
            .collect();
        let alerts = evaluate_alerts(&t, &resolved, &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HighWind);
        assert_eq!(alerts[0].message, "High wind warning: gusts to 100 km/h expected");
    }

    #[test]
    fn test_quiet_forecast() {
        let t = table(30, 0.2);
        let resolved: Vec<ResolvedHour> =
            (0..30).map(|_| hour(Some(1500.0), Some(30.0))).collect();
        assert!(evaluate_alerts(&t, &resolved, &AlertThresholds::default()).is_empty());
        assert!(evaluate_alerts(&t, &[], &AlertThresholds::default()).is_empty());
    }
}
