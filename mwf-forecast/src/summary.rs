//! Plain-language summary: executive text, key concerns, short-range
//! trends and mountain window totals.

use mwf_data::derived::ResolvedHour;
use mwf_data::probability::Event;
use mwf_ensemble::{SeriesTable, Variable};

use crate::document::{DailyRecord, HourlyRecord, MountainTotals, TemperatureRange, Trends};
use crate::window::{leading, max_member_speed, snow_window};

pub const TREND_HOURS: usize = 6;

const HEAVY_SNOW_HOURLY_CM: f64 = 5.0;
const STRONG_WIND_KMH: f64 = 60.0;
const VISIBILITY_SNOW_CM: f64 = 2.0;
const VISIBILITY_WIND_KMH: f64 = 40.0;

fn temperature_text(t: &TemperatureRange) -> String {
    match (t.min, t.max) {
        (Some(lo), Some(hi)) => format!("Temps {:.1} to {:.1}°C.", lo, hi),
        _ => "Temperatures unavailable.".to_string(),
    }
}

/// One-line description of a day.
pub fn daily_summary(
    temperature: &TemperatureRange,
    precipitation: Option<f64>,
    snow: Option<f64>,
) -> String {
    let precip = precipitation.unwrap_or(0.0);
    let snow = snow.unwrap_or(0.0);
    let cold = temperature.max.map(|t| t < 2.0).unwrap_or(false);

    let precip_text = if precip < 0.1 && snow <= 0.1 {
        "Dry conditions expected.".to_string()
    } else if cold || snow > 0.1 {
        if snow > 20.0 {
            format!("Heavy snow expected ({:.0}cm).", snow)
        } else if snow > 5.0 {
            format!("Moderate snow expected ({:.0}cm).", snow)
        } else {
            "Light snow expected.".to_string()
        }
    } else if precip > 25.0 {
        "Heavy rain expected.".to_string()
    } else if precip > 10.0 {
        "Moderate rain expected.".to_string()
    } else {
        "Light rain expected.".to_string()
    };

    format!("{} {}", temperature_text(temperature), precip_text)
}

/// Executive summary from the first day's temperatures and the first three
/// days' snow and precipitation.
pub fn executive_text(daily: &[DailyRecord]) -> String {
    let Some(first) = daily.first() else {
        return "No daily forecast available.".to_string();
    };
    let days = &daily[..daily.len().min(3)];
    let snow_total: f64 = days.iter().filter_map(|d| d.snowfall.total).sum();
    let precip_total: f64 = days.iter().filter_map(|d| d.precipitation_total).sum();
    let temps = temperature_text(&first.temperature);

    if snow_total > 30.0 {
        format!(
            "{} Significant snow accumulation ({:.0}cm over {} days).",
            temps,
            snow_total,
            days.len()
        )
    } else if snow_total > 5.0 {
        format!("{} Moderate snow expected ({:.0}cm total).", temps, snow_total)
    } else if precip_total > 10.0 {
        format!("{} Wet conditions expected.", temps)
    } else {
        format!("{} Generally dry conditions.", temps)
    }
}

/// Hazards over the first day from member maxima of snowfall and wind.
pub fn key_concerns(max_hourly_snow: Option<f64>, max_wind: Option<f64>) -> Vec<String> {
    let snow = max_hourly_snow.unwrap_or(0.0);
    let wind = max_wind.unwrap_or(0.0);
    let mut concerns = Vec::new();
    if snow > HEAVY_SNOW_HOURLY_CM {
        concerns.push("Heavy snowfall".to_string());
    }
    if wind > STRONG_WIND_KMH {
        concerns.push("Strong winds".to_string());
    }
    if snow > VISIBILITY_SNOW_CM && wind > VISIBILITY_WIND_KMH {
        concerns.push("Poor visibility likely".to_string());
    }
    concerns
}

fn change_label(
    change: f64,
    step: f64,
    rapid: f64,
    up: [&'static str; 2],
    down: [&'static str; 2],
) -> &'static str {
    if change > rapid {
        up[1]
    } else if change > step {
        up[0]
    } else if change < -rapid {
        down[1]
    } else if change < -step {
        down[0]
    } else {
        "steady"
    }
}

fn mean_of(values: &[Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    mwf_data::statistics::mean(&valid)
}

/// Trends over the first `hours` records; empty when fewer records exist.
pub fn trends(hourly: &[HourlyRecord], hours: usize) -> Trends {
    if hours < 2 || hourly.len() < hours {
        return Trends::default();
    }
    let window = &hourly[..hours];
    let stat_mean = |r: &HourlyRecord, v: Variable| r.statistics.get(&v).and_then(|s| s.mean);

    let temperature = match (
        stat_mean(&window[0], Variable::Temperature2m),
        stat_mean(&window[hours - 1], Variable::Temperature2m),
    ) {
        (Some(a), Some(b)) => Some(change_label(
            b - a,
            1.0,
            3.0,
            ["rising", "rising_rapidly"],
            ["falling", "falling_rapidly"],
        )),
        _ => None,
    };

    let wind = match (window[0].wind.speed.value, window[hours - 1].wind.speed.value) {
        (Some(a), Some(b)) => Some(change_label(
            b - a,
            10.0,
            20.0,
            ["increasing", "increasing_rapidly"],
            ["decreasing", "decreasing_rapidly"],
        )),
        _ => None,
    };

    let probs: Vec<Option<f64>> = window
        .iter()
        .map(|r| r.probabilities.get(&Event::PrecipitationMeasurable).copied().flatten())
        .collect();
    let precipitation = match (mean_of(&probs[..2]), mean_of(&probs[hours - 2..])) {
        (Some(start), Some(end)) => Some(if end > 0.7 && start < 0.3 {
            "developing"
        } else if start > 0.7 && end < 0.3 {
            "ending"
        } else if end > 0.5 {
            "likely"
        } else {
            "unlikely"
        }),
        _ => None,
    };

    let clouds: Vec<Option<f64>> = window
        .iter()
        .map(|r| stat_mean(r, Variable::CloudCover))
        .collect();
    let sky = if clouds.iter().all(|c| c.is_some()) {
        match (mean_of(&clouds[..2]), mean_of(&clouds[hours - 2..])) {
            (Some(start), Some(end)) => Some(if start > 70.0 && end < 30.0 {
                "clearing"
            } else if start < 30.0 && end > 70.0 {
                "clouding_up"
            } else if end < 20.0 {
                "clear"
            } else if end > 80.0 {
                "overcast"
            } else {
                "partly_cloudy"
            }),
            _ => None,
        }
    } else {
        None
    };

    Trends {
        temperature,
        wind,
        precipitation,
        sky,
    }
}

pub fn mountain_totals(table: &SeriesTable, resolved: &[ResolvedHour]) -> MountainTotals {
    let day = leading(resolved.len(), 24);
    let freezing_trend = match (
        resolved.first().and_then(|r| r.freezing_level.value),
        resolved.get(12).and_then(|r| r.freezing_level.value),
    ) {
        (Some(now), Some(later)) if later > now => Some("rising"),
        (Some(now), Some(later)) if later < now => Some("falling"),
        (Some(_), Some(_)) => Some("steady"),
        _ => None,
    };
    MountainTotals {
        snow_24h: snow_window(table, leading(table.len(), 24)).total,
        snow_48h: snow_window(table, leading(table.len(), 48)).total,
        max_wind_24h: max_member_speed(&resolved[day]),
        freezing_trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> TemperatureRange {
        TemperatureRange {
            min: Some(min),
            max: Some(max),
        }
    }

    #[test]
    fn test_daily_summary() {
        assert_eq!(
            daily_summary(&range(-8.0, -2.5), Some(0.0), Some(0.0)),
            "Temps -8.0 to -2.5°C. Dry conditions expected."
        );
        assert_eq!(
            daily_summary(&range(-8.0, -2.5), Some(15.0), Some(24.4)),
            "Temps -8.0 to -2.5°C. Heavy snow expected (24cm)."
        );
        assert_eq!(
            daily_summary(&range(-3.0, 1.0), Some(2.0), Some(0.0)),
            "Temps -3.0 to 1.0°C. Light snow expected."
        );
        assert_eq!(
            daily_summary(&range(3.0, 9.0), Some(12.0), None),
            "Temps 3.0 to 9.0°C. Moderate rain expected."
        );
        assert_eq!(
            daily_summary(&TemperatureRange::default(), None, None),
            "Temperatures unavailable. Dry conditions expected."
        );
    }

    #[test]
    fn test_key_concerns() {
        assert!(key_concerns(None, None).is_empty());
        assert_eq!(key_concerns(Some(6.0), Some(20.0)), vec!["Heavy snowfall"]);
        assert_eq!(
            key_concerns(Some(3.0), Some(65.0)),
            vec!["Strong winds", "Poor visibility likely"]
        );
    }

    #[test]
    fn test_change_labels() {
        let up = ["rising", "rising_rapidly"];
        let down = ["falling", "falling_rapidly"];
        assert_eq!(change_label(0.5, 1.0, 3.0, up, down), "steady");
        assert_eq!(change_label(1.5, 1.0, 3.0, up, down), "rising");
        assert_eq!(change_label(-3.5, 1.0, 3.0, up, down), "falling_rapidly");
    }

    #[test]
    fn test_trends_need_enough_hours() {
        assert_eq!(trends(&[], TREND_HOURS), Trends::default());
    }
}
