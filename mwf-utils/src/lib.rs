//! Shared utility functions for MWF crates.

/// Timestamp utility functions
pub mod times {
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};

    /// Hourly timestamp format used by the ensemble payload: "YYYY-MM-DDTHH:MM"
    pub const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

    /// Hourly timestamp format with seconds: "YYYY-MM-DDTHH:MM:SS"
    pub const HOUR_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Daily timestamp format: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Parse a payload timestamp.
    ///
    /// Accepts "YYYY-MM-DDTHH:MM", "YYYY-MM-DDTHH:MM:SS" or a bare
    /// "YYYY-MM-DD" (taken as midnight).
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        if let Ok(t) = NaiveDateTime::parse_from_str(s, HOUR_FORMAT) {
            return Ok(t);
        }
        if let Ok(t) = NaiveDateTime::parse_from_str(s, HOUR_SECONDS_FORMAT) {
            return Ok(t);
        }
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid midnight for {}", s))
    }

    /// Convert unix seconds to a naive UTC timestamp.
    pub fn from_unix_seconds(secs: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
    }

    /// Format a timestamp as "YYYY-MM-DDTHH:MM"
    pub fn format_hour(t: &NaiveDateTime) -> String {
        t.format(HOUR_FORMAT).to_string()
    }

    /// Format the date part of a timestamp as "YYYY-MM-DD"
    pub fn format_date(t: &NaiveDateTime) -> String {
        t.format(DATE_FORMAT).to_string()
    }

    /// Full English weekday name, e.g. "Wednesday".
    pub fn day_of_week(t: &NaiveDateTime) -> &'static str {
        match t.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    /// Spacing of a regular axis in hours, taken from its first two entries.
    pub fn step_hours(axis: &[NaiveDateTime]) -> Option<f64> {
        match axis {
            [first, second, ..] => {
                let secs = (*second - *first).num_seconds();
                if secs > 0 {
                    Some(secs as f64 / 3600.0)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// True if every entry is strictly later than the one before it.
    pub fn is_strictly_increasing(axis: &[NaiveDateTime]) -> bool {
        axis.windows(2).all(|w| w[0] < w[1])
    }

}

/// Numeric rounding helpers for document output
pub mod rounding {
    /// Round to a fixed number of decimal places.
    pub fn round_to(value: f64, places: i32) -> f64 {
        let factor = 10f64.powi(places);
        (value * factor).round() / factor
    }

    /// Round an optional value, keeping no-data as no-data.
    pub fn round_opt(value: Option<f64>, places: i32) -> Option<f64> {
        value.map(|v| round_to(v, places))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_round_to() {
            assert_eq!(round_to(10.0987, 1), 10.1);
            assert_eq!(round_to(-3.14159, 2), -3.14);
            assert_eq!(round_opt(None, 1), None);
            assert_eq!(round_opt(Some(0.26), 1), Some(0.3));
        }
    }
}
