//! Raw ensemble payload as handed over by the data-fetching collaborator.
//!
//! ```json
//! {"models": {"gfs_seamless": {
//!     "hourly": {"time": ["2025-01-15T00:00", "2025-01-15T01:00"],
//!                "members": [{"member": 0, "temperature_2m": [-3.2, null]}]},
//!     "daily":  {"time": ["2025-01-15"], "members": []}}}}
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Whole payload, keyed by model identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEnsembleResponse {
    #[serde(default)]
    pub models: BTreeMap<String, RawModelResponse>,
}

/// One model's hourly and daily blocks; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawModelResponse {
    #[serde(default)]
    pub hourly: Option<RawBlock>,
    #[serde(default)]
    pub daily: Option<RawBlock>,
}

/// A time axis plus per-member variable arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub time: Vec<RawTime>,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

/// Axis entries come either as ISO-like strings or unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Unix(i64),
    Text(String),
}

impl RawTime {
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            RawTime::Unix(secs) => mwf_utils::times::from_unix_seconds(*secs),
            RawTime::Text(s) => mwf_utils::times::parse_timestamp(s).ok(),
        }
    }
}

/// One ensemble member: its index and variable name -> values (`null` = no data).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMember {
    pub member: u32,
    #[serde(flatten)]
    pub values: BTreeMap<String, Vec<Option<f64>>>,
}

impl RawEnsembleResponse {
    /// Parse a payload from a JSON string.
    pub fn from_json(body: &str) -> Result<RawEnsembleResponse> {
        Ok(serde_json::from_str(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"models": {"gfs_seamless": {
        "hourly": {"time": ["2025-01-15T00:00", 1736902800],
                   "members": [{"member": 0, "temperature_2m": [-3.2, null]},
                               {"member": 1, "temperature_2m": [-2.9, -3.1],
                                "precipitation": [0.0, 1.5]}]}}}}"#;

    #[test]
    fn test_from_json() {
        let raw = RawEnsembleResponse::from_json(BODY).unwrap();
        let gfs = &raw.models["gfs_seamless"];
        assert!(gfs.daily.is_none());
        let hourly = gfs.hourly.as_ref().unwrap();
        assert_eq!(hourly.time.len(), 2);
        assert_eq!(hourly.members.len(), 2);
        assert_eq!(hourly.members[0].values["temperature_2m"], vec![Some(-3.2), None]);
        assert_eq!(hourly.members[1].values.len(), 2);
    }

    #[test]
    fn test_mixed_time_axis() {
        let raw = RawEnsembleResponse::from_json(BODY).unwrap();
        let hourly = raw.models["gfs_seamless"].hourly.clone().unwrap();
        let axis: Vec<_> = hourly.time.iter().map(|t| t.to_naive().unwrap()).collect();
        assert_eq!(mwf_utils::times::format_hour(&axis[1]), "2025-01-15T01:00");
    }

    #[test]
    fn test_invalid_json_is_payload_error() {
        assert!(RawEnsembleResponse::from_json("{\"models\": [1,2]}").is_err());
    }
}
