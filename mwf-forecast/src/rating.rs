//! GOOD / FAIR / POOR operational rating.
//!
//! Each rule of the [`RatingTable`] grades one metric `fair` or `poor` (or
//! not at all). Any poor grade, or two fair grades, rate the window POOR;
//! a single fair grade rates it FAIR.

use mwf_data::comparison::AgreementLevel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{RatingTable, Threshold};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Good => f.write_str("GOOD"),
            Rating::Fair => f.write_str("FAIR"),
            Rating::Poor => f.write_str("POOR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Grade {
    Fair,
    Poor,
}

impl Grade {
    fn as_str(&self) -> &'static str {
        match self {
            Grade::Fair => "fair",
            Grade::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalConditions {
    pub rating: Rating,
    pub rationale: String,
}

/// Metrics of the window being rated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingInputs {
    pub snowfall_cm: Option<f64>,
    pub max_wind_kmh: Option<f64>,
    pub agreement: Option<AgreementLevel>,
}

fn grade_threshold(value: Option<f64>, threshold: &Threshold) -> Option<Grade> {
    let v = value?;
    if v > threshold.poor {
        Some(Grade::Poor)
    } else if v > threshold.fair {
        Some(Grade::Fair)
    } else {
        None
    }
}

pub fn rate(inputs: &RatingInputs, table: &RatingTable) -> OperationalConditions {
    let mut findings: Vec<(Grade, String)> = Vec::new();

    if let Some(g) = grade_threshold(inputs.snowfall_cm, &table.snowfall) {
        findings.push((
            g,
            format!("snowfall {:.0} cm ({})", inputs.snowfall_cm.unwrap_or(0.0), g.as_str()),
        ));
    }
    if let Some(g) = grade_threshold(inputs.max_wind_kmh, &table.wind) {
        findings.push((
            g,
            format!("wind to {:.0} km/h ({})", inputs.max_wind_kmh.unwrap_or(0.0), g.as_str()),
        ));
    }
    if let Some(level) = inputs.agreement {
        let grade = if level == table.agreement.poor {
            Some(Grade::Poor)
        } else if level == table.agreement.fair {
            Some(Grade::Fair)
        } else {
            None
        };
        if let Some(g) = grade {
            findings.push((
                g,
                format!("{} model agreement ({})", level.as_str(), g.as_str()),
            ));
        }
    }

    let poor = findings.iter().filter(|(g, _)| *g == Grade::Poor).count();
    let fair = findings.iter().filter(|(g, _)| *g == Grade::Fair).count();
    let rating = if poor > 0 || fair >= 2 {
        Rating::Poor
    } else if fair == 1 {
        Rating::Fair
    } else {
        Rating::Good
    };
    let rationale = if findings.is_empty() {
        "Generally favorable conditions".to_string()
    } else {
        findings
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("; ")
    };

    OperationalConditions { rating, rationale }
}

/// Most frequent known agreement level; ties go to the worse level.
pub fn prevailing_agreement<I>(levels: I) -> Option<AgreementLevel>
where
    I: IntoIterator<Item = AgreementLevel>,
{
    let mut counts: BTreeMap<AgreementLevel, usize> = BTreeMap::new();
    for level in levels {
        if level != AgreementLevel::Unknown {
            *counts.entry(level).or_default() += 1;
        }
    }
    // BTreeMap iterates High -> Low; max_by_key keeps the last maximum
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(level, _)| level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(snow: f64, wind: f64, agreement: AgreementLevel) -> RatingInputs {
        RatingInputs {
            snowfall_cm: Some(snow),
            max_wind_kmh: Some(wind),
            agreement: Some(agreement),
        }
    }

    #[test]
    fn test_good() {
        let c = rate(&inputs(2.0, 20.0, AgreementLevel::High), &RatingTable::default());
        assert_eq!(c.rating, Rating::Good);
        assert_eq!(c.rationale, "Generally favorable conditions");
    }

    #[test]
    fn test_single_fair() {
        let c = rate(&inputs(12.0, 20.0, AgreementLevel::High), &RatingTable::default());
        assert_eq!(c.rating, Rating::Fair);
        assert_eq!(c.rationale, "snowfall 12 cm (fair)");
    }

    #[test]
    fn test_two_fair_is_poor() {
        let c = rate(&inputs(12.0, 45.0, AgreementLevel::High), &RatingTable::default());
        assert_eq!(c.rating, Rating::Poor);
        let c = rate(&inputs(12.0, 20.0, AgreementLevel::Moderate), &RatingTable::default());
        assert_eq!(c.rating, Rating::Poor);
    }

    #[test]
    fn test_any_poor_is_poor() {
        let c = rate(&inputs(0.0, 75.0, AgreementLevel::High), &RatingTable::default());
        assert_eq!(c.rating, Rating::Poor);
        let c = rate(&inputs(0.0, 0.0, AgreementLevel::Low), &RatingTable::default());
        assert_eq!(c.rating, Rating::Poor);
    }

    #[test]
    fn test_missing_metrics_are_not_graded() {
        let c = rate(&RatingInputs::default(), &RatingTable::default());
        assert_eq!(c.rating, Rating::Good);
    }

    #[test]
    fn test_prevailing_agreement() {
        use AgreementLevel::*;
        assert_eq!(prevailing_agreement(vec![High, High, Moderate]), Some(High));
        assert_eq!(prevailing_agreement(vec![High, Low]), Some(Low));
        assert_eq!(prevailing_agreement(vec![Unknown, Unknown]), None);
        assert_eq!(prevailing_agreement(Vec::new()), None);
    }

    #[test]
    fn test_rating_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Rating::Fair).unwrap(), "\"FAIR\"");
    }
}
