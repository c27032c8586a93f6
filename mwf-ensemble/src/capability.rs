//! Static (model, variable) capability table.
//!
//! Which models report which variables is process-wide knowledge: GFS is
//! the only real freezing-level source, 80 m wind exists only for GFS and
//! ICON, and the AIFS ensemble carries no humidity or cloud cover. The table
//! is immutable and versioned; ingestion drops any (model, variable) pair
//! outside it.

use crate::model::Model;
use crate::variable::Variable;

/// Bumped whenever an entry below changes.
pub const CAPABILITY_TABLE_VERSION: &str = "2025.1";

const DAILY_ALL: &[Variable] = &Variable::DAILY;

const HOURLY_BASE: &[Variable] = &[
    Variable::Temperature2m,
    Variable::RelativeHumidity2m,
    Variable::DewPoint2m,
    Variable::Precipitation,
    Variable::Snowfall,
    Variable::CloudCover,
    Variable::SurfacePressure,
    Variable::Temperature850hPa,
    Variable::WindSpeed10m,
    Variable::WindDirection10m,
    Variable::WindGusts10m,
];

const HOURLY_GFS: &[Variable] = &[
    Variable::FreezingLevelHeight,
    Variable::WindSpeed80m,
    Variable::WindDirection80m,
];

const HOURLY_ICON: &[Variable] = &[Variable::WindSpeed80m, Variable::WindDirection80m];

const HOURLY_AIFS: &[Variable] = &[
    Variable::Temperature2m,
    Variable::Precipitation,
    Variable::Snowfall,
    Variable::SurfacePressure,
    Variable::Temperature850hPa,
    Variable::WindSpeed10m,
    Variable::WindDirection10m,
];

const DAILY_AIFS: &[Variable] = &[
    Variable::Temperature2mMin,
    Variable::Temperature2mMax,
    Variable::Temperature2mMean,
    Variable::PrecipitationSum,
    Variable::WindSpeed10mMean,
    Variable::WindDirection10mDominant,
];

/// Capability rows: the union of the listed slices is what a model reports.
static CAPABILITIES: &[(Model, &[&[Variable]])] = &[
    (Model::EcmwfIfs025, &[HOURLY_BASE, DAILY_ALL]),
    (Model::GemGlobal, &[HOURLY_BASE, DAILY_ALL]),
    (Model::EcmwfAifs025, &[HOURLY_AIFS, DAILY_AIFS]),
    (Model::GfsSeamless, &[HOURLY_BASE, HOURLY_GFS, DAILY_ALL]),
    (Model::IconSeamless, &[HOURLY_BASE, HOURLY_ICON, DAILY_ALL]),
];

/// True if `model` reports `variable` according to the capability table.
pub fn supports(model: Model, variable: Variable) -> bool {
    CAPABILITIES
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, groups)| groups.iter().any(|g| g.contains(&variable)))
        .unwrap_or(false)
}

/// Models that are real-world sources for `variable`.
pub fn sources_of(variable: Variable) -> Vec<Model> {
    Model::ALL
        .iter()
        .copied()
        .filter(|m| supports(*m, variable))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freezing_level_only_from_gfs() {
        assert_eq!(
            sources_of(Variable::FreezingLevelHeight),
            vec![Model::GfsSeamless]
        );
    }

    #[test]
    fn test_wind_80m_sources() {
        assert_eq!(
            sources_of(Variable::WindSpeed80m),
            vec![Model::GfsSeamless, Model::IconSeamless]
        );
        assert!(supports(Model::EcmwfIfs025, Variable::WindSpeed10m));
    }

    #[test]
    fn test_aifs_has_no_humidity() {
        assert!(!supports(Model::EcmwfAifs025, Variable::RelativeHumidity2m));
        assert!(!supports(Model::EcmwfAifs025, Variable::CloudCover));
        assert!(supports(Model::EcmwfAifs025, Variable::Temperature2m));
    }

    #[test]
    fn test_derived_never_supported() {
        for model in Model::ALL {
            assert!(!supports(model, Variable::SnowDepth));
        }
    }
}
