//! Inter-model agreement and outlier detection.
//!
//! Each model is reduced to the mean of its own valid members; the spread of
//! those model means (population standard deviation, coefficient of
//! variation) grades how well the models agree.

use mwf_ensemble::{Model, SeriesTable, Variable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::statistics::{mean, population_std_dev};

pub const HIGH_AGREEMENT_CV: f64 = 0.10;
pub const MODERATE_AGREEMENT_CV: f64 = 0.30;

/// A model is an outlier when its mean is further than this many standard
/// deviations from the cross-model mean.
pub const OUTLIER_STD_FACTOR: f64 = 1.5;

const MIN_MEAN_MAGNITUDE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    High,
    Moderate,
    Low,
    Unknown,
}

impl AgreementLevel {
    pub fn from_cv(cv: Option<f64>) -> AgreementLevel {
        match cv {
            Some(cv) if cv < HIGH_AGREEMENT_CV => AgreementLevel::High,
            Some(cv) if cv < MODERATE_AGREEMENT_CV => AgreementLevel::Moderate,
            Some(_) => AgreementLevel::Low,
            None => AgreementLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementLevel::High => "high",
            AgreementLevel::Moderate => "moderate",
            AgreementLevel::Low => "low",
            AgreementLevel::Unknown => "unknown",
        }
    }
}

/// Agreement of the models reporting one variable at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelAgreement {
    pub model_means: BTreeMap<Model, f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub spread: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    pub agreement: AgreementLevel,
    pub models_in_agreement: Vec<Model>,
    pub outlier_models: Vec<Model>,
}

/// Grade a set of per-model means.
pub fn compare_means(model_means: BTreeMap<Model, f64>) -> ModelAgreement {
    let values: Vec<f64> = model_means.values().copied().collect();
    let cross_mean = mean(&values);
    let std_dev = population_std_dev(&values);
    let spread = values
        .iter()
        .copied()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .map(|(lo, hi)| hi - lo);

    let cv = match (cross_mean, std_dev) {
        (Some(m), Some(s)) if values.len() >= 2 && m.abs() >= MIN_MEAN_MAGNITUDE => {
            Some(s / m.abs())
        }
        _ => None,
    };

    let mut outlier_models = Vec::new();
    let mut models_in_agreement = Vec::new();
    for (model, value) in &model_means {
        let outlier = match (cross_mean, std_dev) {
            (Some(m), Some(s)) if s > 0.0 => (value - m).abs() > OUTLIER_STD_FACTOR * s,
            _ => false,
        };
        if outlier {
            outlier_models.push(*model);
        } else {
            models_in_agreement.push(*model);
        }
    }

    ModelAgreement {
        agreement: AgreementLevel::from_cv(cv),
        model_means,
        mean: cross_mean,
        std_dev,
        spread,
        coefficient_of_variation: cv,
        models_in_agreement,
        outlier_models,
    }
}

/// Per-model member means of `variable` at `idx`; models with no valid
/// member are left out.
pub fn model_means_at(table: &SeriesTable, variable: Variable, idx: usize) -> BTreeMap<Model, f64> {
    table
        .models_for(variable)
        .into_iter()
        .filter_map(|m| mean(&table.model_member_values(variable, m, idx)).map(|v| (m, v)))
        .collect()
}

pub fn compare_variable(table: &SeriesTable, variable: Variable) -> Vec<ModelAgreement> {
    (0..table.len())
        .map(|idx| compare_means(model_means_at(table, variable, idx)))
        .collect()
}

/// Agreement series for each requested variable present in the table, one
/// rayon task per variable.
pub fn compare_variables(
    table: &SeriesTable,
    variables: &[Variable],
) -> BTreeMap<Variable, Vec<ModelAgreement>> {
    variables
        .par_iter()
        .filter(|v| table.has_variable(**v))
        .map(|v| (*v, compare_variable(table, *v)))
        .collect()
}
