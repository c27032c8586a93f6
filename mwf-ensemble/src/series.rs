//! Columnar ensemble storage.
//!
//! A [`SeriesTable`] holds one shared timestamp axis and, per
//! (variable, model), a block of member columns. Each column is a contiguous
//! buffer aligned with the axis where `None` is an explicit no-data marker.

use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EnsembleError, Result};
use crate::model::Model;
use crate::quality::DataQualityNote;
use crate::variable::{Resolution, Variable};

/// One ensemble member's values for a single variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberColumn {
    pub member: u32,
    pub values: Vec<Option<f64>>,
}

impl MemberColumn {
    pub fn new(member: u32, values: Vec<Option<f64>>) -> Self {
        MemberColumn { member, values }
    }

    /// Value at axis index `idx`, `None` if missing or out of range.
    pub fn at(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }
}

/// All series of one resolution, sharing a strictly increasing axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    resolution: Resolution,
    axis: Vec<NaiveDateTime>,
    blocks: BTreeMap<(Variable, Model), Vec<MemberColumn>>,
}

impl SeriesTable {
    pub fn new(resolution: Resolution, axis: Vec<NaiveDateTime>) -> Self {
        SeriesTable {
            resolution,
            axis,
            blocks: BTreeMap::new(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn axis(&self) -> &[NaiveDateTime] {
        &self.axis
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    /// Insert (or replace) the member block for a (variable, model) pair.
    ///
    /// Every column must match the axis length; columns are kept sorted by
    /// member index.
    pub fn insert_block(
        &mut self,
        variable: Variable,
        model: Model,
        mut columns: Vec<MemberColumn>,
    ) -> Result<()> {
        if let Some(bad) = columns.iter().find(|c| c.values.len() != self.axis.len()) {
            return Err(EnsembleError::schema(
                model.as_str(),
                format!(
                    "{} member {} has {} values for an axis of {}",
                    variable,
                    bad.member,
                    bad.values.len(),
                    self.axis.len()
                ),
            ));
        }
        columns.sort_by_key(|c| c.member);
        self.blocks.insert((variable, model), columns);
        Ok(())
    }

    /// Member columns for a (variable, model) pair.
    pub fn columns(&self, variable: Variable, model: Model) -> Option<&[MemberColumn]> {
        self.blocks.get(&(variable, model)).map(|c| c.as_slice())
    }

    pub fn has_variable(&self, variable: Variable) -> bool {
        self.blocks.keys().any(|(v, _)| *v == variable)
    }

    /// Distinct variables present, in enum order.
    pub fn variables(&self) -> Vec<Variable> {
        self.blocks
            .keys()
            .map(|(v, _)| *v)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct models present for any variable.
    pub fn models(&self) -> Vec<Model> {
        self.blocks
            .keys()
            .map(|(_, m)| *m)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Models that carry a block for `variable`.
    pub fn models_for(&self, variable: Variable) -> Vec<Model> {
        self.blocks
            .keys()
            .filter(|(v, _)| *v == variable)
            .map(|(_, m)| *m)
            .collect()
    }

    /// Number of member columns for `variable` across all models.
    pub fn member_count(&self, variable: Variable) -> usize {
        self.blocks
            .iter()
            .filter(|((v, _), _)| *v == variable)
            .map(|(_, cols)| cols.len())
            .sum()
    }

    /// Valid values of every member of every model at axis index `idx`.
    pub fn member_values(&self, variable: Variable, idx: usize) -> Vec<f64> {
        self.blocks
            .iter()
            .filter(|((v, _), _)| *v == variable)
            .flat_map(|(_, cols)| cols.iter().filter_map(move |c| c.at(idx)))
            .collect()
    }

    /// Valid values of one model's members at axis index `idx`.
    pub fn model_member_values(&self, variable: Variable, model: Model, idx: usize) -> Vec<f64> {
        self.columns(variable, model)
            .map(|cols| cols.iter().filter_map(|c| c.at(idx)).collect())
            .unwrap_or_default()
    }

    /// Every column of `variable` tagged with its model.
    pub fn all_columns(&self, variable: Variable) -> Vec<(Model, &MemberColumn)> {
        self.blocks
            .iter()
            .filter(|((v, _), _)| *v == variable)
            .flat_map(|((_, m), cols)| cols.iter().map(move |c| (*m, c)))
            .collect()
    }

    /// Keep only axis entries earlier than `days` after the first entry.
    pub fn truncate_days(&mut self, days: u32) {
        let Some(first) = self.axis.first().copied() else {
            return;
        };
        let end = first + Duration::days(i64::from(days));
        let keep = self.axis.iter().take_while(|t| **t < end).count();
        self.axis.truncate(keep);
        for cols in self.blocks.values_mut() {
            for c in cols.iter_mut() {
                c.values.truncate(keep);
            }
        }
    }
}

/// The canonical ingested form: hourly and daily tables plus notes about
/// anything dropped on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSeries {
    pub hourly: SeriesTable,
    pub daily: SeriesTable,
    pub notes: Vec<DataQualityNote>,
}

impl EnsembleSeries {
    /// Models present in either table.
    pub fn models(&self) -> Vec<Model> {
        self.hourly
            .models()
            .into_iter()
            .chain(self.daily.models())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Total ensemble members, counted on hourly temperature (the variable
    /// every model carries), falling back to the largest hourly block.
    pub fn member_count(&self) -> usize {
        let temp = self.hourly.member_count(Variable::Temperature2m);
        if temp > 0 {
            return temp;
        }
        self.hourly
            .variables()
            .into_iter()
            .map(|v| self.hourly.member_count(v))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwf_utils::times::parse_timestamp;

    fn axis(n: usize) -> Vec<NaiveDateTime> {
        let start = parse_timestamp("2025-01-15T00:00").unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_insert_block_checks_length() {
        let mut table = SeriesTable::new(Resolution::Hourly, axis(3));
        let ok = vec![MemberColumn::new(0, vec![Some(1.0), None, Some(3.0)])];
        assert!(table
            .insert_block(Variable::Temperature2m, Model::GfsSeamless, ok)
            .is_ok());
        let bad = vec![MemberColumn::new(0, vec![Some(1.0)])];
        let err = table
            .insert_block(Variable::Precipitation, Model::GfsSeamless, bad)
            .unwrap_err();
        assert!(matches!(err, EnsembleError::Schema { .. }));
        assert!(!table.has_variable(Variable::Precipitation));
    }

    #[test]
    fn test_member_values_skip_no_data() {
        let mut table = SeriesTable::new(Resolution::Hourly, axis(2));
        table
            .insert_block(
                Variable::Temperature2m,
                Model::GfsSeamless,
                vec![
                    MemberColumn::new(1, vec![Some(-1.0), None]),
                    MemberColumn::new(0, vec![Some(-2.0), Some(-2.5)]),
                ],
            )
            .unwrap();
        table
            .insert_block(
                Variable::Temperature2m,
                Model::GemGlobal,
                vec![MemberColumn::new(0, vec![None, Some(0.5)])],
            )
            .unwrap();

        assert_eq!(table.member_values(Variable::Temperature2m, 1), vec![-2.5, 0.5]);
        assert_eq!(
            table.model_member_values(Variable::Temperature2m, Model::GfsSeamless, 0),
            vec![-2.0, -1.0]
        );
        assert_eq!(table.member_count(Variable::Temperature2m), 3);
        assert_eq!(
            table.models_for(Variable::Temperature2m),
            vec![Model::GemGlobal, Model::GfsSeamless]
        );
        // sorted by member index
        assert_eq!(
            table.columns(Variable::Temperature2m, Model::GfsSeamless).unwrap()[0].member,
            0
        );
    }

    #[test]
    fn test_truncate_days() {
        let mut table = SeriesTable::new(Resolution::Hourly, axis(72));
        table
            .insert_block(
                Variable::Precipitation,
                Model::GemGlobal,
                vec![MemberColumn::new(0, vec![Some(0.0); 72])],
            )
            .unwrap();
        table.truncate_days(2);
        assert_eq!(table.len(), 48);
        assert_eq!(
            table.columns(Variable::Precipitation, Model::GemGlobal).unwrap()[0]
                .values
                .len(),
            48
        );
    }
}
