//! Ensemble reductions and derived quantities.
//!
//! Everything here is a pure function of an ingested
//! [`mwf_ensemble::EnsembleSeries`] table: per-timestep statistics across
//! members, event probabilities, cross-model agreement, the per-member snow
//! formula and the freezing-level/wind/snow-level fallback chain.

pub mod comparison;
pub mod derived;
pub mod probability;
pub mod snow;
pub mod statistics;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDateTime};
    use mwf_ensemble::{MemberColumn, Model, Resolution, SeriesTable, Variable};

    pub fn hourly_axis(n: usize) -> Vec<NaiveDateTime> {
        let start = mwf_utils::times::parse_timestamp("2025-01-15T00:00").unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    /// A table with one block per (variable, model), members numbered from 0.
    pub fn table(n: usize, blocks: &[(Variable, Model, Vec<Vec<Option<f64>>>)]) -> SeriesTable {
        let mut table = SeriesTable::new(Resolution::Hourly, hourly_axis(n));
        for (variable, model, members) in blocks {
            let columns = members
                .iter()
                .enumerate()
                .map(|(i, values)| MemberColumn::new(i as u32, values.clone()))
                .collect();
            table.insert_block(*variable, *model, columns).unwrap();
        }
        table
    }
}
