//! Ingestion: raw payload -> [`EnsembleSeries`].
//!
//! Per model and resolution the block is validated on its own; a bad block
//! is dropped with a note and the remaining models carry on. The first
//! block of a resolution that contributes a column fixes that table's axis
//! and every later block must match it exactly.

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::capability;
use crate::error::{EnsembleError, Result};
use crate::model::Model;
use crate::payload::{RawBlock, RawEnsembleResponse};
use crate::quality::{DataQualityNote, NoteKind};
use crate::series::{EnsembleSeries, MemberColumn, SeriesTable};
use crate::variable::{Resolution, Variable};

/// Run-level ingestion options.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Models to keep; `None` keeps every known model in the payload.
    pub models: Option<Vec<Model>>,
    /// Truncate both tables to this many days from their first entry.
    pub forecast_days: Option<u32>,
}

/// A validated block, not yet merged into a table.
struct NormalizedBlock {
    axis: Vec<NaiveDateTime>,
    variables: BTreeMap<Variable, BTreeMap<u32, Vec<Option<f64>>>>,
}

/// Resolve a raw payload into the canonical columnar form.
pub fn ingest(raw: &RawEnsembleResponse, options: &IngestOptions) -> Result<EnsembleSeries> {
    let mut notes: Vec<DataQualityNote> = Vec::new();
    let mut hourly: Option<SeriesTable> = None;
    let mut daily: Option<SeriesTable> = None;
    let mut seen: BTreeSet<Model> = BTreeSet::new();

    for (name, response) in &raw.models {
        let model = match name.parse::<Model>() {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping unsupported model {}", name);
                notes.push(
                    DataQualityNote::new(NoteKind::UnknownModel, e.to_string()).with_model(name),
                );
                continue;
            }
        };
        if let Some(wanted) = &options.models {
            if !wanted.contains(&model) {
                debug!("Skipping {}: not in the requested model list", model);
                continue;
            }
        }
        seen.insert(model);

        let blocks = [
            (Resolution::Hourly, response.hourly.as_ref(), &mut hourly),
            (Resolution::Daily, response.daily.as_ref(), &mut daily),
        ];
        for (resolution, block, table) in blocks {
            let Some(block) = block else {
                continue;
            };
            let merged = normalize_block(model, resolution, block, &mut notes)
                .and_then(|normalized| merge_block(model, normalized, resolution, table));
            if let Err(e) = merged {
                warn!("Dropping {:?} data for {}: {}", resolution, model, e);
                notes.push(
                    DataQualityNote::new(NoteKind::SchemaError, e.to_string())
                        .with_model(model.as_str()),
                );
            }
        }
    }

    if let Some(wanted) = &options.models {
        for model in wanted.iter().filter(|m| !seen.contains(m)) {
            notes.push(
                DataQualityNote::new(
                    NoteKind::ModelNotInPayload,
                    format!("Requested model {} is absent from the payload", model),
                )
                .with_model(model.as_str()),
            );
        }
    }

    let mut hourly = hourly.unwrap_or_else(|| SeriesTable::new(Resolution::Hourly, Vec::new()));
    let mut daily = daily.unwrap_or_else(|| SeriesTable::new(Resolution::Daily, Vec::new()));
    if hourly.models().is_empty() && daily.models().is_empty() {
        return Err(EnsembleError::NoUsableData);
    }
    if let Some(days) = options.forecast_days {
        hourly.truncate_days(days);
        daily.truncate_days(days);
    }

    info!(
        "Ingested {} models: {} hourly steps, {} daily steps, {} notes",
        hourly
            .models()
            .into_iter()
            .chain(daily.models())
            .collect::<BTreeSet<_>>()
            .len(),
        hourly.len(),
        daily.len(),
        notes.len()
    );
    Ok(EnsembleSeries {
        hourly,
        daily,
        notes,
    })
}

/// Validate one model's block for one resolution.
///
/// Structural problems (bad axis, array lengths) fail the whole block;
/// unknown or unsupported variables only drop that variable.
fn normalize_block(
    model: Model,
    resolution: Resolution,
    block: &RawBlock,
    notes: &mut Vec<DataQualityNote>,
) -> Result<NormalizedBlock> {
    let axis = block
        .time
        .iter()
        .map(|t| t.to_naive())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| EnsembleError::schema(model.as_str(), "unparseable timestamp in axis"))?;
    if !mwf_utils::times::is_strictly_increasing(&axis) {
        return Err(EnsembleError::schema(
            model.as_str(),
            "timestamp axis is not strictly increasing",
        ));
    }

    let mut dropped: BTreeMap<String, NoteKind> = BTreeMap::new();
    let mut variables: BTreeMap<Variable, BTreeMap<u32, Vec<Option<f64>>>> = BTreeMap::new();
    for member in &block.members {
        for (name, values) in &member.values {
            let variable = match name.parse::<Variable>() {
                Ok(v) => v,
                Err(_) => {
                    dropped.insert(name.clone(), NoteKind::UnknownVariable);
                    continue;
                }
            };
            if variable.resolution() != resolution || !capability::supports(model, variable) {
                dropped.insert(name.clone(), NoteKind::UnsupportedVariable);
                continue;
            }
            if values.len() != axis.len() {
                return Err(EnsembleError::schema(
                    model.as_str(),
                    format!(
                        "{} member {} has {} values for {} timestamps",
                        name,
                        member.member,
                        values.len(),
                        axis.len()
                    ),
                ));
            }
            let cleaned = values
                .iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect::<Vec<_>>();
            let previous = variables
                .entry(variable)
                .or_default()
                .insert(member.member, cleaned);
            if previous.is_some() {
                notes.push(
                    DataQualityNote::new(
                        NoteKind::DuplicateMember,
                        format!(
                            "member {} reported twice; keeping the later column",
                            member.member
                        ),
                    )
                    .with_model(model.as_str())
                    .with_variable(name),
                );
            }
        }
    }

    for (name, kind) in dropped {
        warn!("Dropping {} for {}: {:?}", name, model, kind);
        let message = match kind {
            NoteKind::UnknownVariable => "unknown variable name".to_string(),
            _ => format!("{} does not report this variable at {:?} resolution", model, resolution),
        };
        notes.push(
            DataQualityNote::new(kind, message)
                .with_model(model.as_str())
                .with_variable(name),
        );
    }

    Ok(NormalizedBlock { axis, variables })
}

/// Merge a validated block into its table, enforcing the shared axis.
fn merge_block(
    model: Model,
    block: NormalizedBlock,
    resolution: Resolution,
    table: &mut Option<SeriesTable>,
) -> Result<()> {
    let NormalizedBlock { axis, variables } = block;
    // Only a block that contributes a column may fix the axis.
    if variables.is_empty() {
        return Ok(());
    }
    if let Some(existing) = table.as_ref() {
        if existing.axis() != axis.as_slice() {
            return Err(EnsembleError::schema(
                model.as_str(),
                format!(
                    "{:?} axis differs from the axis established by earlier models",
                    resolution
                ),
            ));
        }
    }
    let table = table.get_or_insert_with(|| SeriesTable::new(resolution, axis));
    for (variable, members) in variables {
        let columns = members
            .into_iter()
            .map(|(member, values)| MemberColumn::new(member, values))
            .collect();
        table.insert_block(variable, model, columns)?;
    }
    Ok(())
}
