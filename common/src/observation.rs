use std::{collections::BTreeSet, io::Read};

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::util::{column_index, parse_trial_cell};

#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("Measurement table is missing the {0:?} column")]
    MissingColumn(String),
    #[error("Measurement table has no trial columns")]
    NoTrialColumns,
    #[error("Invalid unit factor {0}, expected a finite positive number")]
    InvalidUnitFactor(f64),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the wide measurement table: an algorithm/graph pairing and its
/// raw trial cells, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub algorithm: String,
    pub graph: String,
    pub cells: Vec<String>,
}

/// The wide per-run timing table as written by the benchmark harness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    pub trial_columns: Vec<String>,
    pub rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    /// Reads a csv table whose identifier columns are `algorithm_column` and
    /// `graph_column`. Every other column is a trial. Rows may be shorter than
    /// the header; the missing cells are empty.
    pub fn from_reader<R: Read>(
        reader: R,
        algorithm_column: &str,
        graph_column: &str,
    ) -> Result<Self, MeasurementError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let algorithm_idx = column_index(&headers, algorithm_column)
            .ok_or_else(|| MeasurementError::MissingColumn(algorithm_column.to_owned()))?;
        let graph_idx = column_index(&headers, graph_column)
            .ok_or_else(|| MeasurementError::MissingColumn(graph_column.to_owned()))?;

        let trial_idx = (0..headers.len())
            .filter(|i| *i != algorithm_idx && *i != graph_idx)
            .collect::<Vec<_>>();
        if trial_idx.is_empty() {
            return Err(MeasurementError::NoTrialColumns);
        }
        let trial_columns = trial_idx
            .iter()
            .map(|i| headers[*i].trim().to_owned())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let algorithm = record.get(algorithm_idx).unwrap_or_default();
            let graph = record.get(graph_idx).unwrap_or_default();
            if algorithm.is_empty() || graph.is_empty() {
                debug!("Skipping row without identifiers: {record:?}");
                continue;
            }
            rows.push(MeasurementRow {
                algorithm: algorithm.to_owned(),
                graph: graph.to_owned(),
                cells: trial_idx
                    .iter()
                    .map(|i| record.get(*i).unwrap_or_default().to_owned())
                    .collect(),
            });
        }

        Ok(Self {
            trial_columns,
            rows,
        })
    }
}

/// A single unit-converted trial measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub algorithm: String,
    pub graph: String,
    pub value: f64,
}

/// The long-form, read-only set of every valid trial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Values of every trial for one (algorithm, graph) pairing.
    pub fn samples(&self, algorithm: &str, graph: &str) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.algorithm == algorithm && o.graph == graph)
            .map(|o| o.value)
            .collect()
    }

    /// Distinct graph names, sorted by name.
    pub fn graphs(&self) -> BTreeSet<&str> {
        self.observations.iter().map(|o| o.graph.as_str()).collect()
    }

    /// Distinct algorithm names, sorted by name.
    pub fn algorithms(&self) -> BTreeSet<&str> {
        self.observations
            .iter()
            .map(|o| o.algorithm.as_str())
            .collect()
    }

    pub fn contains_algorithm(&self, algorithm: &str) -> bool {
        self.observations.iter().any(|o| o.algorithm == algorithm)
    }

    /// Smallest value in the whole set.
    pub fn min_value(&self) -> Option<f64> {
        self.observations
            .iter()
            .map(|o| o.value)
            .min_by(f64::total_cmp)
    }
}

/// Melts the wide table into one observation per valid trial cell, dividing
/// each value by `unit_factor`.
pub fn normalize(
    table: &MeasurementTable,
    unit_factor: f64,
) -> Result<ObservationSet, MeasurementError> {
    if !unit_factor.is_finite() || unit_factor <= 0.0 {
        return Err(MeasurementError::InvalidUnitFactor(unit_factor));
    }

    let mut dropped = 0usize;
    let observations = table
        .rows
        .iter()
        .flat_map(|row| {
            row.cells
                .iter()
                .map(move |cell| (row, parse_trial_cell(cell)))
        })
        .filter_map(|(row, value)| match value {
            Some(value) => Some(Observation {
                algorithm: row.algorithm.clone(),
                graph: row.graph.clone(),
                value: value / unit_factor,
            }),
            None => {
                dropped += 1;
                None
            }
        })
        .collect_vec();

    debug!(
        "Normalized {} observations from {} rows, dropped {dropped} cells",
        observations.len(),
        table.rows.len()
    );
    Ok(ObservationSet::new(observations))
}
