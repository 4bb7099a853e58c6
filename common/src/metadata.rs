use std::{collections::HashMap, io::Read};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const GRAPH_COLUMN: &str = "Graph";
pub const VERTEX_COLUMN: &str = "Vertexes";
pub const EDGE_COLUMN: &str = "Edges";

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(
        "Graph metadata header must be exactly {GRAPH_COLUMN}, {VERTEX_COLUMN}, {EDGE_COLUMN} (any order), got {0:?}"
    )]
    HeaderMismatch(Vec<String>),
    #[error("Graph metadata row {row} ({graph:?}): {column} value {value:?} is not a number")]
    InvalidNumber {
        row: usize,
        graph: String,
        column: &'static str,
        value: String,
    },
    #[error("Graph metadata row {row}: expected 3 fields, got {found}")]
    FieldCount { row: usize, found: usize },
    #[error("Graph metadata row {row}: graph {graph:?} is listed more than once")]
    DuplicateGraph { row: usize, graph: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetadata {
    pub graph: String,
    pub vertex_count: f64,
    pub edge_count: f64,
}

/// Graph sizes keyed by graph name. Loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTable {
    graphs: HashMap<String, GraphMetadata>,
}

impl MetadataTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MetadataError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let [graph_idx, vertex_idx, edge_idx] = header_positions(&headers)?;

        let mut graphs = HashMap::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let row = i + 2;
            if record.len() != 3 {
                return Err(MetadataError::FieldCount {
                    row,
                    found: record.len(),
                });
            }
            let graph = record[graph_idx].to_owned();
            let parse = |idx: usize, column: &'static str| {
                record[idx]
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| MetadataError::InvalidNumber {
                        row,
                        graph: graph.clone(),
                        column,
                        value: record[idx].to_owned(),
                    })
            };
            let vertex_count = parse(vertex_idx, VERTEX_COLUMN)?;
            let edge_count = parse(edge_idx, EDGE_COLUMN)?;

            if graphs.contains_key(&graph) {
                return Err(MetadataError::DuplicateGraph { row, graph });
            }
            graphs.insert(
                graph.clone(),
                GraphMetadata {
                    graph,
                    vertex_count,
                    edge_count,
                },
            );
        }

        debug!("Loaded metadata for {} graphs", graphs.len());
        Ok(Self { graphs })
    }

    pub fn get(&self, graph: &str) -> Option<&GraphMetadata> {
        self.graphs.get(graph)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl FromIterator<GraphMetadata> for MetadataTable {
    fn from_iter<T: IntoIterator<Item = GraphMetadata>>(iter: T) -> Self {
        Self {
            graphs: iter.into_iter().map(|m| (m.graph.clone(), m)).collect(),
        }
    }
}

fn header_positions(headers: &csv::StringRecord) -> Result<[usize; 3], MetadataError> {
    let mismatch = || MetadataError::HeaderMismatch(headers.iter().map(str::to_owned).collect());
    if headers.len() != 3 {
        return Err(mismatch());
    }
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(mismatch)
    };
    let positions = [find(GRAPH_COLUMN)?, find(VERTEX_COLUMN)?, find(EDGE_COLUMN)?];
    // three distinct names in three columns means each was matched once
    Ok(positions)
}
