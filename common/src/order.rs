use itertools::Itertools;
use thiserror::Error;

use crate::metadata::{GraphMetadata, MetadataTable};

#[derive(Error, Debug, PartialEq)]
pub enum OrderError {
    #[error("No graph metadata for graph {graph:?}")]
    MissingMetadata { graph: String },
}

/// Orders graphs by vertex count, then edge count, then name. Every graph
/// must be present in `metadata`.
pub fn resolve_display_order<'a, I>(
    graphs: I,
    metadata: &MetadataTable,
) -> Result<Vec<String>, OrderError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries = graphs
        .into_iter()
        .unique()
        .map(|graph| {
            metadata
                .get(graph)
                .ok_or_else(|| OrderError::MissingMetadata {
                    graph: graph.to_owned(),
                })
        })
        .collect::<Result<Vec<&GraphMetadata>, _>>()?;

    entries.sort_by(|a, b| {
        a.vertex_count
            .total_cmp(&b.vertex_count)
            .then(a.edge_count.total_cmp(&b.edge_count))
            .then_with(|| a.graph.cmp(&b.graph))
    });
    Ok(entries.into_iter().map(|m| m.graph.clone()).collect())
}
