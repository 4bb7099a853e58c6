use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;

use crate::{
    config::{Color, ColorAssignment, Comparison},
    observation::ObservationSet,
    range::SharedRange,
    stats::{GroupStat, StatsEngine, StatsError},
};

/// Fraction of a category slot taken by its bars.
pub const GROUP_WIDTH: f64 = 0.7;
pub const Y_LABEL: &str = "Time (seconds)";

/// Y axis scale requested from the surface. Timings span orders of
/// magnitude so only a log scale is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisScale {
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSpec {
    /// Center of the bar, category `i` is centered at `i`
    pub x: f64,
    pub height: f64,
    /// Symmetric error, `None` when the group has a single trial
    pub error: Option<f64>,
    pub color: Option<Color>,
    pub label: String,
    pub graph: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: Option<Color>,
}

/// Everything a surface needs to draw one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub output: PathBuf,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub bar_width: f64,
    pub bars: Vec<BarSpec>,
    pub y_scale: AxisScale,
    pub y_range: SharedRange,
    pub y_label: String,
}

/// Group stats of every compared algorithm on every ordered graph. The outer
/// vector follows the comparison's algorithm order, the inner one the graph
/// order.
pub fn comparison_stats(
    comparison: &Comparison,
    order: &[String],
    set: &ObservationSet,
    engine: &StatsEngine,
) -> Result<Vec<Vec<Option<GroupStat>>>, StatsError> {
    comparison
        .algorithms
        .par_iter()
        .map(|algorithm| {
            order
                .iter()
                .map(|graph| engine.group_stat(set, algorithm, graph))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Lays out one bar group per graph and one bar per algorithm. Missing groups
/// leave a gap rather than a zero-height bar.
pub fn assemble_chart(
    comparison: &Comparison,
    order: &[String],
    stats: &[Vec<Option<GroupStat>>],
    colors: &ColorAssignment,
    range: SharedRange,
    output_dir: &Path,
) -> ChartSpec {
    let bar_count = comparison.algorithms.len().max(1);
    let bar_width = GROUP_WIDTH / bar_count as f64;

    let mut bars = Vec::new();
    for (graph_idx, graph) in order.iter().enumerate() {
        for (algo_idx, algorithm) in comparison.algorithms.iter().enumerate() {
            let Some(Some(stat)) = stats.get(algo_idx).and_then(|s| s.get(graph_idx)) else {
                continue;
            };
            bars.push(BarSpec {
                x: graph_idx as f64 - GROUP_WIDTH / 2.0 + bar_width * (algo_idx as f64 + 0.5),
                height: stat.mean,
                error: stat.ci_half_width,
                color: colors.get(algorithm).cloned(),
                label: algorithm.clone(),
                graph: graph.clone(),
            });
        }
    }

    ChartSpec {
        title: comparison.title.clone(),
        output: output_dir.join(&comparison.output),
        categories: order.to_vec(),
        series: comparison
            .algorithms
            .iter()
            .map(|a| Series {
                label: a.clone(),
                color: colors.get(a).cloned(),
            })
            .collect(),
        bar_width,
        bars,
        y_scale: AxisScale::Log,
        y_range: range,
        y_label: Y_LABEL.to_owned(),
    }
}
