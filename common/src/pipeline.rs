use std::io::Read;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    chart::{ChartSpec, assemble_chart, comparison_stats},
    config::Config,
    metadata::{GraphMetadata, MetadataTable},
    observation::{MeasurementTable, ObservationSet, normalize},
    order::resolve_display_order,
    range::{SharedRange, compute_shared_range},
    stats::{ConfidenceLevel, GroupStat, StatsEngine},
    surface::{Surface, ensure_parent_dir},
};

/// Everything computed from the inputs, ready to be drawn.
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub metadata: MetadataTable,
    pub observations: ObservationSet,
    pub order: Vec<String>,
    pub range: SharedRange,
    pub charts: Vec<ChartSpec>,
    engine: StatsEngine,
    stats: Vec<Vec<Vec<Option<GroupStat>>>>,
}

/// Loads both tables and assembles every chart of the batch. Nothing is
/// written, so any input error aborts the job before output exists.
pub fn prepare<M: Read, R: Read>(
    config: &Config,
    metadata: M,
    measurements: R,
) -> Result<PreparedJob> {
    config.validate().wrap_err("Validate config")?;
    let settings = &config.settings;

    let metadata = MetadataTable::from_reader(metadata).wrap_err("Load graph metadata")?;
    let table = MeasurementTable::from_reader(
        measurements,
        &settings.algorithm_column,
        &settings.graph_column,
    )
    .wrap_err("Load measurements")?;
    let observations =
        normalize(&table, settings.unit_factor).wrap_err("Normalize measurements")?;
    info!(
        "Loaded {} observations over {} graphs and {} algorithms",
        observations.len(),
        observations.graphs().len(),
        observations.algorithms().len()
    );

    let order = resolve_display_order(observations.graphs(), &metadata)
        .wrap_err("Resolve graph order")?;
    debug!("Graph order: {order:?}");

    for algorithm in config.comparisons.iter().flat_map(|c| &c.algorithms) {
        if !observations.contains_algorithm(algorithm) {
            warn!("No observations for algorithm {algorithm}, its bars will be empty");
        }
    }

    let engine = StatsEngine::new(settings.confidence_level);
    let range = compute_shared_range(&config.comparisons, &observations, &engine)
        .wrap_err("Compute shared axis range")?;

    let mut charts = Vec::with_capacity(config.comparisons.len());
    let mut stats = Vec::with_capacity(config.comparisons.len());
    for comparison in &config.comparisons {
        let comparison_stats = comparison_stats(comparison, &order, &observations, &engine)
            .wrap_err_with(|| format!("Group statistics for {:?}", comparison.title))?;
        charts.push(assemble_chart(
            comparison,
            &order,
            &comparison_stats,
            &config.colors,
            range,
            &settings.output_dir,
        ));
        stats.push(comparison_stats);
    }

    Ok(PreparedJob {
        metadata,
        observations,
        order,
        range,
        charts,
        engine,
        stats,
    })
}

impl PreparedJob {
    /// Draws every chart in batch order. `on_chart` runs after each chart.
    pub fn render<F: FnMut(&ChartSpec)>(
        &self,
        surface: &dyn Surface,
        mut on_chart: F,
    ) -> Result<()> {
        for chart in &self.charts {
            ensure_parent_dir(&chart.output)?;
            debug!("Drawing {:?} with {}", chart.output, surface.name());
            surface
                .draw(chart)
                .wrap_err_with(|| format!("Draw {:?} to {:?}", chart.title, chart.output))?;
            on_chart(chart);
        }
        Ok(())
    }

    /// Level the error bars were computed at.
    pub fn confidence(&self) -> ConfidenceLevel {
        self.engine.confidence()
    }

    /// Group stats of every compared algorithm in display order, each pairing
    /// listed once.
    pub fn group_stats(&self) -> Vec<&GroupStat> {
        let mut seen = Vec::new();
        let mut result = Vec::new();
        for stat in self.stats.iter().flatten().flatten().flatten() {
            let key = (stat.algorithm.as_str(), stat.graph.as_str());
            if !seen.contains(&key) {
                seen.push(key);
                result.push(stat);
            }
        }
        result
    }

    /// Metadata of every ordered graph.
    pub fn ordered_metadata(&self) -> Vec<&GraphMetadata> {
        self.order
            .iter()
            .filter_map(|graph| self.metadata.get(graph))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::config::{ColorAssignment, Comparison, Settings};

    /// Keeps the titles of drawn charts.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Recorder {
        #[serde(skip)]
        drawn: Arc<Mutex<Vec<String>>>,
    }

    #[typetag::serde]
    impl Surface for Recorder {
        fn name(&self) -> &'static str {
            "Recorder"
        }

        fn draw(&self, chart: &ChartSpec) -> Result<()> {
            self.drawn.lock().unwrap().push(chart.title.clone());
            Ok(())
        }
    }

    const METADATA: &str = "Graph,Vertexes,Edges\nG1,10,20\nG0,10,5\n";
    const MEASUREMENTS: &str = "\
Algorithm,Graph,Run,0,1
A,G1,100,200,300
B,G1,150,250,
B,G0,40,50,60
C,G0,1,,
";

    fn job_config(output_dir: PathBuf, comparisons: Vec<Comparison>) -> Config {
        Config {
            name: "mst".to_owned(),
            settings: Settings {
                measurements: PathBuf::from("benchmark_results.csv"),
                metadata: PathBuf::from("graphs.csv"),
                output_dir,
                unit_factor: 1000.0,
                confidence_level: ConfidenceLevel::default(),
                algorithm_column: "Algorithm".to_owned(),
                graph_column: "Graph".to_owned(),
            },
            surface: Box::new(Recorder::default()),
            colors: [("A", "tab:blue"), ("B", "tab:orange")]
                .into_iter()
                .collect::<ColorAssignment>(),
            comparisons,
        }
    }

    fn comparison(algorithms: &[&str], title: &str) -> Comparison {
        Comparison {
            algorithms: algorithms.iter().map(|a| (*a).to_owned()).collect(),
            title: title.to_owned(),
            output: PathBuf::from(format!("{title}.png")),
        }
    }

    #[test]
    fn single_group_scenario() {
        let config = job_config(PathBuf::from("out"), vec![comparison(&["A"], "a")]);
        let job = prepare(
            &config,
            "Graph,Vertexes,Edges\nG1,10,20\n".as_bytes(),
            "Algorithm,Graph,0,1,2\nA,G1,100,200,300\n".as_bytes(),
        )
        .unwrap();

        let stats = job.group_stats();
        assert_eq!(stats.len(), 1);
        let stat = stats[0];
        assert_eq!(stat.n, 3);
        assert!((stat.mean - 0.2).abs() < 1e-12);
        let half_width = stat.ci_half_width.unwrap();
        assert!(half_width > 0.0);
        assert!((half_width - 0.248_413_77).abs() < 1e-5);
    }

    #[test]
    fn keeps_configured_confidence() {
        let mut config = job_config(PathBuf::from("out"), vec![comparison(&["B"], "b")]);
        config.settings.confidence_level = ConfidenceLevel::new(0.99).unwrap();
        let job = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();

        assert_eq!(job.confidence().get(), 0.99);
        assert_eq!(job.observations.len(), 9);
        let wide = job.group_stats()[0].ci_half_width.unwrap();

        config.settings.confidence_level = ConfidenceLevel::default();
        let job = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();
        assert!(job.group_stats()[0].ci_half_width.unwrap() < wide);
    }

    #[test]
    fn missing_metadata_aborts() {
        let config = job_config(PathBuf::from("out"), vec![comparison(&["A"], "a")]);
        let err = prepare(
            &config,
            "Graph,Vertexes,Edges\nG1,10,20\n".as_bytes(),
            "Algorithm,Graph,0,1,2\nA,G1,100,200,300\nA,G2,1,2,3\n".as_bytes(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("G2"), "{err:#}");
    }

    #[test]
    fn shares_order_and_range_across_charts() {
        let config = job_config(
            PathBuf::from("out"),
            vec![comparison(&["A", "B"], "ab"), comparison(&["B"], "b")],
        );
        let job = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();

        // G0 and G1 share vertex counts, G0 has fewer edges
        assert_eq!(job.order, vec!["G0", "G1"]);
        assert_eq!(job.charts.len(), 2);
        assert!(job.charts.iter().all(|c| c.y_range == job.range));
        assert!(job.charts.iter().all(|c| c.categories == job.order));
        // the unused algorithm C holds the global minimum
        assert_eq!(job.range.min, 0.001 * 0.9);
        assert_eq!(job.charts[0].output, PathBuf::from("out/ab.png"));

        // A has no trials on G0
        let ab = &job.charts[0];
        assert_eq!(ab.bars.len(), 3);
        assert!(ab.bars.iter().all(|b| !(b.label == "A" && b.graph == "G0")));

        let graphs = job
            .ordered_metadata()
            .iter()
            .map(|m| m.graph.as_str())
            .collect::<Vec<_>>();
        assert_eq!(graphs, vec!["G0", "G1"]);
        assert_eq!(job.group_stats().len(), 3);
    }

    #[test]
    fn renders_in_batch_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = job_config(
            dir.path().join("nested"),
            vec![comparison(&["A", "B"], "ab"), comparison(&["B"], "b")],
        );
        let job = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();

        let recorder = Recorder::default();
        let mut seen = Vec::new();
        job.render(&recorder, |chart| seen.push(chart.output.clone()))
            .unwrap();
        assert_eq!(*recorder.drawn.lock().unwrap(), vec!["ab", "b"]);
        assert_eq!(seen.len(), 2);
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn identical_inputs_give_identical_charts() {
        let config = job_config(PathBuf::from("out"), vec![comparison(&["A", "B"], "ab")]);
        let first = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();
        let second = prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).unwrap();
        assert_eq!(first.charts, second.charts);
    }

    #[test]
    fn invalid_batch_is_rejected_before_loading() {
        let config = job_config(PathBuf::from("out"), vec![comparison(&[], "empty")]);
        let err = prepare(&config, "garbage".as_bytes(), "garbage".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("empty"), "{err:#}");

        let config = job_config(
            PathBuf::from("out"),
            vec![comparison(&["A"], "x"), comparison(&["B"], "x")],
        );
        assert!(prepare(&config, METADATA.as_bytes(), MEASUREMENTS.as_bytes()).is_err());
    }

    #[test]
    fn config_round_trips_through_yaml_shape() {
        let json = r#"{
            "name": "mst",
            "settings": {"measurements": "r.csv", "metadata": "g.csv"},
            "surface": {"type": "Recorder"},
            "colors": {"A": "tab:blue"},
            "comparisons": [{"algorithms": ["A"], "title": "a", "output": "a.png"}]
        }"#;
        let mut config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.settings.unit_factor, 1000.0);
        assert_eq!(config.settings.confidence_level.get(), 0.95);
        assert_eq!(config.settings.output_dir, PathBuf::from("plots"));
        assert_eq!(config.surface.name(), "Recorder");

        config.resolve_paths(std::path::Path::new("/data"));
        assert_eq!(config.settings.measurements, PathBuf::from("/data/r.csv"));
        assert_eq!(config.settings.output_dir, PathBuf::from("/data/plots"));
    }
}
