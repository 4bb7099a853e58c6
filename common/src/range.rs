use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::Comparison,
    observation::ObservationSet,
    stats::{StatsEngine, StatsError},
};

/// Lowest permitted axis bound, keeps the log scale valid when the data
/// contains zeros.
pub const MIN_AXIS_VALUE: f64 = 1e-6;
const LOWER_PADDING: f64 = 0.9;
const UPPER_PADDING: f64 = 1.1;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Cannot compute an axis range without observations")]
    EmptyObservations,
    #[error("None of the compared algorithms have observations")]
    NoComparedData,
    #[error("Axis range is empty: min {min} >= max {max}")]
    Degenerate { min: f64, max: f64 },
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Y axis bounds shared by every chart of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SharedRange {
    pub min: f64,
    pub max: f64,
}

/// Computes one range for the whole batch. The upper bound only looks at
/// compared algorithms while the lower bound uses the minimum of the entire
/// observation set.
pub fn compute_shared_range(
    comparisons: &[Comparison],
    set: &ObservationSet,
    engine: &StatsEngine,
) -> Result<SharedRange, RangeError> {
    let global_min = set.min_value().ok_or(RangeError::EmptyObservations)?;
    let graphs = set.graphs();

    let mut upper: Option<f64> = None;
    for algorithm in comparisons.iter().flat_map(|c| &c.algorithms) {
        for graph in &graphs {
            if let Some(bound) = engine.range_upper_bound(set, algorithm, graph)? {
                upper = Some(upper.map_or(bound, |u| u.max(bound)));
            }
        }
    }
    let upper = upper.ok_or(RangeError::NoComparedData)?;

    let range = SharedRange {
        min: (global_min * LOWER_PADDING).max(MIN_AXIS_VALUE),
        max: upper * UPPER_PADDING,
    };
    if range.min >= range.max {
        return Err(RangeError::Degenerate {
            min: range.min,
            max: range.max,
        });
    }
    debug!("Shared range {range:?}");
    Ok(range)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::observation::Observation;

    fn set(values: &[(&str, &str, f64)]) -> ObservationSet {
        ObservationSet::new(
            values
                .iter()
                .map(|(a, g, v)| Observation {
                    algorithm: (*a).to_owned(),
                    graph: (*g).to_owned(),
                    value: *v,
                })
                .collect(),
        )
    }

    fn comparison(algorithms: &[&str]) -> Comparison {
        Comparison {
            algorithms: algorithms.iter().map(|a| (*a).to_owned()).collect(),
            title: algorithms.join(" vs "),
            output: PathBuf::from(format!("{}.png", algorithms.join("-"))),
        }
    }

    #[test]
    fn max_is_scoped_to_batch_and_min_is_global() {
        let set = set(&[
            ("A", "G1", 2.0),
            ("A", "G2", 4.0),
            ("B", "G1", 8.0),
            ("B", "G2", 3.0),
            ("Unused", "G1", 0.5),
            ("Unused", "G2", 100.0),
        ]);
        let engine = StatsEngine::default();

        let range =
            compute_shared_range(&[comparison(&["A"]), comparison(&["B"])], &set, &engine).unwrap();
        assert_eq!(range.min, 0.5 * 0.9);
        assert_eq!(range.max, 8.0 * 1.1);

        let only_a = compute_shared_range(&[comparison(&["A"])], &set, &engine).unwrap();
        assert_eq!(only_a.min, 0.5 * 0.9);
        assert_eq!(only_a.max, 4.0 * 1.1);
    }

    #[test]
    fn upper_bound_includes_normal_interval() {
        let set = set(&[("A", "G1", 0.1), ("A", "G1", 0.2), ("A", "G1", 0.3)]);
        let engine = StatsEngine::default();
        let range = compute_shared_range(&[comparison(&["A"])], &set, &engine).unwrap();
        let bound = engine.range_upper_bound(&set, "A", "G1").unwrap().unwrap();
        assert_eq!(range.max, bound * 1.1);
        assert!(range.max > 0.2 * 1.1);
    }

    #[test]
    fn min_is_floored_for_log_scale() {
        let set = set(&[("A", "G1", 0.0), ("A", "G2", 1.0)]);
        let range =
            compute_shared_range(&[comparison(&["A"])], &set, &StatsEngine::default()).unwrap();
        assert_eq!(range.min, MIN_AXIS_VALUE);
    }

    #[test]
    fn errors() {
        let engine = StatsEngine::default();
        assert!(matches!(
            compute_shared_range(&[comparison(&["A"])], &ObservationSet::default(), &engine),
            Err(RangeError::EmptyObservations)
        ));

        let set = set(&[("A", "G1", 1.0)]);
        assert!(matches!(
            compute_shared_range(&[comparison(&["B"])], &set, &engine),
            Err(RangeError::NoComparedData)
        ));

        let zeros = ObservationSet::new(vec![Observation {
            algorithm: "A".to_owned(),
            graph: "G1".to_owned(),
            value: 0.0,
        }]);
        assert!(matches!(
            compute_shared_range(&[comparison(&["A"])], &zeros, &engine),
            Err(RangeError::Degenerate { .. })
        ));
    }
}
