use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MS_TO_S, stats::ConfidenceLevel, surface::Surface};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No comparisons configured")]
    NoComparisons,
    #[error("Comparison {0:?} lists no algorithms")]
    EmptyComparison(String),
    #[error("Comparison {title:?} lists algorithm {algorithm:?} twice")]
    DuplicateAlgorithm { title: String, algorithm: String },
    #[error("Comparisons {0:?} and {1:?} write to the same file")]
    DuplicateOutput(String, String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub settings: Settings,
    pub surface: Box<dyn Surface>,
    #[serde(default)]
    pub colors: ColorAssignment,
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Wide csv with one row per algorithm/graph pairing
    pub measurements: PathBuf,
    /// `Graph,Vertexes,Edges` csv
    pub metadata: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Raw values are divided by this, ms to s by default
    #[serde(default = "default_unit_factor")]
    pub unit_factor: f64,
    #[serde(default)]
    pub confidence_level: ConfidenceLevel,
    #[serde(default = "default_algorithm_column")]
    pub algorithm_column: String,
    #[serde(default = "default_graph_column")]
    pub graph_column: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

fn default_unit_factor() -> f64 {
    MS_TO_S
}

fn default_algorithm_column() -> String {
    "Algorithm".to_owned()
}

fn default_graph_column() -> String {
    "Graph".to_owned()
}

/// One requested chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub algorithms: Vec<String>,
    pub title: String,
    pub output: PathBuf,
}

/// Display color, passed through untouched to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorAssignment(BTreeMap<String, Color>);

impl ColorAssignment {
    pub fn get(&self, algorithm: &str) -> Option<&Color> {
        self.0.get(algorithm)
    }
}

impl<K: Into<String>, C: Into<Color>> FromIterator<(K, C)> for ColorAssignment {
    fn from_iter<T: IntoIterator<Item = (K, C)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, c)| (k.into(), c.into()))
                .collect(),
        )
    }
}

impl Config {
    /// Checks the comparison batch before any data is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.comparisons.is_empty() {
            return Err(ConfigError::NoComparisons);
        }
        let mut outputs: BTreeMap<&Path, &str> = BTreeMap::new();
        for comparison in &self.comparisons {
            if comparison.algorithms.is_empty() {
                return Err(ConfigError::EmptyComparison(comparison.title.clone()));
            }
            for (i, algorithm) in comparison.algorithms.iter().enumerate() {
                if comparison.algorithms[..i].contains(algorithm) {
                    return Err(ConfigError::DuplicateAlgorithm {
                        title: comparison.title.clone(),
                        algorithm: algorithm.clone(),
                    });
                }
            }
            if let Some(other) = outputs.insert(&comparison.output, &comparison.title) {
                return Err(ConfigError::DuplicateOutput(
                    other.to_owned(),
                    comparison.title.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Makes relative input and output paths relative to `base`, usually the
    /// directory holding the config file.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.settings.measurements,
            &mut self.settings.metadata,
            &mut self.settings.output_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
