use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use thiserror::Error;

use crate::{observation::ObservationSet, util::mean_and_std_dev};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidenceLevel(f64),
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Two-sided confidence level in the open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    pub fn new(level: f64) -> Result<Self, StatsError> {
        if level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(StatsError::InvalidConfidenceLevel(level))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Cumulative probability of the upper critical value, `1 - (1 - c) / 2`.
    fn upper_quantile(self) -> f64 {
        1.0 - (1.0 - self.0) / 2.0
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self(DEFAULT_CONFIDENCE_LEVEL)
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = StatsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceLevel> for f64 {
    fn from(value: ConfidenceLevel) -> Self {
        value.0
    }
}

/// Summary of every trial of one algorithm on one graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub algorithm: String,
    pub graph: String,
    pub mean: f64,
    /// `None` when `n == 1`
    pub std_dev: Option<f64>,
    /// `None` when `n == 1`
    pub ci_half_width: Option<f64>,
    pub n: usize,
}

impl GroupStat {
    /// A single-sample group has no defined spread.
    pub fn is_degenerate(&self) -> bool {
        self.n < 2
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsEngine {
    confidence: ConfidenceLevel,
}

impl StatsEngine {
    pub fn new(confidence: ConfidenceLevel) -> Self {
        Self { confidence }
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    /// Two-tailed Student's t critical value for `df` degrees of freedom.
    pub fn critical_t(&self, df: usize) -> Result<f64, StatsError> {
        let dist = StudentsT::new(0.0, 1.0, df as f64)
            .map_err(|e| StatsError::Distribution(e.to_string()))?;
        Ok(dist.inverse_cdf(self.confidence.upper_quantile()))
    }

    /// Two-tailed standard normal critical value (1.96 at 95%).
    pub fn critical_z(&self) -> Result<f64, StatsError> {
        let dist =
            Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
        Ok(dist.inverse_cdf(self.confidence.upper_quantile()))
    }

    /// Mean and t-based confidence half-width of one pairing. Returns `None`
    /// when the pairing has no observations.
    pub fn group_stat(
        &self,
        set: &ObservationSet,
        algorithm: &str,
        graph: &str,
    ) -> Result<Option<GroupStat>, StatsError> {
        let samples = set.samples(algorithm, graph);
        let Some((mean, std_dev)) = mean_and_std_dev(&samples) else {
            return Ok(None);
        };
        let n = samples.len();

        let ci_half_width = match std_dev {
            Some(sd) => Some(sd / (n as f64).sqrt() * self.critical_t(n - 1)?),
            None => None,
        };

        Ok(Some(GroupStat {
            algorithm: algorithm.to_owned(),
            graph: graph.to_owned(),
            mean,
            std_dev,
            ci_half_width,
            n,
        }))
    }

    /// Cheap upper bound of one pairing's interval using the normal critical
    /// value. Only meant for sizing axes, never for drawn error bars.
    pub fn range_upper_bound(
        &self,
        set: &ObservationSet,
        algorithm: &str,
        graph: &str,
    ) -> Result<Option<f64>, StatsError> {
        let samples = set.samples(algorithm, graph);
        let Some((mean, std_dev)) = mean_and_std_dev(&samples) else {
            return Ok(None);
        };
        let Some(sd) = std_dev else {
            return Ok(Some(mean));
        };
        let se = sd / (samples.len() as f64).sqrt();
        Ok(Some(mean + self.critical_z()? * se))
    }
}
