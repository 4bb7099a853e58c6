pub mod chart;
pub mod config;
pub mod metadata;
pub mod observation;
pub mod order;
pub mod pipeline;
pub mod range;
pub mod stats;
pub mod surface;
pub mod util;

/// Benchmark harness timings are in milliseconds
pub const MS_TO_S: f64 = 1000.0;
