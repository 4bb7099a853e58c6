use std::{fs::write, path::PathBuf};

use common::{chart::ChartSpec, surface::Surface};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Writes the assembled chart instructions as json next to the requested
/// output, swapping its extension for `.json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecDump {
    pub pretty: bool,
}

impl SpecDump {
    pub fn dump_path(chart: &ChartSpec) -> PathBuf {
        chart.output.with_extension("json")
    }
}

#[typetag::serde]
impl Surface for SpecDump {
    fn name(&self) -> &'static str {
        "SpecDump"
    }

    fn draw(&self, chart: &ChartSpec) -> Result<()> {
        let path = Self::dump_path(chart);
        let data = if self.pretty {
            serde_json::to_string_pretty(chart)?
        } else {
            serde_json::to_string(chart)?
        };
        debug!("Writing chart spec to {path:?}");
        write(&path, data).wrap_err_with(|| format!("Write {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::read_to_string, path::Path};

    use common::{
        chart::{AxisScale, BarSpec, Series},
        range::SharedRange,
    };

    use super::*;

    fn chart(dir: &Path) -> ChartSpec {
        ChartSpec {
            title: "Prim: Spla vs Gunrock".to_owned(),
            output: dir.join("comparison_prim.png"),
            categories: vec!["road".to_owned()],
            series: vec![Series {
                label: "PrimSpla".to_owned(),
                color: None,
            }],
            bar_width: 0.7,
            bars: vec![BarSpec {
                x: 0.0,
                height: 0.25,
                error: None,
                color: None,
                label: "PrimSpla".to_owned(),
                graph: "road".to_owned(),
            }],
            y_scale: AxisScale::Log,
            y_range: SharedRange { min: 0.1, max: 1.0 },
            y_label: "Time (seconds)".to_owned(),
        }
    }

    #[test]
    fn writes_json_beside_output() {
        let dir = tempfile::tempdir().unwrap();
        let chart = chart(dir.path());
        SpecDump::default().draw(&chart).unwrap();

        let path = dir.path().join("comparison_prim.json");
        assert_eq!(SpecDump::dump_path(&chart), path);
        let value: serde_json::Value =
            serde_json::from_str(&read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["title"], "Prim: Spla vs Gunrock");
        assert_eq!(value["y_scale"], "Log");
        assert_eq!(value["bars"][0]["height"], 0.25);
        assert!(value["bars"][0]["error"].is_null());
    }

    #[test]
    fn overwrites_previous_dump() {
        let dir = tempfile::tempdir().unwrap();
        let mut chart = chart(dir.path());
        let surface = SpecDump { pretty: true };
        surface.draw(&chart).unwrap();
        chart.title = "second".to_owned();
        surface.draw(&chart).unwrap();

        let data = read_to_string(SpecDump::dump_path(&chart)).unwrap();
        assert!(data.contains("\"second\""));
        assert!(!data.contains("Prim: Spla vs Gunrock"));
    }
}
