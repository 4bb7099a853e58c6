use bar_chart::BarChart;
use common::surface::Surface;
use spec_dump::SpecDump;
use tracing::debug;

/// Crate names of the bundled surfaces, used for log filter directives.
pub const PLOT_MODULES: &[&str] = &["bar_chart", "spec_dump"];

/// Links every bundled surface so its `typetag` registration is available
/// when the config is deserialized.
pub fn init_plots() {
    let surfaces: [Box<dyn Surface>; 2] =
        [Box::new(BarChart::default()), Box::new(SpecDump::default())];
    for surface in &surfaces {
        debug!("Registered surface {}", surface.name());
    }
}
