use common::{chart::ChartSpec, config::Color as SeriesColor, surface::Surface};
use eyre::Result;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// matplotlib's default categorical palette
const TAB10: [(&str, RGBColor); 10] = [
    ("tab:blue", RGBColor(31, 119, 180)),
    ("tab:orange", RGBColor(255, 127, 14)),
    ("tab:green", RGBColor(44, 160, 44)),
    ("tab:red", RGBColor(214, 39, 40)),
    ("tab:purple", RGBColor(148, 103, 189)),
    ("tab:brown", RGBColor(140, 86, 75)),
    ("tab:pink", RGBColor(227, 119, 194)),
    ("tab:gray", RGBColor(127, 127, 127)),
    ("tab:olive", RGBColor(188, 189, 34)),
    ("tab:cyan", RGBColor(23, 190, 207)),
];

/// Grouped bar chart with error bars on a log scaled y axis. Writes svg when
/// the output ends in `.svg`, a bitmap otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarChart {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    /// Width of the error bar caps in pixels
    pub cap_width: u32,
}

impl Default for BarChart {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            font_size: 16,
            cap_width: 10,
        }
    }
}

#[typetag::serde]
impl Surface for BarChart {
    fn name(&self) -> &'static str {
        "BarChart"
    }

    fn draw(&self, chart: &ChartSpec) -> Result<()> {
        let size = (self.width, self.height);
        let is_svg = chart
            .output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        debug!("Rendering {:?}, svg: {is_svg}", chart.output);
        if is_svg {
            self.draw_on(SVGBackend::new(&chart.output, size).into_drawing_area(), chart)
        } else {
            self.draw_on(
                BitMapBackend::new(&chart.output, size).into_drawing_area(),
                chart,
            )
        }
    }
}

impl BarChart {
    fn draw_on<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
        spec: &ChartSpec,
    ) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        let (y_min, y_max) = (spec.y_range.min, spec.y_range.max);
        let x_max = spec.categories.len().max(1) as f64 - 0.5;
        let font = ("sans-serif", self.font_size);

        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(spec.title.as_str(), ("sans-serif", self.font_size + 8))
            .margin(10)
            .x_label_area_size((self.font_size * 3) as i32)
            .y_label_area_size((self.font_size * 5) as i32)
            .build_cartesian_2d(-0.5f64..x_max, (y_min..y_max).log_scale())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .y_desc(spec.y_label.as_str())
            .label_style(font)
            .draw()?;

        let half = spec.bar_width / 2.0;
        for (idx, series) in spec.series.iter().enumerate() {
            let color = resolve_color(series.color.as_ref(), idx);
            let bars = spec.bars.iter().filter(|bar| bar.label == series.label);

            chart
                .draw_series(bars.clone().map(|bar| {
                    Rectangle::new(
                        [(bar.x - half, y_min), (bar.x + half, bar.height.max(y_min))],
                        color.filled(),
                    )
                }))?
                .label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

            chart.draw_series(bars.filter_map(|bar| {
                let error = bar.error?;
                Some(ErrorBar::new_vertical(
                    bar.x,
                    (bar.height - error).max(y_min),
                    bar.height,
                    (bar.height + error).min(y_max),
                    BLACK.stroke_width(1),
                    self.cap_width,
                ))
            }))?;
        }

        let label_style =
            TextStyle::from(font.into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        for (idx, category) in spec.categories.iter().enumerate() {
            let (x, y) = chart.backend_coord(&(idx as f64, y_min));
            root.draw(&Text::new(
                category.as_str(),
                (x, y + 6),
                label_style.clone(),
            ))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(font)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

/// Accepts matplotlib `tab:*` names, a few basic names and `#rrggbb`.
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let color = color.trim().to_lowercase();
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }
    let color = if color == "tab:grey" { "tab:gray" } else { &color };
    if let Some((_, rgb)) = TAB10.iter().find(|(name, _)| *name == color) {
        return Some(*rgb);
    }
    match color {
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "cyan" => Some(CYAN),
        "magenta" => Some(MAGENTA),
        "yellow" => Some(YELLOW),
        _ => None,
    }
}

/// Color of the `idx`th series, falling back to the default palette.
fn resolve_color(color: Option<&SeriesColor>, idx: usize) -> RGBColor {
    let fallback = TAB10[idx % TAB10.len()].1;
    match color {
        Some(SeriesColor(name)) => parse_color(name).unwrap_or_else(|| {
            warn!("Unknown color {name:?}, using palette color");
            fallback
        }),
        None => fallback,
    }
}
