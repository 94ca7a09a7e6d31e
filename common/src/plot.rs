use core::fmt::Debug;
use std::{ops::Range, path::Path};

use downcast_rs::{Downcast, impl_downcast};
use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use plotters::{
    coord::{
        Shift,
        ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter},
    },
    prelude::*,
};
use tracing::debug;

use crate::{pivot::PivotTable, table::ResultTable, util::Colormap};

/// Share of each category slot covered by its bars
const BAR_SPAN: f64 = 0.8;
/// Length of one dash of a reference line, in category slots
const DASH: f64 = 0.08;

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Downcast + Send + Sync {
    /// The columns this plot reads, checked right after loading
    fn required_columns(&self) -> &'static [&'static str];
    /// Lays out the figure for a loaded, non-empty table
    ///
    /// Arguments:
    /// * `table` - The category results, already checked against [`Plot::required_columns`]
    fn figure(&self, table: &ResultTable) -> Result<Figure>;
}
clone_trait_object!(Plot);
impl_downcast!(Plot);

/// A grid of bar panels, sized in inches
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub width: f64,
    pub height: f64,
    pub grid: (usize, usize),
    pub title: Option<String>,
    /// Row-major, `None` slots stay blank
    pub panels: Vec<Option<Panel>>,
}

impl Figure {
    pub fn new(size: (f64, f64), grid: (usize, usize)) -> Self {
        Self {
            width: size.0,
            height: size.1,
            grid,
            title: None,
            panels: vec![None; grid.0 * grid.1],
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn set(&mut self, slot: usize, panel: Option<Panel>) {
        self.panels[slot] = panel;
    }

    pub fn drawn(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter().flatten()
    }

    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        (
            (self.width * dpi as f64).round() as u32,
            (self.height * dpi as f64).round() as u32,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(RGBColor),
    PerBar(Vec<RGBColor>),
}

impl Fill {
    pub fn at(&self, bar: usize) -> RGBColor {
        match self {
            Fill::Solid(color) => *color,
            Fill::PerBar(colors) => colors.get(bar).copied().unwrap_or(BLACK),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// One entry per panel category, `None` draws no bar
    pub values: Vec<Option<f64>>,
    pub fill: Fill,
}

impl Series {
    pub fn solid(label: impl Into<String>, values: Vec<Option<f64>>, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            values,
            fill: Fill::Solid(color),
        }
    }

    pub fn per_bar(label: impl Into<String>, values: Vec<Option<f64>>, colors: Vec<RGBColor>) -> Self {
        Self {
            label: label.into(),
            values,
            fill: Fill::PerBar(colors),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub legend_title: Option<String>,
    pub legend: Vec<(String, RGBColor)>,
    pub reference_line: Option<f64>,
}

impl Panel {
    pub fn new(title: impl Into<String>, y_label: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            title: title.into(),
            y_label: y_label.into(),
            categories,
            series: Vec::new(),
            legend_title: None,
            legend: Vec::new(),
            reference_line: None,
        }
    }

    /// Grouped bars, one group per pivot row and one series per pivot column
    pub fn grouped(
        title: impl Into<String>,
        y_label: impl Into<String>,
        pivot: &PivotTable,
        colormap: Colormap,
    ) -> Self {
        let colors = colormap.sample(pivot.columns.len());
        pivot
            .column_labels()
            .into_iter()
            .zip(colors)
            .enumerate()
            .fold(
                Panel::new(title, y_label, pivot.index_labels()),
                |panel, (c, (label, color))| {
                    panel.with_series(Series::solid(label, pivot.column(c), color))
                },
            )
    }

    /// Labelled solid series also get a legend entry
    pub fn with_series(mut self, series: Series) -> Self {
        if let Fill::Solid(color) = series.fill
            && !series.label.is_empty()
        {
            self.legend.push((series.label.clone(), color));
        }
        self.series.push(series);
        self
    }

    pub fn with_legend_title(mut self, title: impl Into<String>) -> Self {
        self.legend_title = Some(title.into());
        self
    }

    pub fn with_legend(mut self, entries: Vec<(String, RGBColor)>) -> Self {
        self.legend = entries;
        self
    }

    pub fn with_reference_line(mut self, y: f64) -> Self {
        self.reference_line = Some(y);
        self
    }

    fn value_range(&self) -> (f64, f64) {
        let (low, high) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten().copied())
            .chain(self.reference_line)
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let high = if high <= low { low + 1.0 } else { high };
        let pad = (high - low) * 0.05;
        (if low < 0.0 { low - pad } else { low }, high + pad)
    }
}

fn points(size: f64, scale: f64) -> f64 {
    size * scale
}

fn category_label(categories: &[String], x: f64) -> String {
    let slot = x.round();
    if slot < 0.0 || (x - slot).abs() > 1e-6 {
        return String::new();
    }
    categories.get(slot as usize).cloned().unwrap_or_default()
}

/// Category slots on the x axis: slot `i` spans `i - 0.5..i + 0.5` and ticks sit on slot centres
#[derive(Debug, Clone)]
struct CategoryAxis {
    labels: Vec<String>,
}

impl CategoryAxis {
    fn slots(&self) -> usize {
        self.labels.len().max(1)
    }
}

impl Ranged for CategoryAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let share = (value + 0.5) / self.slots() as f64;
        limit.0 + (share * (limit.1 - limit.0) as f64).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, _hint: Hint) -> Vec<f64> {
        (0..self.labels.len()).map(|i| i as f64).collect()
    }

    fn range(&self) -> Range<f64> {
        -0.5..self.slots() as f64 - 0.5
    }
}

impl ValueFormatter<f64> for CategoryAxis {
    fn format_ext(&self, value: &f64) -> String {
        category_label(&self.labels, *value)
    }
}

/// Rasterizes a figure into a PNG, replacing any existing file
pub fn render_figure(figure: &Figure, path: &Path, dpi: u32) -> Result<()> {
    let (width, height) = figure.pixel_size(dpi);
    let scale = dpi as f64 / 72.0;
    debug!("Rendering {width}x{height} figure to {}", path.display());

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let body = match &figure.title {
        Some(title) => root.titled(title, ("sans-serif", points(14.0, scale)))?,
        None => root.clone(),
    };
    for (area, panel) in body.split_evenly(figure.grid).iter().zip(&figure.panels) {
        if let Some(panel) = panel {
            draw_panel(area, panel, scale)?;
        }
    }
    root.present()?;
    Ok(())
}

fn draw_panel(area: &DrawingArea<BitMapBackend<'_>, Shift>, panel: &Panel, scale: f64) -> Result<()> {
    let slots = panel.categories.len().max(1);
    let (low, high) = panel.value_range();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", points(12.0, scale)))
        .margin(points(6.0, scale) as u32)
        .x_label_area_size(points(30.0, scale) as u32)
        .y_label_area_size(points(42.0, scale) as u32)
        .build_cartesian_2d(
            CategoryAxis {
                labels: panel.categories.clone(),
            },
            low..high,
        )?;

    let x_label = |x: &f64| category_label(&panel.categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&x_label)
        .y_desc(panel.y_label.as_str())
        .label_style(("sans-serif", points(8.0, scale)))
        .axis_desc_style(("sans-serif", points(10.0, scale)))
        .draw()?;

    let width = BAR_SPAN / panel.series.len().max(1) as f64;
    for (j, series) in panel.series.iter().enumerate() {
        let offset = -BAR_SPAN / 2.0 + j as f64 * width;
        chart.draw_series(series.values.iter().enumerate().filter_map(|(i, value)| {
            value.map(|v| {
                let x = i as f64 + offset;
                Rectangle::new([(x, 0.0), (x + width, v)], series.fill.at(i).filled())
            })
        }))?;
    }

    if let Some(y) = panel.reference_line {
        let end = slots as f64 - 0.5;
        let stroke = points(1.0, scale).max(1.0) as u32;
        let dashes = (0..)
            .map(|i| -0.5 + i as f64 * DASH * 2.0)
            .take_while(|x0| *x0 < end)
            .map(|x0| {
                PathElement::new(
                    vec![(x0, y), ((x0 + DASH).min(end), y)],
                    RED.mix(0.5).stroke_width(stroke),
                )
            });
        chart.draw_series(dashes)?;
    }

    if !panel.legend.is_empty() {
        let marker = points(4.0, scale) as i32;
        if let Some(title) = &panel.legend_title {
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(title.as_str())
                .legend(|(x, y)| Rectangle::new([(x, y), (x, y)], TRANSPARENT.filled()));
        }
        for (label, color) in &panel.legend {
            let color = *color;
            chart
                .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                .label(label.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - marker), (x + 2 * marker, y + marker)], color.filled())
                });
        }
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", points(8.0, scale)))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }
    Ok(())
}
