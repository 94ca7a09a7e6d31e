use common::{
    plot::{Figure, Panel, Plot, Series},
    table::ResultTable,
};
use eyre::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

pub const ASYNC_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
pub const SYNC_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);

const COLUMNS: &[&str] = &["test_name", "sync_mode", "bandwidth_MBps"];

/// One bar per run, coloured by whether the write mode was asynchronous
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncComparison {
    /// Modes whose label contains this are drawn as async
    pub async_marker: String,
}

impl Default for SyncComparison {
    fn default() -> Self {
        Self {
            async_marker: "async".to_owned(),
        }
    }
}

impl SyncComparison {
    pub fn color(&self, sync_mode: &str) -> RGBColor {
        if sync_mode.contains(&self.async_marker) {
            ASYNC_COLOR
        } else {
            SYNC_COLOR
        }
    }
}

#[typetag::serde]
impl Plot for SyncComparison {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn figure(&self, table: &ResultTable) -> Result<Figure> {
        let sorted = table.sorted_by(&["test_name", "sync_mode"])?;
        let tests = sorted.labels("test_name")?;
        let modes = sorted.labels("sync_mode")?;

        let categories = tests
            .iter()
            .zip(&modes)
            .map(|(test, mode)| format!("{test} / {mode}"))
            .collect();
        let colors = modes.iter().map(|mode| self.color(mode)).collect();
        let panel = Panel::new("Sync vs Async Write Performance", "Bandwidth (MB/s)", categories)
            .with_series(Series::per_bar(
                "Bandwidth",
                sorted.numbers("bandwidth_MBps")?,
                colors,
            ))
            .with_legend(vec![
                ("Async".to_owned(), ASYNC_COLOR),
                ("Sync".to_owned(), SYNC_COLOR),
            ]);

        let mut figure = Figure::new((12.0, 6.0), (1, 1));
        figure.set(0, Some(panel));
        Ok(figure)
    }
}
