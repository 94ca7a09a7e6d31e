use common::{
    plot::{Figure, Panel, Plot, Series},
    table::ResultTable,
};
use eyre::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

const COLD_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const WARM_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const SPEEDUP_COLOR: RGBColor = RGBColor(0x9b, 0x59, 0xb6);

const COLUMNS: &[&str] = &[
    "test_name",
    "arc_size",
    "cold_read_MBps",
    "warm_read_MBps",
    "speedup",
];

/// Cold against warm reads for each ARC size, plus the measured speedup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheEffect {
    /// Where the dashed "no effect" line is drawn on the speedup panel
    pub reference_speedup: f64,
}

impl Default for CacheEffect {
    fn default() -> Self {
        Self {
            reference_speedup: 1.0,
        }
    }
}

#[typetag::serde]
impl Plot for CacheEffect {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn figure(&self, table: &ResultTable) -> Result<Figure> {
        let categories = table
            .labels("test_name")?
            .into_iter()
            .zip(table.labels("arc_size")?)
            .map(|(test, arc)| format!("{test} ARC:{arc}"))
            .collect::<Vec<_>>();

        let reads = Panel::new(
            "ARC Cache Effect: Cold vs Warm Read",
            "Bandwidth (MB/s)",
            categories.clone(),
        )
        .with_series(Series::solid(
            "Cold Read",
            table.numbers("cold_read_MBps")?,
            COLD_COLOR,
        ))
        .with_series(Series::solid(
            "Warm Read",
            table.numbers("warm_read_MBps")?,
            WARM_COLOR,
        ));
        let speedup = Panel::new("Cache Speedup Factor", "Speedup (x)", categories)
            .with_series(Series::solid("", table.numbers("speedup")?, SPEEDUP_COLOR))
            .with_reference_line(self.reference_speedup);

        let mut figure = Figure::new((14.0, 6.0), (1, 2));
        figure.set(0, Some(reads));
        figure.set(1, Some(speedup));
        Ok(figure)
    }
}
