use common::{
    pivot::PivotTable,
    plot::{Figure, Panel, Plot},
    table::ResultTable,
    util::Colormap,
};
use eyre::Result;
use serde::{Deserialize, Serialize};

const COLUMNS: &[&str] = &["test_name", "rw_type", "iodepth", "lat_p99_us", "iops"];

/// P99 latency and IOPS of random 4k I/O by queue depth.
///
/// Latency panels fill the top row, IOPS panels the bottom row, reads on the left.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyComparison {
    pub latency_colormap: Colormap,
    pub iops_colormap: Colormap,
}

impl Default for LatencyComparison {
    fn default() -> Self {
        Self {
            latency_colormap: Colormap::RdYlBu,
            iops_colormap: Colormap::Greens,
        }
    }
}

#[typetag::serde]
impl Plot for LatencyComparison {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn figure(&self, table: &ResultTable) -> Result<Figure> {
        let mut figure = Figure::new((14.0, 10.0), (2, 2));
        for (col, (rw_type, name)) in [("randread", "Read"), ("randwrite", "Write")]
            .into_iter()
            .enumerate()
        {
            let subset = table.filter_eq("rw_type", rw_type)?;
            if subset.is_empty() {
                continue;
            }
            let latency = PivotTable::mean(&subset, "test_name", "iodepth", "lat_p99_us")?;
            let iops = PivotTable::mean(&subset, "test_name", "iodepth", "iops")?;
            figure.set(
                col,
                (!latency.is_empty()).then(|| {
                    Panel::grouped(
                        format!("Random {name} P99 Latency"),
                        "Latency (µs)",
                        &latency,
                        self.latency_colormap,
                    )
                    .with_legend_title("iodepth")
                }),
            );
            figure.set(
                2 + col,
                (!iops.is_empty()).then(|| {
                    Panel::grouped(
                        format!("Random {name} IOPS"),
                        "IOPS",
                        &iops,
                        self.iops_colormap,
                    )
                    .with_legend_title("iodepth")
                }),
            );
        }
        Ok(figure)
    }
}
