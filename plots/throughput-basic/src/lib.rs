use common::{
    pivot::PivotTable,
    plot::{Figure, Panel, Plot},
    table::ResultTable,
    util::Colormap,
};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

const COLUMNS: &[&str] = &["test_name", "block_size", "rw_type", "bandwidth_MBps"];

/// Sequential write and read bandwidth, grouped by block size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThroughputComparison {
    pub write_colormap: Colormap,
    pub read_colormap: Colormap,
}

impl Default for ThroughputComparison {
    fn default() -> Self {
        Self {
            write_colormap: Colormap::Viridis,
            read_colormap: Colormap::Plasma,
        }
    }
}

#[typetag::serde]
impl Plot for ThroughputComparison {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn figure(&self, table: &ResultTable) -> Result<Figure> {
        let mut figure = Figure::new((14.0, 6.0), (1, 2));
        for (slot, (rw_type, title, colormap)) in [
            ("write", "Sequential Write Throughput", self.write_colormap),
            ("read", "Sequential Read Throughput", self.read_colormap),
        ]
        .into_iter()
        .enumerate()
        {
            let pivot = bandwidth_pivot(table, rw_type)?;
            debug!("{rw_type}: {} tests x {} block sizes", pivot.index.len(), pivot.columns.len());
            figure.set(
                slot,
                (!pivot.is_empty()).then(|| {
                    Panel::grouped(title, "Bandwidth (MB/s)", &pivot, colormap)
                        .with_legend_title("Block Size")
                }),
            );
        }
        Ok(figure)
    }
}

/// Mean bandwidth per test and block size for one I/O direction
pub fn bandwidth_pivot(table: &ResultTable, rw_type: &str) -> Result<PivotTable> {
    let subset = table.filter_eq("rw_type", rw_type)?;
    Ok(PivotTable::mean(
        &subset,
        "test_name",
        "block_size",
        "bandwidth_MBps",
    )?)
}
