use common::{
    plot::{Figure, Panel, Plot, Series},
    table::ResultTable,
};
use eyre::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use tracing::debug;

const WRITE_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const READ_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);

const COLUMNS: &[&str] = &["data_type", "config", "write_MBps", "read_MBps"];

/// Write and read bandwidth per compression config, one panel per data type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionEffect {
    pub data_types: Vec<String>,
}

impl Default for CompressionEffect {
    fn default() -> Self {
        Self {
            data_types: ["random", "compressible", "zero"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

#[typetag::serde]
impl Plot for CompressionEffect {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn figure(&self, table: &ResultTable) -> Result<Figure> {
        let mut figure = Figure::new((15.0, 5.0), (1, self.data_types.len().max(1)))
            .with_title("Compression Algorithm Performance by Data Type");
        for (slot, data_type) in self.data_types.iter().enumerate() {
            let subset = table.filter_eq("data_type", data_type)?;
            if subset.is_empty() {
                debug!("No {data_type} compression rows");
                continue;
            }
            let panel = Panel::new(
                format!("Data Type: {data_type}"),
                "Bandwidth (MB/s)",
                subset.labels("config")?,
            )
            .with_series(Series::solid(
                "Write",
                subset.numbers("write_MBps")?,
                WRITE_COLOR,
            ))
            .with_series(Series::solid("Read", subset.numbers("read_MBps")?, READ_COLOR));
            figure.set(slot, Some(panel));
        }
        Ok(figure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> ResultTable {
        ResultTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn panel_per_data_type() {
        let t = table(
            "data_type,config,write_MBps,read_MBps\n\
             random,lz4,900,1500\n\
             zero,lz4,3000,4000\n\
             compressible,zstd,1200,1800\n\
             random,off,950,1550\n",
        );
        let figure = CompressionEffect::default().figure(&t).unwrap();
        assert_eq!(figure.grid, (1, 3));
        assert_eq!(
            figure.title.as_deref(),
            Some("Compression Algorithm Performance by Data Type")
        );
        let random = figure.panels[0].as_ref().unwrap();
        assert_eq!(random.title, "Data Type: random");
        assert_eq!(random.categories, vec!["lz4", "off"]);
        assert_eq!(random.series[1].values, vec![Some(1500.0), Some(1550.0)]);
        assert_eq!(figure.drawn().count(), 3);
    }

    #[test]
    fn missing_data_type_omits_its_panel() {
        let t = table(
            "data_type,config,write_MBps,read_MBps\n\
             random,lz4,900,1500\n\
             compressible,lz4,1100,1700\n",
        );
        let figure = CompressionEffect::default().figure(&t).unwrap();
        assert!(figure.panels[2].is_none());
        assert_eq!(figure.drawn().count(), 2);
    }
}
