use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::{
    config::Category,
    pipeline::{CategoryResult, ImageOutcome, LoadOutcome},
    table::ResultTable,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const CONCLUSION: &str = "
### When to choose mdadm
- Native Linux support is required
- Memory-constrained systems
- RAID reshape is needed
- Simple RAID layouts

### When to choose ZFS
- Data integrity matters (research/HPC)
- Snapshots or clones are needed
- Plenty of memory is available (1GB per TB)
- Built-in compression is wanted

### Performance summary
| Metric | mdadm | ZFS | Notes |
|------|-------|-----|------|
| Sequential read | ★★★★☆ | ★★★★☆ | Comparable |
| Sequential write | ★★★★★ | ★★★★☆ | mdadm slightly faster |
| Random read | ★★★☆☆ | ★★★★☆ | ZFS ARC advantage |
| Random write | ★★★★☆ | ★★★☆☆ | mdadm slightly faster |
| Sync write | ★★☆☆☆ | ★★★★☆ | ZFS+SLOG advantage |
";

/// Markdown report, assembled in order and joined by newlines
#[derive(Debug, Clone)]
pub struct Report {
    parts: Vec<String>,
    sections: usize,
    /// Directory the report is written to
    base: PathBuf,
}

impl Report {
    pub fn new(name: &str, generated: &str) -> Self {
        Self {
            parts: vec![
                format!("# {name} Performance Comparison Report\n"),
                format!("Generated: {generated}\n"),
            ],
            sections: 0,
            base: PathBuf::new(),
        }
    }

    pub fn linking_from(mut self, report_dir: impl Into<PathBuf>) -> Self {
        self.base = report_dir.into();
        self
    }

    fn heading(&mut self, heading: &str) {
        self.sections += 1;
        self.parts.push(format!("\n## {}. {heading}\n", self.sections));
    }

    /// Absent categories only get their heading
    pub fn add_category(&mut self, category: &Category, result: &CategoryResult) {
        self.heading(&category.heading);
        match &result.load {
            LoadOutcome::Absent => {}
            LoadOutcome::Failed(err) => {
                self.parts.push(format!("_Results could not be loaded: {err:#}_\n"));
            }
            LoadOutcome::Loaded(table) => {
                self.parts.push(format!("### {}\n", category.table_heading));
                self.parts.push(markdown_table(table));
                match &result.image {
                    ImageOutcome::Saved(path) => self
                        .parts
                        .push(format!(
                            "\n![{}]({})\n",
                            category.label,
                            image_link(path, &self.base)
                        )),
                    ImageOutcome::Failed(err) => self
                        .parts
                        .push(format!("\n_Chart could not be rendered: {err:#}_\n")),
                    ImageOutcome::NotRendered | ImageOutcome::Skipped => {}
                }
            }
        }
    }

    pub fn add_conclusion(&mut self, conclusion: Option<&str>) {
        self.heading("Conclusions and Recommendations");
        self.parts.push(conclusion.unwrap_or(CONCLUSION).to_owned());
    }

    pub fn render(&self) -> String {
        self.parts.join("\n")
    }
}

/// Path of `image` as seen from `report_dir`, with `/` separators
fn image_link(image: &Path, report_dir: &Path) -> String {
    let image = image.components().collect::<Vec<_>>();
    let base = report_dir.components().collect::<Vec<_>>();
    let shared = image
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();
    base[shared..]
        .iter()
        .map(|_| "..".to_owned())
        .chain(
            image[shared..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .join("/")
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Pipe table with cells verbatim, numeric columns right aligned
pub fn markdown_table(table: &ResultTable) -> String {
    let headers = table.headers().iter().map(|h| escape(h)).collect::<Vec<_>>();
    let rows = table
        .raw_rows()
        .map(|row| row.iter().map(|cell| escape(cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let widths = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain([header.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect::<Vec<_>>();
    let numeric = table
        .kinds()
        .iter()
        .map(|kind| kind.is_numeric())
        .collect::<Vec<_>>();

    let line = |cells: &[String]| {
        let cells = cells
            .iter()
            .zip(&widths)
            .zip(&numeric)
            .map(|((cell, width), numeric)| pad(cell, *width, *numeric))
            .join(" | ");
        format!("| {cells} |")
    };
    let rule = widths
        .iter()
        .zip(&numeric)
        .map(|(width, numeric)| {
            let dashes = "-".repeat(width + 1);
            if *numeric {
                format!("{dashes}:")
            } else {
                format!(":{dashes}")
            }
        })
        .join("|");

    std::iter::once(line(&headers[..]))
        .chain([format!("|{rule}|")])
        .chain(rows.iter().map(|row| line(&row[..])))
        .join("\n")
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right {
        format!("{fill}{cell}")
    } else {
        format!("{cell}{fill}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> ResultTable {
        ResultTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn renders_pipe_table() {
        let t = table("test_name,block_size,bandwidth_MBps\nmdadm,4k,500\nzfs,1m,1800.5\n");
        assert_eq!(
            markdown_table(&t),
            "\
| test_name | block_size | bandwidth_MBps |
|:----------|:-----------|---------------:|
| mdadm     | 4k         |            500 |
| zfs       | 1m         |         1800.5 |"
        );
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let t = table("a,b\n");
        assert_eq!(markdown_table(&t).lines().count(), 2);
    }

    #[test]
    fn escapes_pipes() {
        let t = table("config\n\"lz4|on\"\n");
        assert!(markdown_table(&t).contains("lz4\\|on"));
    }

    #[test]
    fn numbers_sections_and_ends_with_conclusion() {
        let mut report = Report::new("mdadm vs ZFS", "2026-01-02 03:04");
        report.heading("Throughput");
        report.add_conclusion(None);
        let text = report.render();
        assert!(text.starts_with("# mdadm vs ZFS Performance Comparison Report\n\nGenerated: 2026-01-02 03:04\n"));
        assert!(text.contains("\n## 1. Throughput\n"));
        assert!(text.contains("\n## 2. Conclusions and Recommendations\n"));
        assert!(text.contains("| Sync write | ★★☆☆☆ | ★★★★☆ | ZFS+SLOG advantage |"));

        let mut custom = Report::new("a vs b", "now");
        custom.add_conclusion(Some("Nothing to add."));
        assert!(custom.render().ends_with("Nothing to add."));
    }

    #[test]
    fn image_links_are_relative() {
        let image = Path::new("/tmp/analysis/cache_effect.png");
        assert_eq!(image_link(image, Path::new("/tmp/analysis")), "cache_effect.png");
        assert_eq!(
            image_link(image, Path::new("/tmp/analysis/reports")),
            "../cache_effect.png"
        );
        assert_eq!(
            image_link(Path::new("analysis/cache_effect.png"), Path::new("")),
            "analysis/cache_effect.png"
        );
    }
}
