use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs::read_to_string;

use crate::plot::Plot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The compared systems, used in the report title
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    pub categories: Vec<Category>,
    /// Replaces the built-in conclusion section
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl Config {
    pub async fn from_file(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)
            .await
            .wrap_err_with(|| format!("Read config {}", path.display()))?;
        serde_yml::from_str(&contents).wrap_err_with(|| format!("Parse config {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub results_root: PathBuf,
    pub output_dir: PathBuf,
    pub report_file: String,
    pub dpi: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from("results"),
            output_dir: PathBuf::from("analysis"),
            report_file: "benchmark_report.md".to_owned(),
            dpi: 150,
        }
    }
}

impl Settings {
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    /// Where the report lives, image links are relative to it
    pub fn report_dir(&self) -> PathBuf {
        self.report_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// One benchmark result file and how it is plotted and reported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Human readable name for progress lines and image alt text
    pub label: String,
    /// Relative to [`Settings::results_root`]
    pub input: PathBuf,
    /// File name inside [`Settings::output_dir`]
    pub image: String,
    pub heading: String,
    pub table_heading: String,
    pub plot: Box<dyn Plot>,
}

impl Category {
    /// `<name>/<name>_summary.csv`, the layout most benchmark scripts write
    pub fn summary_input(name: &str) -> PathBuf {
        Path::new(name).join(format!("{name}_summary.csv"))
    }

    pub fn input_path(&self, settings: &Settings) -> PathBuf {
        settings.results_root.join(&self.input)
    }

    pub fn image_path(&self, settings: &Settings) -> PathBuf {
        settings.output_dir.join(&self.image)
    }
}
