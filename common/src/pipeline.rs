use std::path::PathBuf;

use chrono::Local;
use eyre::{Context, Report as ErrReport, Result};
use futures::future::join_all;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tokio::fs::{create_dir_all, write};
use tracing::{debug, info, warn};

use crate::{
    config::{Category, Config, Settings},
    plot::render_figure,
    report::{Report, TIMESTAMP_FORMAT},
    table::ResultTable,
    util::remove_stale,
};

const BANNER_WIDTH: usize = 60;

#[derive(Debug)]
pub enum LoadOutcome {
    /// No result file, nothing was run for this category
    Absent,
    Loaded(ResultTable),
    Failed(ErrReport),
}

#[derive(Debug)]
pub enum ImageOutcome {
    /// The table was absent or could not be loaded
    NotRendered,
    /// The table had no rows
    Skipped,
    Saved(PathBuf),
    Failed(ErrReport),
}

#[derive(Debug)]
pub struct CategoryResult {
    pub name: String,
    pub load: LoadOutcome,
    pub image: ImageOutcome,
}

impl CategoryResult {
    pub fn failure(&self) -> Option<String> {
        match (&self.load, &self.image) {
            (LoadOutcome::Failed(err), _) => Some(format!("{}: {err:#}", self.name)),
            (_, ImageOutcome::Failed(err)) => Some(format!("{}: {err:#}", self.name)),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: PathBuf,
    pub results: Vec<CategoryResult>,
}

impl RunSummary {
    pub fn failures(&self) -> Vec<String> {
        self.results.iter().filter_map(CategoryResult::failure).collect()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Loads a category's table and checks the columns its plot reads.
///
/// A table without rows is never plotted, so its columns are not checked.
pub async fn load_category(category: &Category, settings: &Settings) -> LoadOutcome {
    let path = category.input_path(settings);
    match ResultTable::read(&path).await {
        Ok(None) => LoadOutcome::Absent,
        Ok(Some(table)) if table.is_empty() => LoadOutcome::Loaded(table),
        Ok(Some(table)) => match table.require_columns(category.plot.required_columns()) {
            Ok(()) => LoadOutcome::Loaded(table),
            Err(err) => LoadOutcome::Failed(
                ErrReport::new(err).wrap_err(format!("Validate {}", path.display())),
            ),
        },
        Err(err) => LoadOutcome::Failed(err),
    }
}

/// Renders a category's figure, overwriting the previous image
pub fn visualize(category: &Category, load: &LoadOutcome, settings: &Settings) -> ImageOutcome {
    let LoadOutcome::Loaded(table) = load else {
        return ImageOutcome::NotRendered;
    };
    if table.is_empty() {
        return ImageOutcome::Skipped;
    }

    let path = category.image_path(settings);
    let rendered = category
        .plot
        .figure(table)
        .and_then(|figure| {
            debug!(
                "{} figure has {} of {} panels",
                category.name,
                figure.drawn().count(),
                figure.panels.len()
            );
            render_figure(&figure, &path, settings.dpi)
        })
        .wrap_err_with(|| format!("Plot {}", category.name));
    match rendered {
        Ok(()) => ImageOutcome::Saved(path),
        Err(err) => ImageOutcome::Failed(err),
    }
}

pub fn build_report(config: &Config, results: &[CategoryResult], generated: &str) -> Report {
    let mut report = Report::new(&config.name, generated).linking_from(config.settings.report_dir());
    for (category, result) in config.categories.iter().zip(results) {
        report.add_category(category, result);
    }
    report.add_conclusion(config.conclusion.as_deref());
    report
}

/// Console lines for one category: what was loaded, then what was plotted
fn progress(
    category: &Category,
    load: &LoadOutcome,
    image: &ImageOutcome,
    settings: &Settings,
) -> Vec<String> {
    let loaded = match load {
        LoadOutcome::Loaded(table) => format!("{}: {} records", category.label, table.len()),
        LoadOutcome::Absent => format!(
            "{}: no results at {}",
            category.label,
            category.input_path(settings).display()
        ),
        LoadOutcome::Failed(err) => format!("{}: failed to load ({err:#})", category.label),
    };
    let plotted = match image {
        ImageOutcome::Saved(path) => Some(format!("Saved: {}", path.display())),
        ImageOutcome::Skipped => Some(format!(
            "No {} data available",
            category.label.to_lowercase()
        )),
        ImageOutcome::Failed(err) => Some(format!("{}: failed to plot ({err:#})", category.label)),
        ImageOutcome::NotRendered => None,
    };
    std::iter::once(loaded).chain(plotted).collect()
}

/// Loads every category once, plots them, then writes the report that links the plots
pub async fn run(config: &Config) -> Result<RunSummary> {
    let settings = &config.settings;
    create_dir_all(&settings.output_dir)
        .await
        .wrap_err_with(|| format!("Create {}", settings.output_dir.display()))?;

    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{} benchmark analysis", config.name);
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("\nLoading and analysing results...");

    let loads = join_all(
        config
            .categories
            .iter()
            .map(|category| load_category(category, settings)),
    )
    .await;
    let images = config
        .categories
        .par_iter()
        .zip(loads.par_iter())
        .map(|(category, load)| visualize(category, load, settings))
        .collect::<Vec<_>>();

    let mut results = Vec::with_capacity(images.len());
    for ((category, load), image) in config.categories.iter().zip(loads).zip(images) {
        match (&load, &image) {
            (LoadOutcome::Failed(err), _) => warn!("Could not load {}: {err:#}", category.name),
            (_, ImageOutcome::Failed(err)) => warn!("{err:#}"),
            _ => {}
        }
        for line in progress(category, &load, &image, settings) {
            println!("{line}");
        }
        if !matches!(image, ImageOutcome::Saved(_)) {
            remove_stale(&category.image_path(settings)).await?;
        }
        results.push(CategoryResult {
            name: category.name.clone(),
            load,
            image,
        });
    }

    println!("\nGenerating Markdown report...");
    let generated = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let report = build_report(config, &results, &generated);
    let report_path = settings.report_path();
    create_dir_all(settings.report_dir())
        .await
        .wrap_err_with(|| format!("Create {}", settings.report_dir().display()))?;
    write(&report_path, report.render())
        .await
        .wrap_err_with(|| format!("Write {}", report_path.display()))?;
    println!("Saved: {}", report_path.display());

    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("Analysis complete! Results in: {}", settings.output_dir.display());
    println!("{}", "=".repeat(BANNER_WIDTH));
    info!(
        "Report written with {} categories, {} failed",
        results.len(),
        results.iter().filter(|r| r.failure().is_some()).count()
    );

    Ok(RunSummary {
        report: report_path,
        results,
    })
}
