use std::path::PathBuf;

use clap::Parser;
use common::config::Config;
use eyre::{Result, bail};
use tokio::fs::create_dir_all;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Charts and a Markdown report from mdadm vs ZFS benchmark summaries
#[derive(Parser)]
struct Cli {
    /// YAML config, the built-in mdadm vs ZFS layout when omitted
    #[arg(short, long)]
    config_file: Option<PathBuf>,
    /// Directory holding the per-category result folders
    #[arg(long)]
    results: Option<PathBuf>,
    /// Directory for charts, the report and the log
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(short, long)]
    log: Vec<String>,
    /// Print the effective config and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    default_plots::init_plots();

    let mut config = match &args.config_file {
        Some(path) => Config::from_file(path).await?,
        None => default_plots::default_config(),
    };
    if let Some(results) = args.results {
        config.settings.results_root = results;
    }
    if let Some(output) = args.output {
        config.settings.output_dir = output;
    }
    if args.print_config {
        print!("{}", serde_yml::to_string(&config)?);
        return Ok(());
    }

    create_dir_all(&config.settings.output_dir).await?;
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let file_appender = tracing_appender::rolling::never(&config.settings.output_dir, "analysis.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("raid_bench_report={log_level}"));
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }
    for module in default_plots::PLOT_MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(
        "Analysing {} categories from {}",
        config.categories.len(),
        config.settings.results_root.display()
    );
    let summary = match common::pipeline::run(&config).await {
        Ok(summary) => summary,
        Err(err) => {
            error!("{err:#?}");
            return Err(err);
        }
    };

    let failures = summary.failures();
    for failure in &failures {
        error!("{failure}");
    }
    if !failures.is_empty() {
        bail!(
            "{} of {} categories failed, see {}",
            failures.len(),
            summary.results.len(),
            summary.report.display()
        );
    }
    Ok(())
}
