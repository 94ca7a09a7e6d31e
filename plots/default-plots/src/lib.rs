use std::path::PathBuf;

use cache_basic::CacheEffect;
use common::{
    config::{Category, Config, Settings},
    plot::Plot,
};
use compression_basic::CompressionEffect;
use latency_basic::LatencyComparison;
use sync_write_basic::SyncComparison;
use throughput_basic::ThroughputComparison;

/// Crates whose log output follows the binary's level
pub const PLOT_MODULES: &[&str] = &[
    "common",
    "throughput_basic",
    "latency_basic",
    "sync_write_basic",
    "cache_basic",
    "compression_basic",
];

/// Keeps every plot linked so typetag can deserialize them from a config file
pub fn init_plots() {
    let plots: [Box<dyn Plot>; 5] = [
        Box::new(ThroughputComparison::default()),
        Box::new(LatencyComparison::default()),
        Box::new(SyncComparison::default()),
        Box::new(CacheEffect::default()),
        Box::new(CompressionEffect::default()),
    ];
    for plot in plots {
        _ = serde_json::to_string(&plot);
    }
}

fn category(
    name: &str,
    label: &str,
    input: PathBuf,
    image: &str,
    (heading, table_heading): (&str, &str),
    plot: Box<dyn Plot>,
) -> Category {
    Category {
        name: name.to_owned(),
        label: label.to_owned(),
        input,
        image: image.to_owned(),
        heading: heading.to_owned(),
        table_heading: table_heading.to_owned(),
        plot,
    }
}

/// The mdadm vs ZFS layout written by the benchmark scripts
pub fn default_config() -> Config {
    Config {
        name: "mdadm vs ZFS".to_owned(),
        settings: Settings::default(),
        categories: vec![
            category(
                "throughput",
                "Throughput",
                Category::summary_input("throughput"),
                "throughput_comparison.png",
                ("Throughput", "Sequential read/write throughput (MB/s)"),
                Box::new(ThroughputComparison::default()),
            ),
            category(
                "latency",
                "Latency",
                Category::summary_input("latency"),
                "latency_comparison.png",
                ("Latency", "Random 4KB read/write latency (µs)"),
                Box::new(LatencyComparison::default()),
            ),
            category(
                "sync_write",
                "Sync Write",
                Category::summary_input("sync_write"),
                "sync_comparison.png",
                ("Synchronous Writes", "Sync vs async performance"),
                Box::new(SyncComparison::default()),
            ),
            category(
                "cache",
                "Cache",
                Category::summary_input("cache"),
                "cache_effect.png",
                ("Cache Effect", "ARC cache effect"),
                Box::new(CacheEffect::default()),
            ),
            category(
                "compression",
                "Compression",
                PathBuf::from("compression").join("compression_checksum_summary.csv"),
                "compression_effect.png",
                ("Compression and Checksums", "Compression performance"),
                Box::new(CompressionEffect::default()),
            ),
        ],
        conclusion: None,
    }
}
