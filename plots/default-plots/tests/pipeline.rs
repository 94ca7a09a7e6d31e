use std::path::Path;

use cache_basic::CacheEffect;
use common::{
    config::Config,
    pipeline::{ImageOutcome, LoadOutcome, RunSummary, run},
    report::markdown_table,
    table::ResultTable,
};
use default_plots::{default_config, init_plots};
use tempfile::TempDir;
use throughput_basic::ThroughputComparison;

const THROUGHPUT: &str = "\
test_name,rw_type,block_size,bandwidth_MBps,iops
mdadm,write,4k,500,128000
mdadm,write,1M,1400,1400
zfs,write,4k,420,107520
zfs,write,1M,1250,1250
mdadm,read,4k,610,156160
zfs,read,4k,580,148480
";

const CACHE: &str = "\
test_name,arc_size,cold_read_MBps,warm_read_MBps,speedup
zfs,1G,300,2400,8.0
zfs,8G,310,5200,16.8
";

const LATENCY: &str = "\
test_name,rw_type,iodepth,lat_p99_us,iops
mdadm,randread,1,120,8000
mdadm,randread,32,900,90000
zfs,randread,1,100,9000
zfs,randread,32,1100,70000
mdadm,randwrite,1,200,5000
zfs,randwrite,1,260,4100
";

const SYNC_WRITE: &str = "\
test_name,sync_mode,bandwidth_MBps
zfs,sync,80
mdadm,sync,40
zfs,async-fsync,900
mdadm,async,1200
";

const COMPRESSION: &str = "\
data_type,config,write_MBps,read_MBps
random,lz4,900,1500
random,off,950,1550
compressible,zstd,1200,1800
zero,lz4,3000,4000
";

const FIXTURES: [(&str, &str, &str); 5] = [
    ("throughput", THROUGHPUT, "throughput_comparison.png"),
    ("latency", LATENCY, "latency_comparison.png"),
    ("sync_write", SYNC_WRITE, "sync_comparison.png"),
    ("cache", CACHE, "cache_effect.png"),
    ("compression", COMPRESSION, "compression_effect.png"),
];

fn config(dir: &Path) -> Config {
    let mut config = default_config();
    config.settings.results_root = dir.join("results");
    config.settings.output_dir = dir.join("analysis");
    config.settings.dpi = 60;
    config
}

async fn place(config: &Config, name: &str, contents: &str) {
    let category = config
        .categories
        .iter()
        .find(|c| c.name == name)
        .unwrap();
    let path = category.input_path(&config.settings);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, contents).await.unwrap();
}

async fn report(summary: &RunSummary) -> String {
    tokio::fs::read_to_string(&summary.report).await.unwrap()
}

fn without_timestamp(report: &str) -> String {
    report
        .lines()
        .filter(|line| !line.starts_with("Generated:"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn assert_image_linked(summary: &RunSummary, report: &str, name: &str, alt: &str) {
    match &summary.get(name).unwrap().image {
        ImageOutcome::Saved(path) => {
            assert!(path.exists());
            let file = path.file_name().unwrap().to_string_lossy();
            assert!(report.contains(&format!("![{alt}]({file})")));
        }
        ImageOutcome::Failed(_) => assert!(report.contains("_Chart could not be rendered")),
        other => panic!("{name} was not plotted: {other:?}"),
    }
}

#[tokio::test]
async fn no_results_gives_headings_only() {
    init_plots();
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let summary = run(&config).await.unwrap();

    assert!(summary.failures().is_empty());
    assert!(
        summary
            .results
            .iter()
            .all(|r| matches!(r.load, LoadOutcome::Absent))
    );
    let report = report(&summary).await;
    assert!(report.starts_with("# mdadm vs ZFS Performance Comparison Report\n"));
    for heading in [
        "## 1. Throughput",
        "## 2. Latency",
        "## 3. Synchronous Writes",
        "## 4. Cache Effect",
        "## 5. Compression and Checksums",
        "## 6. Conclusions and Recommendations",
    ] {
        assert!(report.contains(heading), "{heading} missing");
    }
    assert!(!report.contains("Sequential read/write throughput"));
    assert!(report.contains("### When to choose ZFS"));
    assert!(!config.settings.output_dir.join("throughput_comparison.png").exists());
}

#[tokio::test]
async fn present_category_is_tabled_and_others_untouched() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(&config, "throughput", THROUGHPUT).await;
    let summary = run(&config).await.unwrap();

    let throughput = summary.get("throughput").unwrap();
    let LoadOutcome::Loaded(table) = &throughput.load else {
        panic!("throughput not loaded: {:?}", throughput.load);
    };
    assert_eq!(table.len(), 6);
    assert_eq!(table.headers().len(), 5);

    let report = report(&summary).await;
    assert!(report.contains("### Sequential read/write throughput (MB/s)\n"));
    assert!(report.contains(&markdown_table(table)));
    assert_image_linked(&summary, &report, "throughput", "Throughput");

    for name in ["latency", "sync_write", "cache", "compression"] {
        let result = summary.get(name).unwrap();
        assert!(matches!(result.load, LoadOutcome::Absent));
        assert!(matches!(result.image, ImageOutcome::NotRendered));
    }
    assert!(!report.contains("Random 4KB read/write latency"));
    assert!(report.contains("## 2. Latency\n\n\n## 3. Synchronous Writes"));
}

#[tokio::test]
async fn every_category_gets_one_image_and_its_table() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    for (name, csv, _) in FIXTURES {
        place(&config, name, csv).await;
    }
    let summary = run(&config).await.unwrap();
    assert!(summary.failures().is_empty(), "{:?}", summary.failures());

    let report = report(&summary).await;
    for ((name, csv, image), category) in FIXTURES.into_iter().zip(&config.categories) {
        let result = summary.get(name).unwrap();
        let LoadOutcome::Loaded(table) = &result.load else {
            panic!("{name} not loaded: {:?}", result.load);
        };
        assert_eq!(table.len(), csv.lines().count() - 1, "{name} rows");
        assert_eq!(
            table.headers().join(","),
            csv.lines().next().unwrap(),
            "{name} headers"
        );
        assert!(report.contains(&format!("### {}\n", category.table_heading)));
        assert!(report.contains(&markdown_table(table)), "{name} table");

        let path = config.settings.output_dir.join(image);
        let ImageOutcome::Saved(saved) = &result.image else {
            panic!("{name} image not saved: {:?}", result.image);
        };
        assert_eq!(saved, &path);
        let bytes = tokio::fs::read(&path).await.unwrap();
        assert!(bytes.starts_with(b"\x89PNG"), "{name} is not a PNG");
        assert_eq!(
            report.matches(&format!("]({image})")).count(),
            1,
            "{name} link"
        );
    }
}

#[tokio::test]
async fn infinite_speedup_does_not_stall_the_run() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(
        &config,
        "cache",
        "test_name,arc_size,cold_read_MBps,warm_read_MBps,speedup\n\
         zfs,1G,0,2400,inf\n\
         zfs,8G,310,5200,16.8\n",
    )
    .await;
    let summary = tokio::time::timeout(std::time::Duration::from_secs(60), run(&config))
        .await
        .expect("run finished")
        .unwrap();

    let cache = summary.get("cache").unwrap();
    let LoadOutcome::Loaded(table) = &cache.load else {
        panic!("cache not loaded: {:?}", cache.load);
    };
    assert_eq!(table.numbers("speedup").unwrap(), vec![None, Some(16.8)]);
    let report = report(&summary).await;
    assert!(report.contains("| zfs       | 1G       |              0 |           2400 |     inf |"));
    assert_image_linked(&summary, &report, "cache", "Cache");
}

#[tokio::test]
async fn header_only_file_skips_column_checks() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(&config, "cache", "test_name,arc_size\n").await;
    let summary = run(&config).await.unwrap();

    let cache = summary.get("cache").unwrap();
    assert!(matches!(cache.load, LoadOutcome::Loaded(_)));
    assert!(matches!(cache.image, ImageOutcome::Skipped));
    assert!(summary.failures().is_empty());
}

#[tokio::test]
async fn report_in_subdirectory_links_up() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.settings.report_file = "reports/benchmark_report.md".to_owned();
    place(&config, "sync_write", SYNC_WRITE).await;
    let summary = run(&config).await.unwrap();

    assert_eq!(
        summary.report,
        config.settings.output_dir.join("reports").join("benchmark_report.md")
    );
    let report = report(&summary).await;
    if matches!(summary.get("sync_write").unwrap().image, ImageOutcome::Saved(_)) {
        assert!(report.contains("![Sync Write](../sync_comparison.png)"));
    }
}

#[tokio::test]
async fn rerun_gives_the_same_report() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(&config, "throughput", THROUGHPUT).await;
    place(&config, "cache", CACHE).await;

    let first = report(&run(&config).await.unwrap()).await;
    let second = report(&run(&config).await.unwrap()).await;
    assert_eq!(without_timestamp(&first), without_timestamp(&second));
}

#[tokio::test]
async fn malformed_file_fails_only_its_category() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(&config, "throughput", THROUGHPUT).await;
    place(&config, "cache", "test_name,arc_size\nzfs,1G,extra\n").await;
    let summary = run(&config).await.unwrap();

    assert!(matches!(
        summary.get("cache").unwrap().load,
        LoadOutcome::Failed(_)
    ));
    assert!(matches!(
        summary.get("throughput").unwrap().load,
        LoadOutcome::Loaded(_)
    ));
    let failures = summary.failures();
    assert!(failures.iter().any(|f| f.starts_with("cache:")));
    assert!(!failures.iter().any(|f| f.starts_with("latency:")));

    let report = report(&summary).await;
    assert!(report.contains("## 4. Cache Effect\n\n_Results could not be loaded"));
    assert!(report.contains("### Sequential read/write throughput (MB/s)"));
}

#[tokio::test]
async fn missing_column_is_reported_before_plotting() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(
        &config,
        "cache",
        "test_name,arc_size,cold_read_MBps\nzfs,1G,300\n",
    )
    .await;
    let summary = run(&config).await.unwrap();

    let cache = summary.get("cache").unwrap();
    let LoadOutcome::Failed(err) = &cache.load else {
        panic!("cache loaded: {:?}", cache.load);
    };
    assert!(format!("{err:#}").contains("warm_read_MBps"));
    assert!(matches!(cache.image, ImageOutcome::NotRendered));
}

#[tokio::test]
async fn header_only_file_is_tabled_without_image() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    place(
        &config,
        "sync_write",
        "test_name,sync_mode,bandwidth_MBps\n",
    )
    .await;
    let stale = config.settings.output_dir.join("sync_comparison.png");
    tokio::fs::create_dir_all(&config.settings.output_dir)
        .await
        .unwrap();
    tokio::fs::write(&stale, b"old").await.unwrap();

    let summary = run(&config).await.unwrap();
    assert!(matches!(
        summary.get("sync_write").unwrap().image,
        ImageOutcome::Skipped
    ));
    assert!(!stale.exists());

    let report = report(&summary).await;
    assert!(report.contains("### Sync vs async performance\n"));
    assert!(report.contains("| test_name | sync_mode | bandwidth_MBps |"));
    assert!(!report.contains("![Sync Write]"));
}

#[tokio::test]
async fn config_file_round_trips_plot_settings() {
    init_plots();
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.conclusion = Some("Use whichever is faster.".to_owned());
    let path = dir.path().join("config.yml");
    tokio::fs::write(&path, serde_yml::to_string(&config).unwrap())
        .await
        .unwrap();

    let loaded = Config::from_file(&path).await.unwrap();
    assert_eq!(loaded.settings, config.settings);
    assert_eq!(loaded.categories.len(), 5);
    assert_eq!(
        loaded.categories[4].input,
        Path::new("compression").join("compression_checksum_summary.csv")
    );
    let cache = loaded.categories[3]
        .plot
        .downcast_ref::<CacheEffect>()
        .unwrap();
    assert_eq!(cache.reference_speedup, 1.0);
    assert!(
        loaded.categories[0]
            .plot
            .downcast_ref::<ThroughputComparison>()
            .is_some()
    );

    place(&loaded, "throughput", THROUGHPUT).await;
    let summary = run(&loaded).await.unwrap();
    let report = report(&summary).await;
    assert!(report.ends_with("Use whichever is faster."));
}

#[test]
fn table_inference_matches_fixture() {
    let table = ResultTable::from_reader(THROUGHPUT.as_bytes()).unwrap();
    assert!(table.kinds()[3].is_numeric());
    assert!(!table.kinds()[2].is_numeric());
}
