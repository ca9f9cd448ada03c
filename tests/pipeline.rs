use hash_bench_report::aggregate::Aggregator;
use hash_bench_report::config::{ReportConfig, TableConfig};
use hash_bench_report::dimension::DimensionRegistry;
use hash_bench_report::measurement::{
    BenchmarkId, BenchmarkRecord, Estimate, Estimates, MeasurementStore, Snapshot,
    SnapshotThroughput, METADATA_FILE,
};
use hash_bench_report::metrics::MetricExtractor;
use hash_bench_report::report::{pivot_summary, pivot_wide};
use hash_bench_report::series::{
    write_chart, ChartPreset, PointComparison, SeriesBuilder, SizeSweep, SubjectStyle,
};
use hash_bench_report::tabular::{extract_realworld, read_csv, write_csv};
use hash_bench_report::ReportError;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

fn write_cbor<T: Serialize>(path: &Path, value: &T) {
    let file = File::create(path).unwrap();
    ciborium::into_writer(value, file).unwrap();
}

fn snapshot(ns: f64, throughput: Option<SnapshotThroughput>) -> Snapshot {
    Snapshot {
        estimates: Estimates {
            mean: Estimate { point_estimate: ns },
        },
        throughput,
    }
}

/// Lays out one realworld case the way criterion does, with a stale older snapshot.
fn realworld_case(root: &Path, group: &str, function_id: &str, ns: f64) {
    let dir = root.join(group).join(function_id);
    fs::create_dir_all(&dir).unwrap();
    write_cbor(
        &dir.join("measurement_230101000000.cbor"),
        &snapshot(ns * 100.0, Some(SnapshotThroughput::Elements(Some(1)))),
    );
    write_cbor(
        &dir.join("measurement_240101000000.cbor"),
        &snapshot(ns, Some(SnapshotThroughput::Elements(Some(1)))),
    );
    write_cbor(
        &dir.join(METADATA_FILE),
        &BenchmarkRecord {
            id: BenchmarkId {
                group_id: group.to_string(),
                function_id: Some(function_id.to_string()),
            },
            latest_record: Some(dir.join("measurement_240101000000.cbor")),
        },
    );
}

fn hash_case(root: &Path, subject: &str, case: &str, ns: f64, throughput: SnapshotThroughput) {
    let dir = root.join(format!("hash_{subject}")).join(case);
    fs::create_dir_all(&dir).unwrap();
    write_cbor(&dir.join("measurement_1.cbor"), &snapshot(ns, Some(throughput)));
}

fn table_config() -> TableConfig {
    TableConfig {
        distributions: vec!["u32".into(), "strurl".into()],
        benchmark_kinds: vec!["hashonly".into(), "setbuild".into()],
        subjects: vec!["rapidhash-q".into(), "foldhash-q".into()],
        ..TableConfig::default()
    }
}

#[test]
fn table_pipeline_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("data");
    realworld_case(&root, "realworld_u32", "hashonly-u32-rapidhash-q", 1.0);
    realworld_case(&root, "realworld_u32", "hashonly-u32-foldhash-quality", 2.0);
    realworld_case(&root, "realworld_u32", "setbuild-u32-rapidhash-q", 40_000.0);
    realworld_case(&root, "realworld_u32", "setbuild-u32-foldhash-quality", 40_000.0);
    realworld_case(&root, "realworld_str", "hashonly-strurl-rapidhash-q", 9.0);
    realworld_case(&root, "realworld_str", "hashonly-strurl-foldhash-quality", 4.0);
    realworld_case(&root, "realworld_str", "setbuild-strurl-rapidhash-q", 90_000.0);
    realworld_case(&root, "realworld_str", "setbuild-strurl-foldhash-quality", 160_000.0);
    // Not a realworld group
    realworld_case(&root, "map_fxhash", "hashonly-u32-fxhash", 1.0);

    let observations = extract_realworld(&root, "realworld").unwrap();
    assert_eq!(observations.len(), 8);

    let csv_path = tmp.path().join("bench.csv");
    write_csv(&csv_path, &observations).unwrap();
    let first = fs::read(&csv_path).unwrap();
    write_csv(&csv_path, &extract_realworld(&root, "realworld").unwrap()).unwrap();
    assert_eq!(first, fs::read(&csv_path).unwrap());

    let table = table_config();
    let registry = DimensionRegistry::from_config(&table).unwrap();
    let aggregation = Aggregator::new(&registry, &table)
        .aggregate(&read_csv(&csv_path).unwrap())
        .unwrap();

    let wide = pivot_wide(&aggregation.rows).unwrap();
    assert_eq!(wide.subjects, vec!["rapidhash-q", "foldhash-q"]);
    let groups: Vec<(&str, &str)> = wide
        .rows
        .iter()
        .map(|r| (r.distribution.as_str(), r.benchmark_kind.as_str()))
        .collect();
    assert_eq!(
        groups,
        vec![
            ("u32", "hashonly"),
            ("u32", "setbuild"),
            ("strurl", "hashonly"),
            ("strurl", "setbuild"),
        ]
    );
    assert_eq!(wide.rows[1].values, vec![4.0, 4.0]);
    assert_eq!(wide.rows[3].values, vec![9.0, 16.0]);

    let summary = pivot_summary(&aggregation.summary);
    // rapidhash-q ranks: 1, 1.5, 2, 1
    assert_eq!(summary.avg_rank, vec![1.375, 1.625]);
    let expected = (1.0f64 * 4.0 * 9.0 * 9.0).powf(0.25);
    assert!((summary.geometric_mean[0] - expected).abs() < 1e-9);
}

#[test]
fn table_pipeline_sparse_data_is_reported() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("data");
    realworld_case(&root, "realworld_u32", "hashonly-u32-rapidhash-q", 1.0);
    realworld_case(&root, "realworld_u32", "hashonly-u32-foldhash-quality", 2.0);
    realworld_case(&root, "realworld_u32", "setbuild-u32-rapidhash-q", 40_000.0);

    let table = table_config();
    let registry = DimensionRegistry::from_config(&table).unwrap();
    let aggregation = Aggregator::new(&registry, &table)
        .aggregate(&extract_realworld(&root, "realworld").unwrap())
        .unwrap();

    let err = pivot_wide(&aggregation.rows).unwrap_err();
    assert!(matches!(err, ReportError::MissingCell { .. }));
}

#[test]
fn chart_pipeline_writes_json() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("data");
    for (subject, scale) in [("rapidhash-f", 1.0), ("fxhash", 2.0)] {
        for size in [8u64, 64] {
            hash_case(
                &root,
                subject,
                &format!("str_{size}"),
                scale * size as f64,
                SnapshotThroughput::Bytes(size),
            );
        }
        hash_case(&root, subject, "u64", scale, SnapshotThroughput::Elements(Some(1)));
    }

    let preset = ChartPreset {
        name: "test".to_string(),
        group: "hash".to_string(),
        subjects: vec![
            SubjectStyle::by_convention("rapidhash-f", "#0000ff"),
            SubjectStyle::by_convention("fxhash", "#ff0000"),
        ],
        sweep: Some(SizeSweep {
            prefix: "str".to_string(),
            sizes: vec![8, 64],
            label_stride: 1,
            log_scale: true,
        }),
        comparisons: vec![PointComparison::throughput("u64", "Throughput (u64)")],
        line_width: 0.5,
        output_file: "bench_test.json".to_string(),
    };

    let config = ReportConfig::default();
    let store = MeasurementStore::new(root.clone());
    let builder = SeriesBuilder::new(
        &store,
        MetricExtractor::new(config.metrics.default_element_count),
    );
    let data = builder.build(&preset).unwrap();

    let sweep = data.sweep.as_ref().unwrap();
    assert_eq!(sweep.throughput[0].values, vec![1.0, 1.0]);
    assert_eq!(sweep.throughput[1].values, vec![0.5, 0.5]);
    assert_eq!(data.comparisons[0].bars[1].value, 500.0);

    let out = tmp.path().join("docs");
    let path = write_chart(&data, &out, &preset.output_file).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["name"], "test");
    assert_eq!(json["sweep"]["latency"][0]["style"]["line"], "dashed");
    assert_eq!(json["comparisons"][0]["unit"], "M Items/s");

    // A subject without data fails the whole preset
    let mut missing = preset.with_style(SubjectStyle::new("fxhash", "#000000"));
    missing.subjects.push(SubjectStyle::new("ahash", "#cccccc"));
    assert!(matches!(
        builder.build(&missing).unwrap_err(),
        ReportError::NotFound { .. }
    ));
}
