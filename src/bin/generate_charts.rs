use hash_bench_report::config::{Flags, ReportConfig};
use hash_bench_report::measurement::MeasurementStore;
use hash_bench_report::metrics::MetricExtractor;
use hash_bench_report::series::{write_chart, ChartPreset, SeriesBuilder};
use hash_bench_report::{init_logging, Result};
use std::env;
use std::process;
use tracing::{error, info};

/// Builds chart data for the preset selected by `--portable`, `--raw` and `--small`, plus the
/// map insert chart with `--map`.
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let flags = Flags::from_args(&args);
    init_logging(flags.verbose);

    if let Err(e) = run(flags) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(flags: Flags) -> Result<()> {
    let config = ReportConfig::discover()?;
    let store = MeasurementStore::new(config.storage.root.clone());
    let builder = SeriesBuilder::new(
        &store,
        MetricExtractor::new(config.metrics.default_element_count),
    );

    let mut presets = vec![ChartPreset::hash(flags.preset)];
    if flags.map {
        presets.push(ChartPreset::map_insert());
    }

    for preset in &presets {
        info!(preset = %preset.name, subjects = preset.subjects.len(), "building chart");
        let data = builder.build(preset)?;
        write_chart(&data, &config.charts.output_dir, &preset.output_file)?;
    }

    Ok(())
}
