use hash_bench_report::aggregate::Aggregator;
use hash_bench_report::config::{Flags, ReportConfig};
use hash_bench_report::dimension::DimensionRegistry;
use hash_bench_report::report::{pivot_summary, pivot_wide, print_report};
use hash_bench_report::tabular::{extract_realworld, read_csv, write_csv};
use hash_bench_report::{init_logging, Result};
use std::env;
use std::process;
use tracing::{error, info};

/// Flattens the realworld benchmarks into `bench.csv`, then prints the ranking tables.
fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let flags = Flags::from_args(&args);
    init_logging(flags.verbose);

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = ReportConfig::discover()?;

    // Extract
    let observations = extract_realworld(&config.storage.root, &config.storage.realworld_prefix)?;
    write_csv(&config.table.csv_path, &observations)?;
    info!(path = %config.table.csv_path.display(), rows = observations.len(), "wrote table input");

    // Aggregate from the written file so the table always reflects what was cached
    let observations = read_csv(&config.table.csv_path)?;
    let registry = DimensionRegistry::from_config(&config.table)?;
    let aggregation = Aggregator::new(&registry, &config.table).aggregate(&observations)?;

    let wide = pivot_wide(&aggregation.rows)?;
    let summary = pivot_summary(&aggregation.summary);
    print_report(&wide, &summary, config.table.precision);

    Ok(())
}
