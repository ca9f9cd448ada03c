pub mod aggregate;
pub mod config;
pub mod dimension;
pub mod error;
pub mod measurement;
pub mod metrics;
pub mod report;
pub mod series;
pub mod tabular;

pub use error::{ReportError, Result};

/// Installs the stderr log subscriber used by the binaries.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        "hash_bench_report=debug"
    } else {
        "hash_bench_report=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
