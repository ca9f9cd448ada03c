use crate::measurement::{MeasurementKey, RawEstimate, ThroughputSpec};
use serde::Serialize;
use std::fmt;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Unit of a derived throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThroughputUnit {
    /// GB/s, for byte-counted benchmarks.
    GigabytesPerSec,
    /// M items/s, for element-counted benchmarks.
    MegaItemsPerSec,
}

impl fmt::Display for ThroughputUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThroughputUnit::GigabytesPerSec => write!(f, "GB/s"),
            ThroughputUnit::MegaItemsPerSec => write!(f, "M Items/s"),
        }
    }
}

/// Normalized metrics for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub key: MeasurementKey,
    pub latency_ns: f64,
    pub throughput: f64,
    pub unit: ThroughputUnit,
}

/// Turns raw estimates into latency and throughput.
#[derive(Debug, Clone, Copy)]
pub struct MetricExtractor {
    /// Assumed when a snapshot records `Elements` without a count, or with a count of zero.
    pub default_element_count: u64,
}

impl MetricExtractor {
    pub fn new(default_element_count: u64) -> Self {
        MetricExtractor {
            default_element_count,
        }
    }

    pub fn extract(&self, key: MeasurementKey, raw: &RawEstimate) -> MetricRecord {
        let latency_ns = raw.point_estimate_ns;
        let per_sec = NANOS_PER_SEC / latency_ns;

        let (throughput, unit) = match raw.throughput {
            ThroughputSpec::ByteCount(size) => (
                per_sec * size as f64 / 1_000_000_000.0,
                ThroughputUnit::GigabytesPerSec,
            ),
            ThroughputSpec::ElementCount(size) => {
                // A zero count is treated like a missing one
                let size = size
                    .filter(|&n| n > 0)
                    .unwrap_or(self.default_element_count);
                (
                    per_sec * size as f64 / 1_000_000.0,
                    ThroughputUnit::MegaItemsPerSec,
                )
            }
        };

        MetricRecord {
            key,
            latency_ns,
            throughput,
            unit,
        }
    }
}
