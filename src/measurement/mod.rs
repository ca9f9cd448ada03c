//! Resolution of measurement keys to criterion snapshots on disk.
//!
//! Criterion stores one directory per `{group}_{subject}/{case}` holding any number of
//! `measurement_*.cbor` snapshots plus a `benchmark.cbor` metadata record. The metadata
//! record names the latest snapshot; when it is missing or stale the lexicographically
//! largest snapshot name wins.

use crate::error::{ReportError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-name prefix shared by all snapshot entries.
pub const SNAPSHOT_PREFIX: &str = "measurement";
/// Companion metadata record in every case directory.
pub const METADATA_FILE: &str = "benchmark.cbor";

/// Identifies one benchmark run family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasurementKey {
    pub group: String,
    pub subject: String,
    /// Input size or named scenario, e.g. `str_64` or `10000_emails`.
    pub case: String,
}

impl MeasurementKey {
    pub fn new(group: &str, subject: &str, case: &str) -> Self {
        MeasurementKey {
            group: group.to_string(),
            subject: subject.to_string(),
            case: case.to_string(),
        }
    }

    /// Directory holding this key's snapshots below the storage root.
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(format!("{}_{}", self.group, self.subject))
            .join(&self.case)
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.group, self.subject, self.case)
    }
}

/// Unit basis used to turn a latency into a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputSpec {
    ByteCount(u64),
    /// Element count; `None` when the benchmark did not record one.
    ElementCount(Option<u64>),
}

/// The decoded snapshot for a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEstimate {
    pub point_estimate_ns: f64,
    pub throughput: ThroughputSpec,
}

/// On-disk snapshot layout. Only the fields the report needs are decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub estimates: Estimates,
    #[serde(default)]
    pub throughput: Option<SnapshotThroughput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimates {
    pub mean: Estimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    pub point_estimate: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SnapshotThroughput {
    Bytes(u64),
    BytesDecimal(u64),
    Elements(Option<u64>),
}

impl From<SnapshotThroughput> for ThroughputSpec {
    fn from(throughput: SnapshotThroughput) -> Self {
        match throughput {
            SnapshotThroughput::Bytes(n) | SnapshotThroughput::BytesDecimal(n) => {
                ThroughputSpec::ByteCount(n)
            }
            SnapshotThroughput::Elements(n) => ThroughputSpec::ElementCount(n),
        }
    }
}

impl Snapshot {
    /// Mean point estimate, rejected unless it is a positive finite number of nanoseconds.
    pub fn point_estimate_ns(&self, path: &Path) -> Result<f64> {
        let ns = self.estimates.mean.point_estimate;
        if ns.is_finite() && ns > 0.0 {
            Ok(ns)
        } else {
            Err(ReportError::malformed(path, format!("invalid point estimate {ns}")))
        }
    }

    pub fn to_raw_estimate(&self, path: &Path) -> Result<RawEstimate> {
        let throughput = self
            .throughput
            .ok_or_else(|| ReportError::malformed(path, "snapshot has no throughput"))?;

        Ok(RawEstimate {
            point_estimate_ns: self.point_estimate_ns(path)?,
            throughput: throughput.into(),
        })
    }
}

/// Companion metadata record (`benchmark.cbor`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub id: BenchmarkId,
    #[serde(default)]
    pub latest_record: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkId {
    #[serde(default)]
    pub group_id: String,
    /// Composite `{benchmarkKind}-{distribution}-{subject}` for realworld benchmarks.
    #[serde(default)]
    pub function_id: Option<String>,
}

/// Decodes a CBOR record from a file.
pub fn read_cbor<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReportError::io(path, e))?;
    ciborium::from_reader(BufReader::new(file)).map_err(|e| ReportError::malformed(path, e))
}

/// Picks the authoritative snapshot in a case directory.
///
/// `label` only feeds the `NotFound` message.
pub fn latest_snapshot(dir: &Path, label: &str) -> Result<PathBuf> {
    let not_found = || ReportError::NotFound {
        key: label.to_string(),
        path: dir.to_path_buf(),
    };

    if !dir.is_dir() {
        return Err(not_found());
    }

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(SNAPSHOT_PREFIX) && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    let Some(fallback) = names.last() else {
        return Err(not_found());
    };

    // Prefer the snapshot the metadata record points at
    let metadata_path = dir.join(METADATA_FILE);
    if metadata_path.is_file() {
        let record: BenchmarkRecord = read_cbor(&metadata_path)?;
        let recorded = record
            .latest_record
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());

        if let Some(name) = recorded.filter(|name| names.contains(name)) {
            debug!(key = label, snapshot = %name, "selected snapshot from metadata");
            return Ok(dir.join(name));
        }
    }

    debug!(key = label, snapshot = %fallback, "selected lexicographically latest snapshot");
    Ok(dir.join(fallback))
}

/// Anything that can resolve a key to its raw estimate.
pub trait MeasurementSource {
    fn load(&self, key: &MeasurementKey) -> Result<RawEstimate>;
}

/// Filesystem-backed store rooted at criterion's data directory. Each call re-scans storage.
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    root: PathBuf,
}

impl MeasurementStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        MeasurementStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the authoritative snapshot for `key`.
    pub fn snapshot_path(&self, key: &MeasurementKey) -> Result<PathBuf> {
        latest_snapshot(&key.directory(&self.root), &key.to_string())
    }
}

impl MeasurementSource for MeasurementStore {
    fn load(&self, key: &MeasurementKey) -> Result<RawEstimate> {
        let path = self.snapshot_path(key)?;
        let snapshot: Snapshot = read_cbor(&path)?;
        snapshot.to_raw_estimate(&path)
    }
}
