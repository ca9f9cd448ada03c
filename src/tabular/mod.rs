//! Flat `bench,distr,hash,ns` intermediate format and its extraction from criterion data.

use crate::error::{ReportError, Result};
use crate::measurement::{latest_snapshot, read_cbor, BenchmarkRecord, Snapshot, METADATA_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One measured (benchmark kind, distribution, subject) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "bench")]
    pub benchmark_kind: String,
    #[serde(rename = "distr")]
    pub distribution: String,
    #[serde(rename = "hash")]
    pub subject: String,
    pub ns: f64,
}

impl Observation {
    pub fn new(benchmark_kind: &str, distribution: &str, subject: &str, ns: f64) -> Self {
        Observation {
            benchmark_kind: benchmark_kind.to_string(),
            distribution: distribution.to_string(),
            subject: subject.to_string(),
            ns,
        }
    }

    /// Splits a `{benchmarkKind}-{distribution}-{subject}` identifier. The subject keeps any
    /// further hyphens.
    pub fn from_function_id(function_id: &str, ns: f64, source: &Path) -> Result<Self> {
        let mut parts = function_id.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(bench), Some(distr), Some(subject))
                if !bench.is_empty() && !distr.is_empty() && !subject.is_empty() =>
            {
                Ok(Observation::new(bench, distr, subject, ns))
            }
            _ => Err(ReportError::malformed(
                source,
                format!("function id '{function_id}' is not bench-distr-subject"),
            )),
        }
    }
}

/// Column names of the intermediate file.
pub const CSV_HEADER: [&str; 4] = ["bench", "distr", "hash", "ns"];

/// Writes observations with a `bench,distr,hash,ns` header, replacing any existing file.
/// The header is written even when there are no rows.
pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[Observation]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::io(path.as_ref(), e))?;
    Ok(())
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ReportError::malformed(path, e))?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<Observation>() {
        let row = row.map_err(|e| ReportError::malformed(path, e))?;
        // Geometric means need strictly positive times
        if !(row.ns.is_finite() && row.ns > 0.0) {
            return Err(ReportError::malformed(
                path,
                format!(
                    "invalid ns {} for {}-{}-{}",
                    row.ns, row.benchmark_kind, row.distribution, row.subject
                ),
            ));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Collects one observation per realworld case directory below `root`.
///
/// Group directories are those starting with `prefix`. Directories are visited in sorted
/// order so repeated runs write identical files.
pub fn extract_realworld(root: &Path, prefix: &str) -> Result<Vec<Observation>> {
    if !root.is_dir() {
        return Err(ReportError::NotFound {
            key: format!("{prefix} benchmarks"),
            path: root.to_path_buf(),
        });
    }

    let mut observations = Vec::new();
    for group_dir in sorted_subdirs(root)? {
        let is_realworld = group_dir
            .file_name()
            .map(|name| name.to_string_lossy().starts_with(prefix))
            .unwrap_or(false);
        if !is_realworld {
            continue;
        }

        for case_dir in sorted_subdirs(&group_dir)? {
            let metadata_path = case_dir.join(METADATA_FILE);
            if !metadata_path.is_file() {
                continue;
            }

            let record: BenchmarkRecord = read_cbor(&metadata_path)?;
            let function_id = record
                .id
                .function_id
                .ok_or_else(|| ReportError::malformed(&metadata_path, "missing function id"))?;

            let snapshot_path = latest_snapshot(&case_dir, &function_id)?;
            let snapshot: Snapshot = read_cbor(&snapshot_path)?;
            let ns = snapshot.point_estimate_ns(&snapshot_path)?;

            debug!(function_id = %function_id, ns, "extracted");
            observations.push(Observation::from_function_id(&function_id, ns, &metadata_path)?);
        }
    }

    info!(count = observations.len(), "extracted realworld observations");
    Ok(observations)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sorted(mut rows: Vec<Observation>) -> Vec<Observation> {
        rows.sort_by(|a, b| {
            (&a.benchmark_kind, &a.distribution, &a.subject)
                .cmp(&(&b.benchmark_kind, &b.distribution, &b.subject))
        });
        rows
    }

    #[test]
    fn test_function_id_split() {
        let obs =
            Observation::from_function_id("lookuphit-u64-foldhash-fast", 3.5, Path::new("x"))
                .unwrap();
        assert_eq!(obs, Observation::new("lookuphit", "u64", "foldhash-fast", 3.5));
    }

    #[test]
    fn test_function_id_too_short() {
        let err = Observation::from_function_id("hashonly-u64", 1.0, Path::new("x")).unwrap_err();
        assert!(matches!(err, ReportError::MalformedRecord { .. }));
        assert!(Observation::from_function_id("hashonly--fxhash", 1.0, Path::new("x")).is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bench.csv");
        let rows = vec![
            Observation::new("setbuild", "strurl", "rapidhash-q", 123456.789),
            Observation::new("hashonly", "u32", "foldhash-fast", 0.8125),
            Observation::new("lookupmiss", "ipv6", "gxhash", 1.0 / 3.0),
        ];

        write_csv(&path, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("bench,distr,hash,ns\n"));

        assert_eq!(sorted(read_csv(&path).unwrap()), sorted(rows));
    }

    #[test]
    fn test_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bench.csv");
        write_csv(&path, &[Observation::new("hashonly", "u32", "a", 1.0)]).unwrap();
        write_csv(&path, &[Observation::new("hashonly", "u64", "b", 2.0)]).unwrap();

        let rows = read_csv(&path).unwrap();
        assert_eq!(rows, vec![Observation::new("hashonly", "u64", "b", 2.0)]);
    }

    #[test]
    fn test_read_bad_row_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bench.csv");
        fs::write(&path, "bench,distr,hash,ns\nhashonly,u32,fxhash,fast\n").unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(matches!(err, ReportError::MalformedRecord { .. }));
    }

    #[test]
    fn test_read_non_positive_ns_is_malformed() {
        let tmp = TempDir::new().unwrap();
        for ns in ["0", "-3", "NaN", "inf"] {
            let path = tmp.path().join("bench.csv");
            fs::write(
                &path,
                format!("bench,distr,hash,ns\nhashonly,u32,rapidhash-q,1.5\nhashonly,u32,foldhash-q,{ns}\n"),
            )
            .unwrap();

            let err = read_csv(&path).unwrap_err();
            assert!(matches!(err, ReportError::MalformedRecord { .. }), "ns = {ns}");
        }
    }

    #[test]
    fn test_write_empty_keeps_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bench.csv");
        write_csv(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "bench,distr,hash,ns\n");
        assert!(read_csv(&path).unwrap().is_empty());
    }

    #[test]
    fn test_extract_missing_root() {
        let tmp = TempDir::new().unwrap();
        let err = extract_realworld(&tmp.path().join("nope"), "realworld").unwrap_err();
        assert!(matches!(err, ReportError::NotFound { .. }));
    }
}
