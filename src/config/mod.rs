//! Report configuration loaded from `report.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work. The chart preset
//! is not part of the file: it is resolved once from presence flags and passed down.

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "report.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
}

impl ReportConfig {
    /// Loads `report.toml` from the working directory, falling back to defaults when absent.
    pub fn discover() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the configuration from an explicit file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReportError::InvalidConfig {
            reason: e.to_string(),
        })
    }
}

/// Where criterion left its data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Group-directory prefix scanned when extracting the realworld table.
    #[serde(default = "default_realworld_prefix")]
    pub realworld_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            realworld_prefix: default_realworld_prefix(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("target/criterion/data/main")
}
fn default_realworld_prefix() -> String {
    "realworld".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Element count assumed when a snapshot records `Elements` without a count.
    #[serde(default = "default_element_count")]
    pub default_element_count: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            default_element_count: default_element_count(),
        }
    }
}

fn default_element_count() -> u64 {
    450_000
}

/// What to do with a row whose dimension value is not in its presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownValuePolicy {
    /// Abort the run with `UnknownDimensionValue`.
    #[default]
    Fail,
    /// Drop the row and log a warning.
    Skip,
}

/// Ranking table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
    #[serde(default = "default_map_size")]
    pub map_size: u64,
    #[serde(default = "default_set_build_factor")]
    pub set_build_factor: u64,
    /// Benchmark kind whose timings cover a whole table build.
    #[serde(default = "default_set_build_kind")]
    pub set_build_kind: String,
    #[serde(default)]
    pub unknown_values: UnknownValuePolicy,
    /// Decimal places in console output.
    #[serde(default = "default_precision")]
    pub precision: usize,
    #[serde(default = "default_distributions")]
    pub distributions: Vec<String>,
    #[serde(default = "default_benchmark_kinds")]
    pub benchmark_kinds: Vec<String>,
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
    /// Raw subject name to presented name, applied before the registry lookup.
    #[serde(default = "default_subject_aliases")]
    pub subject_aliases: BTreeMap<String, String>,
}

impl TableConfig {
    /// Divisor applied to `set_build_kind` timings.
    pub fn set_build_divisor(&self) -> f64 {
        (self.set_build_factor * self.map_size) as f64
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            map_size: default_map_size(),
            set_build_factor: default_set_build_factor(),
            set_build_kind: default_set_build_kind(),
            unknown_values: UnknownValuePolicy::default(),
            precision: default_precision(),
            distributions: default_distributions(),
            benchmark_kinds: default_benchmark_kinds(),
            subjects: default_subjects(),
            subject_aliases: default_subject_aliases(),
        }
    }
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("bench.csv")
}
fn default_map_size() -> u64 {
    1000
}
fn default_set_build_factor() -> u64 {
    10
}
fn default_set_build_kind() -> String {
    "setbuild".to_string()
}
fn default_precision() -> usize {
    2
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_distributions() -> Vec<String> {
    owned(&[
        "u32",
        "u32pair",
        "u64",
        "u64lobits",
        "u64hibits",
        "u64pair",
        "ipv4",
        "ipv6",
        "rgba",
        "strenglishword",
        "struuid",
        "strurl",
        "strdate",
        "accesslog",
        "kilobyte",
        "tenkilobyte",
    ])
}

fn default_benchmark_kinds() -> Vec<String> {
    owned(&["hashonly", "lookupmiss", "lookuphit", "setbuild"])
}

fn default_subjects() -> Vec<String> {
    owned(&[
        "rapidhash-f",
        "rapidhash-q",
        "foldhash-f",
        "foldhash-q",
        "gxhash",
        "fxhash",
        "ahash",
        "siphash",
    ])
}

fn default_subject_aliases() -> BTreeMap<String, String> {
    [("foldhash-fast", "foldhash-f"), ("foldhash-quality", "foldhash-q")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs")
}

/// Named chart configuration selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    /// Default without subjects that need non-portable CPU features.
    Portable,
    /// Raw hash function ports compared against each other.
    Raw,
    /// Dense sweep over small inputs.
    Small,
    RawSmall,
}

/// Presence flags understood by the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub preset: Preset,
    /// Also build the map-insert chart.
    pub map: bool,
    pub verbose: bool,
}

impl Flags {
    /// Resolves flags from command-line arguments. Unrecognised arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (mut portable, mut raw, mut small) = (false, false, false);
        let mut flags = Flags::default();

        for arg in args {
            match arg.as_ref() {
                "--portable" => portable = true,
                "--raw" => raw = true,
                "--small" => small = true,
                "--map" => flags.map = true,
                "--verbose" => flags.verbose = true,
                _ => {}
            }
        }

        flags.preset = match (raw, small, portable) {
            (true, true, _) => Preset::RawSmall,
            (true, false, _) => Preset::Raw,
            (false, true, _) => Preset::Small,
            (false, false, true) => Preset::Portable,
            (false, false, false) => Preset::Default,
        };
        flags
    }
}
