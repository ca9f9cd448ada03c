//! Chart-ready series for the external renderer.
//!
//! A preset names the subjects to draw with their presentation styles, an optional input-size
//! sweep and a handful of single-point comparisons. Building a preset loads every measurement
//! it needs; a missing one fails the whole preset.

use crate::config::Preset;
use crate::error::{ReportError, Result};
use crate::measurement::{MeasurementKey, MeasurementSource};
use crate::metrics::{MetricExtractor, MetricRecord, ThroughputUnit};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Subjects ending with this suffix are the fast variant of another subject.
pub const FAST_VARIANT_SUFFIX: &str = "-f";

const BLUE: &str = "#0000ff";
const YELLOW: &str = "#bfbf00";
const MAGENTA: &str = "#bf00bf";
const CYAN: &str = "#00bfbf";
const GREEN: &str = "#008000";
const RED: &str = "#ff0000";
const BLACK: &str = "#000000";
const GREY: &str = "#cccccc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStyle {
    Solid,
    Hatched,
}

/// How one subject is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStyle {
    pub subject: String,
    pub color: String,
    pub line: LineStyle,
    pub fill: FillStyle,
}

impl SubjectStyle {
    pub fn new(subject: &str, color: &str) -> Self {
        SubjectStyle {
            subject: subject.to_string(),
            color: color.to_string(),
            line: LineStyle::Solid,
            fill: FillStyle::Solid,
        }
    }

    /// Dashed lines and hatched bars for fast variants, solid otherwise.
    pub fn by_convention(subject: &str, color: &str) -> Self {
        let style = SubjectStyle::new(subject, color);
        if subject.ends_with(FAST_VARIANT_SUFFIX) {
            style.with_line(LineStyle::Dashed).with_fill(FillStyle::Hatched)
        } else {
            style
        }
    }

    pub fn with_line(mut self, line: LineStyle) -> Self {
        self.line = line;
        self
    }

    pub fn with_fill(mut self, fill: FillStyle) -> Self {
        self.fill = fill;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Latency,
    Throughput,
}

/// Cases `{prefix}_{size}` for each size.
#[derive(Debug, Clone)]
pub struct SizeSweep {
    pub prefix: String,
    pub sizes: Vec<u64>,
    /// Label every n-th size on the x axis.
    pub label_stride: usize,
    pub log_scale: bool,
}

impl SizeSweep {
    pub fn case(&self, size: u64) -> String {
        format!("{}_{}", self.prefix, size)
    }

    pub fn tick_labels(&self) -> Vec<u64> {
        self.sizes
            .iter()
            .step_by(self.label_stride.max(1))
            .copied()
            .collect()
    }
}

/// One scalar per subject for a fixed case.
#[derive(Debug, Clone)]
pub struct PointComparison {
    pub case: String,
    pub title: String,
    pub metric: Metric,
}

impl PointComparison {
    pub fn throughput(case: &str, title: &str) -> Self {
        PointComparison {
            case: case.to_string(),
            title: title.to_string(),
            metric: Metric::Throughput,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartPreset {
    pub name: String,
    /// Criterion group prefix, e.g. `hash` or `map`.
    pub group: String,
    pub subjects: Vec<SubjectStyle>,
    pub sweep: Option<SizeSweep>,
    pub comparisons: Vec<PointComparison>,
    pub line_width: f64,
    pub output_file: String,
}

impl ChartPreset {
    /// Hash throughput/latency chart for a startup preset.
    pub fn hash(preset: Preset) -> Self {
        let default_subjects = [
            ("gxhash", MAGENTA),
            ("rapidhash-f", BLUE),
            ("rapidhash-q", BLUE),
            ("xxhash3_64", GREY),
            ("foldhash-f", YELLOW),
            ("foldhash-q", YELLOW),
            ("wyhash", CYAN),
            ("metrohash", GREY),
            ("rustc-hash", GREY),
            ("ahash", GREY),
            ("xxhash64", GREY),
            ("t1ha", GREY),
            ("farmhash", GREY),
            ("seahash", GREY),
            ("highwayhash", GREY),
            ("fxhash", RED),
            ("default", BLACK),
        ];

        let subjects: Vec<(&str, &str)> = match preset {
            Preset::Default => default_subjects.to_vec(),
            Preset::Portable => default_subjects
                .iter()
                .filter(|(name, _)| !name.starts_with("gxhash"))
                .copied()
                .collect(),
            Preset::Raw => vec![
                ("rapidhash_raw", BLUE),
                ("rapidhash_cc_rs", CYAN),
                ("rapidhash_cc_v3", YELLOW),
                ("rapidhash_cc_v2_2", GREEN),
                ("rapidhash_cc_v1", RED),
            ],
            Preset::Small => vec![("rapidhash-f", BLUE), ("foldhash-f", YELLOW)],
            Preset::RawSmall => vec![("rapidhash_cc_v3", YELLOW), ("rapidhash_cc_v3_1", GREEN)],
        };

        let small = matches!(preset, Preset::Small | Preset::RawSmall);
        let sweep = if small {
            SizeSweep {
                prefix: "small".to_string(),
                sizes: (0..300).collect(),
                label_stride: 20,
                log_scale: false,
            }
        } else {
            SizeSweep {
                prefix: "str".to_string(),
                sizes: vec![2, 8, 16, 25, 50, 64, 80, 160, 256, 350, 1024, 4096],
                label_stride: 1,
                log_scale: true,
            }
        };

        let comparisons = match preset {
            Preset::Default | Preset::Portable => vec![
                PointComparison::throughput("u64", "Throughput (u64)"),
                PointComparison::throughput("str_65536", "Throughput (bytes, 64kB)"),
            ],
            Preset::Raw => vec![
                PointComparison::throughput("str_8", "Throughput (bytes, 8B)"),
                PointComparison::throughput("str_65536", "Throughput (bytes, 64kB)"),
            ],
            Preset::Small | Preset::RawSmall => vec![
                PointComparison::throughput("small_8", "Throughput (bytes, 8B)"),
                PointComparison::throughput("small_256", "Throughput (bytes, 256B)"),
            ],
        };

        ChartPreset {
            name: format!("hash-{preset:?}").to_lowercase(),
            group: "hash".to_string(),
            subjects: subjects
                .into_iter()
                .map(|(name, color)| SubjectStyle::by_convention(name, color))
                .collect(),
            sweep: Some(sweep),
            comparisons,
            line_width: if small { 1.0 } else { 0.5 },
            output_file: "bench_hash.json".to_string(),
        }
    }

    /// Map insert throughput across four workloads.
    pub fn map_insert() -> Self {
        let subjects = [
            ("rapidhash", BLUE),
            ("default", BLACK),
            ("fxhash", RED),
            ("gxhash", MAGENTA),
            ("wyhash", CYAN),
            ("foldhash", YELLOW),
        ];

        ChartPreset {
            name: "map-insert".to_string(),
            group: "map".to_string(),
            subjects: subjects
                .into_iter()
                .map(|(name, color)| SubjectStyle::new(name, color))
                .collect(),
            sweep: None,
            comparisons: vec![
                PointComparison::throughput("10000_emails", "Throughput (emails)"),
                PointComparison::throughput("450000_words", "Throughput (words)"),
                PointComparison::throughput("100000_u64", "Throughput (u64)"),
                PointComparison::throughput("10000_struct", "Throughput (structs)"),
            ],
            line_width: 0.5,
            output_file: "bench_insert.json".to_string(),
        }
    }

    /// Replaces the style of an already listed subject.
    pub fn with_style(mut self, style: SubjectStyle) -> Self {
        if let Some(existing) = self
            .subjects
            .iter_mut()
            .find(|s| s.subject == style.subject)
        {
            *existing = style;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub style: SubjectStyle,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPanel {
    pub latency_title: String,
    pub throughput_title: String,
    pub x_label: String,
    pub sizes: Vec<u64>,
    pub tick_labels: Vec<u64>,
    pub log_scale: bool,
    pub throughput_unit: ThroughputUnit,
    pub latency: Vec<Series>,
    pub throughput: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub style: SubjectStyle,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPanel {
    pub case: String,
    pub title: String,
    pub metric: Metric,
    /// `ns` for latency, otherwise the throughput unit.
    pub unit: String,
    pub bars: Vec<Bar>,
}

/// Everything the renderer needs to draw one figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub name: String,
    pub line_width: f64,
    pub sweep: Option<SweepPanel>,
    pub comparisons: Vec<ComparisonPanel>,
}

pub struct SeriesBuilder<'a, S: MeasurementSource> {
    source: &'a S,
    extractor: MetricExtractor,
}

impl<'a, S: MeasurementSource> SeriesBuilder<'a, S> {
    pub fn new(source: &'a S, extractor: MetricExtractor) -> Self {
        SeriesBuilder { source, extractor }
    }

    pub fn build(&self, preset: &ChartPreset) -> Result<ChartData> {
        if preset.subjects.is_empty() {
            return Err(ReportError::InvalidConfig {
                reason: format!("chart preset '{}' has no subjects", preset.name),
            });
        }

        let sweep = match &preset.sweep {
            Some(sweep) => Some(self.build_sweep(preset, sweep)?),
            None => None,
        };

        let comparisons = preset
            .comparisons
            .iter()
            .map(|comparison| self.build_comparison(preset, comparison))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChartData {
            name: preset.name.clone(),
            line_width: preset.line_width,
            sweep,
            comparisons,
        })
    }

    fn metric(&self, group: &str, subject: &str, case: &str) -> Result<MetricRecord> {
        let key = MeasurementKey::new(group, subject, case);
        let raw = self.source.load(&key)?;
        Ok(self.extractor.extract(key, &raw))
    }

    fn build_sweep(&self, preset: &ChartPreset, sweep: &SizeSweep) -> Result<SweepPanel> {
        let mut unit = None;
        let mut latency = Vec::with_capacity(preset.subjects.len());
        let mut throughput = Vec::with_capacity(preset.subjects.len());

        for style in &preset.subjects {
            let mut latency_values = Vec::with_capacity(sweep.sizes.len());
            let mut throughput_values = Vec::with_capacity(sweep.sizes.len());

            for &size in &sweep.sizes {
                let record = self.metric(&preset.group, &style.subject, &sweep.case(size))?;
                check_unit(&mut unit, record.unit, &sweep.prefix)?;
                latency_values.push(record.latency_ns);
                throughput_values.push(record.throughput);
            }

            latency.push(Series {
                style: style.clone(),
                values: latency_values,
            });
            throughput.push(Series {
                style: style.clone(),
                values: throughput_values,
            });
        }

        Ok(SweepPanel {
            latency_title: "Latency (byte stream)".to_string(),
            throughput_title: "Throughput (byte stream)".to_string(),
            x_label: "Input size (bytes)".to_string(),
            sizes: sweep.sizes.clone(),
            tick_labels: sweep.tick_labels(),
            log_scale: sweep.log_scale,
            throughput_unit: unit.unwrap_or(ThroughputUnit::GigabytesPerSec),
            latency,
            throughput,
        })
    }

    fn build_comparison(
        &self,
        preset: &ChartPreset,
        comparison: &PointComparison,
    ) -> Result<ComparisonPanel> {
        let mut unit = None;
        let mut bars = Vec::with_capacity(preset.subjects.len());

        for style in &preset.subjects {
            let record = self.metric(&preset.group, &style.subject, &comparison.case)?;
            check_unit(&mut unit, record.unit, &comparison.case)?;

            info!(
                subject = %style.subject,
                case = %comparison.case,
                latency_ns = record.latency_ns,
                throughput = record.throughput,
                "comparison point"
            );

            let value = match comparison.metric {
                Metric::Latency => record.latency_ns,
                Metric::Throughput => record.throughput,
            };
            bars.push(Bar {
                style: style.clone(),
                value,
            });
        }

        let unit = match (comparison.metric, unit) {
            (Metric::Throughput, Some(unit)) => unit.to_string(),
            _ => "ns".to_string(),
        };

        Ok(ComparisonPanel {
            case: comparison.case.clone(),
            title: comparison.title.clone(),
            metric: comparison.metric,
            unit,
            bars,
        })
    }
}

fn check_unit(seen: &mut Option<ThroughputUnit>, unit: ThroughputUnit, case: &str) -> Result<()> {
    match seen {
        Some(existing) if *existing != unit => Err(ReportError::MixedThroughputUnits {
            case: case.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            *seen = Some(unit);
            Ok(())
        }
    }
}

/// Writes chart data as pretty JSON into `dir`, replacing any previous file.
pub fn write_chart(data: &ChartData, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, json).map_err(|e| ReportError::io(&path, e))?;
    info!(path = %path.display(), "wrote chart data");
    Ok(path)
}
