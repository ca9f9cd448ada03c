//! Joins observations against the presentation orders and computes per-group ranks and
//! per-subject geometric means.

use crate::config::{TableConfig, UnknownValuePolicy};
use crate::dimension::DimensionRegistry;
use crate::error::{ReportError, Result};
use crate::metrics::MetricRecord;
use crate::tabular::Observation;
use std::path::Path;
use tracing::{debug, warn};

/// One comparable observation after benchmark-kind normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub distribution: String,
    pub benchmark_kind: String,
    pub subject: String,
    pub normalized_ns: f64,
    /// 1 is fastest; ties share the mean of the ranks they span.
    pub rank_in_group: f64,
}

/// Per-subject summary across every row of that subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub subject: String,
    pub avg_rank: f64,
    pub geometric_mean_ns: f64,
}

/// Rows in presentation order plus the per-subject summary in subject order.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    pub summary: Vec<SummaryRow>,
}

pub struct Aggregator<'a> {
    registry: &'a DimensionRegistry,
    set_build_kind: String,
    set_build_divisor: f64,
    unknown_values: UnknownValuePolicy,
}

struct Resolved {
    order: (usize, usize, usize),
    row: AggregatedRow,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a DimensionRegistry, config: &TableConfig) -> Self {
        Aggregator {
            registry,
            set_build_kind: config.set_build_kind.clone(),
            set_build_divisor: config.set_build_divisor(),
            unknown_values: config.unknown_values,
        }
    }

    /// Set-build timings cover a whole table build; scale them down to one insert.
    pub fn normalize(&self, benchmark_kind: &str, ns: f64) -> f64 {
        if benchmark_kind == self.set_build_kind {
            ns / self.set_build_divisor
        } else {
            ns
        }
    }

    /// Aggregates extracted metrics whose case is a `{benchmarkKind}-{distribution}-{subject}`
    /// identifier.
    pub fn aggregate_metrics(&self, records: &[MetricRecord]) -> Result<Aggregation> {
        let observations = records
            .iter()
            .map(|record| {
                Observation::from_function_id(
                    &record.key.case,
                    record.latency_ns,
                    Path::new(&record.key.group),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        self.aggregate(&observations)
    }

    pub fn aggregate(&self, observations: &[Observation]) -> Result<Aggregation> {
        let mut resolved = Vec::with_capacity(observations.len());
        for observation in observations {
            match self.resolve(observation) {
                Ok(entry) => resolved.push(entry),
                Err(ReportError::UnknownDimensionValue { dimension, value })
                    if self.unknown_values == UnknownValuePolicy::Skip =>
                {
                    warn!(
                        dimension = %dimension,
                        value = %value,
                        bench = %observation.benchmark_kind,
                        distr = %observation.distribution,
                        hash = %observation.subject,
                        "skipping row with unknown dimension value"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        resolved.sort_by_key(|entry| entry.order);

        // Equal neighbours after sorting mean the same cell was measured twice
        if let Some(pair) = resolved.windows(2).find(|w| w[0].order == w[1].order) {
            let row = &pair[1].row;
            return Err(ReportError::DuplicateObservation {
                distribution: row.distribution.clone(),
                benchmark_kind: row.benchmark_kind.clone(),
                subject: row.subject.clone(),
            });
        }

        // Groups are contiguous once sorted by (distribution, benchmark kind)
        let mut start = 0;
        while start < resolved.len() {
            let group = (resolved[start].order.0, resolved[start].order.1);
            let end = resolved[start..]
                .iter()
                .position(|entry| (entry.order.0, entry.order.1) != group)
                .map_or(resolved.len(), |offset| start + offset);

            let values: Vec<f64> = resolved[start..end]
                .iter()
                .map(|entry| entry.row.normalized_ns)
                .collect();
            for (entry, rank) in resolved[start..end].iter_mut().zip(average_ranks(&values)) {
                entry.row.rank_in_group = rank;
            }
            start = end;
        }

        let summary = self.summarize(&resolved);
        let rows: Vec<AggregatedRow> = resolved.into_iter().map(|entry| entry.row).collect();
        debug!(rows = rows.len(), subjects = summary.len(), "aggregated");

        Ok(Aggregation { rows, summary })
    }

    fn resolve(&self, observation: &Observation) -> Result<Resolved> {
        let subject = self.registry.canonical_subject(&observation.subject);
        let order = (
            self.registry
                .distributions
                .index_of(&observation.distribution)?,
            self.registry
                .benchmark_kinds
                .index_of(&observation.benchmark_kind)?,
            self.registry.subjects.index_of(subject)?,
        );

        Ok(Resolved {
            order,
            row: AggregatedRow {
                distribution: observation.distribution.clone(),
                benchmark_kind: observation.benchmark_kind.clone(),
                subject: subject.to_string(),
                normalized_ns: self.normalize(&observation.benchmark_kind, observation.ns),
                rank_in_group: 0.0,
            },
        })
    }

    fn summarize(&self, resolved: &[Resolved]) -> Vec<SummaryRow> {
        let mut summary = Vec::new();
        for (subject_idx, subject) in self.registry.subjects.members().iter().enumerate() {
            let rows: Vec<&AggregatedRow> = resolved
                .iter()
                .filter(|entry| entry.order.2 == subject_idx)
                .map(|entry| &entry.row)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let ranks: Vec<f64> = rows.iter().map(|row| row.rank_in_group).collect();
            let times: Vec<f64> = rows.iter().map(|row| row.normalized_ns).collect();
            summary.push(SummaryRow {
                subject: subject.clone(),
                avg_rank: ranks.iter().sum::<f64>() / ranks.len() as f64,
                geometric_mean_ns: geometric_mean(&times),
            });
        }
        summary
    }
}

/// Ascending 1-based ranks; tied values receive the mean of the ranks they occupy.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j hold ranks i+1..=j
        let rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        i = j;
    }
    ranks
}

/// `exp(mean(ln x))`. NaN for an empty slice.
pub fn geometric_mean(values: &[f64]) -> f64 {
    let log_sum: f64 = values.iter().map(|v| v.ln()).sum();
    (log_sum / values.len() as f64).exp()
}
