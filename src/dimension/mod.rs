//! Fixed presentation orders for the three report dimensions.
//!
//! The orders are curated, not derived from the data, so reports keep the same layout
//! whichever subset of benchmarks was run.

use crate::config::TableConfig;
use crate::error::{ReportError, Result};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Distribution,
    BenchmarkKind,
    Subject,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Distribution => write!(f, "distribution"),
            Dimension::BenchmarkKind => write!(f, "benchmark kind"),
            Dimension::Subject => write!(f, "subject"),
        }
    }
}

/// Injective mapping from member names to their sort index.
#[derive(Debug, Clone)]
pub struct DimensionOrder {
    dimension: Dimension,
    members: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl DimensionOrder {
    pub fn new(dimension: Dimension, members: &[String]) -> Result<Self> {
        if members.is_empty() {
            return Err(ReportError::InvalidConfig {
                reason: format!("{dimension} order is empty"),
            });
        }

        let mut index = FxHashMap::default();
        for (i, member) in members.iter().enumerate() {
            if index.insert(member.clone(), i).is_some() {
                return Err(ReportError::InvalidConfig {
                    reason: format!("{dimension} '{member}' listed twice"),
                });
            }
        }

        Ok(DimensionOrder {
            dimension,
            members: members.to_vec(),
            index,
        })
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ReportError::UnknownDimensionValue {
                dimension: self.dimension.to_string(),
                value: name.to_string(),
            })
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The three orders plus the subject alias table applied before lookup.
#[derive(Debug, Clone)]
pub struct DimensionRegistry {
    pub distributions: DimensionOrder,
    pub benchmark_kinds: DimensionOrder,
    pub subjects: DimensionOrder,
    aliases: FxHashMap<String, String>,
}

impl DimensionRegistry {
    pub fn new(
        distributions: DimensionOrder,
        benchmark_kinds: DimensionOrder,
        subjects: DimensionOrder,
    ) -> Self {
        DimensionRegistry {
            distributions,
            benchmark_kinds,
            subjects,
            aliases: FxHashMap::default(),
        }
    }

    pub fn from_config(config: &TableConfig) -> Result<Self> {
        let mut registry = DimensionRegistry::new(
            DimensionOrder::new(Dimension::Distribution, &config.distributions)?,
            DimensionOrder::new(Dimension::BenchmarkKind, &config.benchmark_kinds)?,
            DimensionOrder::new(Dimension::Subject, &config.subjects)?,
        );
        for (from, to) in &config.subject_aliases {
            registry = registry.with_alias(from, to);
        }
        Ok(registry)
    }

    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.aliases.insert(from.to_string(), to.to_string());
        self
    }

    /// Presented name for a raw subject name.
    pub fn canonical_subject<'a>(&'a self, subject: &'a str) -> &'a str {
        self.aliases.get(subject).map(String::as_str).unwrap_or(subject)
    }
}
