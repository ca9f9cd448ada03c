use crate::aggregate::{AggregatedRow, SummaryRow};
use crate::error::{ReportError, Result};
use prettytable::{Cell, Row, Table};
use rustc_hash::FxHashMap;

/// Normalized time per (distribution, benchmark kind) row and subject column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub subjects: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub distribution: String,
    pub benchmark_kind: String,
    /// One value per entry of `WideTable::subjects`.
    pub values: Vec<f64>,
}

/// One column per subject, one row per summary metric.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub subjects: Vec<String>,
    pub avg_rank: Vec<f64>,
    pub geometric_mean: Vec<f64>,
}

/// Pivots aggregated rows into the wide layout.
///
/// Rows and columns keep first-appearance order, which is the presentation order for
/// aggregator output. Every row must have a value for every column.
pub fn pivot_wide(rows: &[AggregatedRow]) -> Result<WideTable> {
    let mut subjects: Vec<String> = Vec::new();
    let mut groups: Vec<(&str, &str)> = Vec::new();
    let mut cells: FxHashMap<(&str, &str, &str), f64> = FxHashMap::default();

    for row in rows {
        if !subjects.contains(&row.subject) {
            subjects.push(row.subject.clone());
        }
        let group = (row.distribution.as_str(), row.benchmark_kind.as_str());
        if !groups.contains(&group) {
            groups.push(group);
        }
        cells.insert(
            (group.0, group.1, row.subject.as_str()),
            row.normalized_ns,
        );
    }

    let mut wide_rows = Vec::with_capacity(groups.len());
    for (distribution, benchmark_kind) in groups {
        let values = subjects
            .iter()
            .map(|subject| {
                cells
                    .get(&(distribution, benchmark_kind, subject.as_str()))
                    .copied()
                    .ok_or_else(|| ReportError::MissingCell {
                        distribution: distribution.to_string(),
                        benchmark_kind: benchmark_kind.to_string(),
                        subject: subject.clone(),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;

        wide_rows.push(WideRow {
            distribution: distribution.to_string(),
            benchmark_kind: benchmark_kind.to_string(),
            values,
        });
    }

    Ok(WideTable {
        subjects,
        rows: wide_rows,
    })
}

/// Transposes the per-subject summary so subjects become columns.
pub fn pivot_summary(summary: &[SummaryRow]) -> SummaryTable {
    SummaryTable {
        subjects: summary.iter().map(|s| s.subject.clone()).collect(),
        avg_rank: summary.iter().map(|s| s.avg_rank).collect(),
        geometric_mean: summary.iter().map(|s| s.geometric_mean_ns).collect(),
    }
}

fn number(value: f64, precision: usize) -> Cell {
    Cell::new(&format!("{:.*}", precision, value)).style_spec("r")
}

fn header(first: &[&str], subjects: &[String]) -> Row {
    let mut cells: Vec<Cell> = first.iter().map(|name| Cell::new(name)).collect();
    cells.extend(subjects.iter().map(|s| Cell::new(s).style_spec("r")));
    Row::new(cells)
}

pub fn render_wide(table: &WideTable, precision: usize) -> Table {
    let mut out = Table::new();
    out.add_row(header(&["distr", "bench"], &table.subjects));

    for row in &table.rows {
        let mut cells = vec![Cell::new(&row.distribution), Cell::new(&row.benchmark_kind)];
        cells.extend(row.values.iter().map(|&v| number(v, precision)));
        out.add_row(Row::new(cells));
    }
    out
}

pub fn render_summary(table: &SummaryTable, precision: usize) -> Table {
    let mut out = Table::new();
    out.add_row(header(&["metric"], &table.subjects));

    for (metric, values) in [
        ("avg_rank", &table.avg_rank),
        ("geometric_mean", &table.geometric_mean),
    ] {
        let mut cells = vec![Cell::new(metric)];
        cells.extend(values.iter().map(|&v| number(v, precision)));
        out.add_row(Row::new(cells));
    }
    out
}

/// Prints both tables to stdout.
pub fn print_report(wide: &WideTable, summary: &SummaryTable, precision: usize) {
    println!();
    render_wide(wide, precision).printstd();
    println!();
    render_summary(summary, precision).printstd();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(distr: &str, bench: &str, subject: &str, ns: f64) -> AggregatedRow {
        AggregatedRow {
            distribution: distr.to_string(),
            benchmark_kind: bench.to_string(),
            subject: subject.to_string(),
            normalized_ns: ns,
            rank_in_group: 1.0,
        }
    }

    #[test]
    fn test_pivot_wide() {
        let rows = vec![
            row("u32", "hashonly", "a", 1.0),
            row("u32", "hashonly", "b", 2.0),
            row("u32", "setbuild", "a", 3.0),
            row("u32", "setbuild", "b", 4.0),
        ];
        let wide = pivot_wide(&rows).unwrap();
        assert_eq!(wide.subjects, vec!["a", "b"]);
        assert_eq!(wide.rows.len(), 2);
        assert_eq!(wide.rows[1].benchmark_kind, "setbuild");
        assert_eq!(wide.rows[1].values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_sparse_pivot_is_an_error() {
        let rows = vec![
            row("u32", "hashonly", "a", 1.0),
            row("u32", "hashonly", "b", 2.0),
            row("u64", "hashonly", "a", 3.0),
        ];
        match pivot_wide(&rows).unwrap_err() {
            ReportError::MissingCell {
                distribution,
                subject,
                ..
            } => {
                assert_eq!(distribution, "u64");
                assert_eq!(subject, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pivot_summary() {
        let summary = vec![
            SummaryRow {
                subject: "a".into(),
                avg_rank: 1.25,
                geometric_mean_ns: 200.0,
            },
            SummaryRow {
                subject: "b".into(),
                avg_rank: 1.75,
                geometric_mean_ns: 300.0,
            },
        ];
        let table = pivot_summary(&summary);
        assert_eq!(table.subjects, vec!["a", "b"]);
        assert_eq!(table.avg_rank, vec![1.25, 1.75]);
        assert_eq!(table.geometric_mean, vec![200.0, 300.0]);
    }

    #[test]
    fn test_render_formats_precision() {
        let wide = pivot_wide(&[row("u32", "hashonly", "a", 1.0 / 3.0)]).unwrap();
        let text = render_wide(&wide, 2).to_string();
        assert!(text.contains("distr"));
        assert!(text.contains("0.33"));
        assert!(!text.contains("0.333"));
    }
}
