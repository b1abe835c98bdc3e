//! Replicate averaging.
//!
//! Repeated measurements of one physical sample are exported as
//! `<base>_<n>.csv`. Files sharing a base identity are averaged element-wise
//! into one table per sample.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;

use super::loader::{list_data_files, parse_number, read_raw_table, BatchSummary, IssueKind};
use super::model::RawTable;
use crate::error::Result;

/// Fully numeric, rectangular table.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub rows: Vec<Vec<f64>>,
}

impl NumericTable {
    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.rows.first().map_or(0, Vec::len))
    }

    /// Convert a raw table; fails on ragged rows or non-numeric cells.
    /// Blank lines are ignored.
    pub fn from_raw(raw: &RawTable) -> std::result::Result<Self, String> {
        let width = raw.n_columns();
        let mut rows = Vec::with_capacity(raw.n_rows());
        for (r, row) in raw.rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            if row.len() != width {
                return Err(format!("row {r} has {} fields, expected {width}", row.len()));
            }
            let values = row
                .iter()
                .enumerate()
                .map(|(c, field)| {
                    parse_number(field).ok_or_else(|| format!("row {r}, column {c}: '{field}' is not a number"))
                })
                .collect::<std::result::Result<Vec<f64>, String>>()?;
            rows.push(values);
        }
        Ok(Self { rows })
    }
}

/// One averaged output table.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedTable {
    /// Base sample identity shared by all members.
    pub base: String,
    /// Member file names that went into the mean.
    pub members: Vec<String>,
    pub table: NumericTable,
}

/// Strip the extension and a trailing `_<number>` replicate suffix.
pub fn base_identity(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match stem.rsplit_once('_') {
        Some((base, suffix)) if !base.is_empty() && suffix.parse::<f64>().is_ok() => {
            base.to_string()
        }
        _ => stem.to_string(),
    }
}

/// Group file names by base identity; group order is by base name.
pub fn group_replicates<S: AsRef<str>>(file_names: &[S]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in file_names {
        let name = name.as_ref();
        groups
            .entry(base_identity(name))
            .or_default()
            .push(name.to_string());
    }
    groups
}

/// Element-wise mean of same-shaped tables.
///
/// Returns `Err((expected, found))` with the first mismatching shape.
pub fn mean_table(
    tables: &[NumericTable],
) -> std::result::Result<NumericTable, ((usize, usize), (usize, usize))> {
    let Some(first) = tables.first() else {
        return Ok(NumericTable { rows: Vec::new() });
    };
    let shape = first.shape();
    if let Some(bad) = tables.iter().find(|t| t.shape() != shape) {
        return Err((shape, bad.shape()));
    }

    let n = tables.len() as f64;
    let rows = (0..shape.0)
        .map(|r| {
            (0..shape.1)
                .map(|c| tables.iter().map(|t| t.rows[r][c]).sum::<f64>() / n)
                .collect()
        })
        .collect();
    Ok(NumericTable { rows })
}

/// Average every replicate group found in `dir`.
///
/// Unreadable members are recorded and left out of their group; groups with
/// mismatched shapes are skipped entirely.
pub fn average_replicates_in(
    dir: &Path,
    extensions: &[String],
) -> Result<(Vec<AveragedTable>, BatchSummary)> {
    let names = list_data_files(dir, extensions)?;
    let mut summary = BatchSummary::default();
    let mut averaged = Vec::new();

    for (base, members) in group_replicates(&names) {
        let mut tables = Vec::with_capacity(members.len());
        let mut used = Vec::with_capacity(members.len());
        for name in &members {
            let parsed = read_raw_table(&dir.join(name))
                .map_err(|e| e.to_string())
                .and_then(|raw| NumericTable::from_raw(&raw));
            match parsed {
                Ok(t) => {
                    tables.push(t);
                    used.push(name.clone());
                }
                Err(reason) => summary.record_error(name, IssueKind::Unreadable { reason }),
            }
        }
        if tables.is_empty() {
            continue;
        }

        match mean_table(&tables) {
            Ok(table) => {
                for name in &used {
                    summary.record_processed(name);
                }
                averaged.push(AveragedTable {
                    base,
                    members: used,
                    table,
                });
            }
            Err((expected, found)) => {
                summary.record_skip(&base, IssueKind::ShapeMismatch { expected, found })
            }
        }
    }

    info!(
        "Averaged {} replicate groups from {}",
        averaged.len(),
        dir.display()
    );
    Ok((averaged, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_base_identity() {
        assert_eq!(base_identity("sample_1.csv"), "sample");
        assert_eq!(base_identity("sample_2.5.csv"), "sample");
        assert_eq!(base_identity("PET_bottle_3.csv"), "PET_bottle");
        assert_eq!(base_identity("sample_a.csv"), "sample_a");
        assert_eq!(base_identity("sample.csv"), "sample");
        assert_eq!(base_identity("_1.csv"), "_1");
    }

    #[test]
    fn test_group_replicates() {
        let groups = group_replicates(&["b_1.csv", "a_2.csv", "a_1.csv", "c.csv"]);
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(groups["a"], vec!["a_2.csv", "a_1.csv"]);
    }

    #[test]
    fn test_mean_table_shape_mismatch() {
        let a = NumericTable {
            rows: vec![vec![1.0, 2.0]],
        };
        let b = NumericTable {
            rows: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        };
        assert_eq!(mean_table(&[a, b]).unwrap_err(), ((1, 2), (2, 2)));
    }

    #[test]
    fn test_averages_two_replicates() {
        let dir = TempDir::new().unwrap();
        let mut v1 = String::new();
        let mut v2 = String::new();
        for i in 0..10 {
            v1.push_str(&format!("{},{}\n", 4000 - i, i as f64 * 0.1));
            v2.push_str(&format!("{},{}\n", 4000 - i, i as f64 * 0.3));
        }
        fs::write(dir.path().join("sample_1.csv"), v1).unwrap();
        fs::write(dir.path().join("sample_2.csv"), v2).unwrap();

        let exts = vec!["csv".to_string()];
        let (averaged, summary) = average_replicates_in(dir.path(), &exts).unwrap();
        assert_eq!(averaged.len(), 1);
        assert_eq!(summary.counts(), (2, 0, 0));

        let out = &averaged[0];
        assert_eq!(out.base, "sample");
        assert_eq!(out.table.shape(), (10, 2));
        for (i, row) in out.table.rows.iter().enumerate() {
            assert!((row[0] - (4000 - i) as f64).abs() < 1e-9);
            assert!((row[1] - i as f64 * 0.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_blank_lines_do_not_make_a_table_ragged() {
        let raw = crate::data::loader::read_raw_table_from(&b"1,2\n\n3,4\n"[..]).unwrap();
        let table = NumericTable::from_raw(&raw).unwrap();
        assert_eq!(table.rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_mismatched_group_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x_1.csv"), "1,2\n3,4\n").unwrap();
        fs::write(dir.path().join("x_2.csv"), "1,2\n").unwrap();
        fs::write(dir.path().join("y_1.csv"), "1,2\n").unwrap();
        fs::write(dir.path().join("z_1.csv"), "1,abc\n").unwrap();

        let exts = vec!["csv".to_string()];
        let (averaged, summary) = average_replicates_in(dir.path(), &exts).unwrap();
        assert_eq!(averaged.len(), 1);
        assert_eq!(averaged[0].base, "y");
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].file, "x");
        assert_eq!(summary.errors.len(), 1);
    }
}
