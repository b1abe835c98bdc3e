use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use super::format::{detect_format, known_prefixes, FormatSpec, Modality};
use super::model::{Curve, CurveCollection, RawTable};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Batch summary – file-level problems never abort a batch
// ---------------------------------------------------------------------------

/// Why a single file did not contribute to the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// File name matches no known export layout.
    UnrecognizedFormat,
    /// Record is narrower than the layout's selected columns.
    InsufficientColumns { needed: usize, found: usize },
    /// Nothing numeric left after cleaning.
    NoValidData,
    /// Replicates of one sample disagree in shape.
    ShapeMismatch { expected: (usize, usize), found: (usize, usize) },
    /// File could not be read as tabular data.
    Unreadable { reason: String },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::UnrecognizedFormat => write!(f, "unrecognized naming format"),
            IssueKind::InsufficientColumns { needed, found } => {
                write!(f, "insufficient columns (need {needed}, found {found})")
            }
            IssueKind::NoValidData => write!(f, "no valid data after cleaning"),
            IssueKind::ShapeMismatch { expected, found } => write!(
                f,
                "shape mismatch ({}x{} vs {}x{})",
                expected.0, expected.1, found.0, found.1
            ),
            IssueKind::Unreadable { reason } => write!(f, "unreadable: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileIssue {
    pub file: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// Per-batch record of processed, skipped and failed files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: Vec<String>,
    pub skipped: Vec<FileIssue>,
    pub errors: Vec<FileIssue>,
}

impl BatchSummary {
    pub fn record_processed(&mut self, file: &str) {
        debug!("Processed {file}");
        self.processed.push(file.to_string());
    }

    pub fn record_skip(&mut self, file: &str, kind: IssueKind) {
        warn!("Skipping {file}: {kind}");
        self.skipped.push(FileIssue {
            file: file.to_string(),
            kind,
        });
    }

    pub fn record_error(&mut self, file: &str, kind: IssueKind) {
        warn!("Error in {file}: {kind}");
        self.errors.push(FileIssue {
            file: file.to_string(),
            kind,
        });
    }

    /// `(processed, skipped, errors)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.processed.len(), self.skipped.len(), self.errors.len())
    }

    pub fn merge(&mut self, other: BatchSummary) {
        self.processed.extend(other.processed);
        self.skipped.extend(other.skipped);
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, s, e) = self.counts();
        writeln!(f, "Processed files: {p}")?;
        writeln!(f, "Skipped files: {s}")?;
        writeln!(f, "Errors: {e}")?;
        for issue in self.skipped.iter().chain(&self.errors) {
            writeln!(f, "  {}: {}", issue.file, issue.kind)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Raw tabular reading
// ---------------------------------------------------------------------------

/// Read a headerless, comma-separated export. Bytes are decoded as Latin-1
/// so instrument headers with `°` etc. never fail decoding.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let file = fs::File::open(path)?;
    read_raw_table_from(file)
}

pub fn read_raw_table_from<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    // The csv reader drops blank lines; they are kept as empty rows so that a
    // layout's skip count always refers to physical lines.
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut next_line = 1;
    for record in csv_reader.byte_records() {
        let record = record?;
        if let Some(pos) = record.position() {
            while next_line < pos.line() {
                rows.push(Vec::new());
                next_line += 1;
            }
            let embedded = record.as_slice().iter().filter(|&&b| b == b'\n').count() as u64;
            next_line = pos.line() + embedded + 1;
        }
        rows.push(record.iter().map(decode_latin1).collect());
    }
    Ok(RawTable::new(rows))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Coerce a raw field to a finite float; anything else is `None`.
pub fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sample identifier: file name with its extension removed.
pub fn sample_id(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

// ---------------------------------------------------------------------------
// Sample parser
// ---------------------------------------------------------------------------

/// Select the X/Y channels of `table` according to `layout`.
///
/// Leading `rows_to_skip` rows are discarded, then every row whose X or Y
/// field is not a finite number is dropped.
pub fn parse_curve(
    table: &RawTable,
    layout: FormatSpec,
    sample: &str,
) -> std::result::Result<Curve, IssueKind> {
    let body = &table.rows[layout.rows_to_skip.min(table.rows.len())..];
    let found = body.iter().map(Vec::len).max().unwrap_or(0);
    if body.is_empty() {
        return Err(IssueKind::NoValidData);
    }
    if found < layout.required_columns() {
        return Err(IssueKind::InsufficientColumns {
            needed: layout.required_columns(),
            found,
        });
    }

    let (x, y): (Vec<f64>, Vec<f64>) = body
        .iter()
        .filter_map(|row| {
            let x = parse_number(row.get(layout.x_column)?)?;
            let y = parse_number(row.get(layout.y_column)?)?;
            Some((x, y))
        })
        .unzip();

    if x.is_empty() {
        return Err(IssueKind::NoValidData);
    }
    Ok(Curve::new(sample, x, y))
}

/// Detect the layout from `file_name`, then parse. Unknown naming is reported
/// as [`IssueKind::UnrecognizedFormat`].
pub fn parse_named_table(
    table: &RawTable,
    modality: Modality,
    file_name: &str,
) -> std::result::Result<Curve, IssueKind> {
    let layout = detect_format(modality, file_name).ok_or(IssueKind::UnrecognizedFormat)?;
    parse_curve(table, layout, &sample_id(file_name))
}

// ---------------------------------------------------------------------------
// Folder scan
// ---------------------------------------------------------------------------

/// File names in `dir` whose extension is one of `extensions`
/// (case-insensitive), sorted.
pub fn list_data_files(dir: &Path, extensions: &[String]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let ext = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Parse every recognised export in `dir` into a curve collection.
///
/// Only a missing/unlistable directory is an error; per-file problems are
/// recorded in the returned summary.
pub fn load_modality_folder(
    dir: &Path,
    modality: Modality,
    extensions: &[String],
) -> Result<(CurveCollection, BatchSummary)> {
    let mut summary = BatchSummary::default();
    let mut curves = Vec::new();

    for name in list_data_files(dir, extensions)? {
        let Some(layout) = detect_format(modality, &name) else {
            debug!(
                "{name}: expected one of {:?}",
                known_prefixes(modality).collect::<Vec<_>>()
            );
            summary.record_skip(&name, IssueKind::UnrecognizedFormat);
            continue;
        };
        let table = match read_raw_table(&dir.join(&name)) {
            Ok(t) => t,
            Err(e) => {
                summary.record_error(
                    &name,
                    IssueKind::Unreadable {
                        reason: e.to_string(),
                    },
                );
                continue;
            }
        };
        match parse_curve(&table, layout, &sample_id(&name)) {
            Ok(curve) => {
                summary.record_processed(&name);
                curves.push(curve);
            }
            Err(kind) => summary.record_skip(&name, kind),
        }
    }

    info!(
        "{modality}: parsed {} curves from {}",
        curves.len(),
        dir.display()
    );
    Ok((CurveCollection::new(curves), summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn table(text: &str) -> RawTable {
        read_raw_table_from(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_tga_hdpe_drops_headers_and_junk() {
        let raw = table(
            "Instrument,TGA\nRun,1\nIndex,Temp,Weight\n\
             0,30.0,10.0\n1,31.0,9.9\n2,n/a,9.8\n3,33.0,\n4,34.0,9.6\n",
        );
        let curve = parse_named_table(&raw, Modality::Tga, "HDPE-01.csv").unwrap();
        assert_eq!(curve.sample, "HDPE-01");
        assert_eq!(curve.x, vec![30.0, 31.0, 34.0]);
        assert_eq!(curve.y, vec![10.0, 9.9, 9.6]);
        // rows_out = rows_in - (dropped + skipped)
        assert_eq!(curve.len(), raw.n_rows() - (2 + 3));
    }

    #[test]
    fn test_parse_tga_ldpe_reads_x_from_fourth_column() {
        let raw = table("h\nh\nh\n0,0.5,10.0,25.0\n1,0.6,9.0,26.0\n");
        let curve = parse_named_table(&raw, Modality::Tga, "LDPE-2.csv").unwrap();
        assert_eq!(curve.x, vec![25.0, 26.0]);
        assert_eq!(curve.y, vec![10.0, 9.0]);
    }

    #[test]
    fn test_insufficient_columns() {
        let raw = table("h\nh\nh\n0,1.0,2.0\n");
        let err = parse_named_table(&raw, Modality::Tga, "LDPE-1.csv").unwrap_err();
        assert_eq!(
            err,
            IssueKind::InsufficientColumns {
                needed: 4,
                found: 3
            }
        );
    }

    #[test]
    fn test_unrecognized_and_empty() {
        let raw = table("1,2\n");
        assert_eq!(
            parse_named_table(&raw, Modality::Dsc, "PP-1.csv").unwrap_err(),
            IssueKind::UnrecognizedFormat
        );
        let junk = table("a,b\nc,d\n");
        assert_eq!(
            parse_named_table(&junk, Modality::Dsc, "HDPE-1.csv").unwrap_err(),
            IssueKind::NoValidData
        );
    }

    #[test]
    fn test_blank_lines_are_kept_as_empty_rows() {
        let raw = table("Sample,HDPE\n\nIndex,Temp,Weight\n0,30.0,10.0\n1,31.0,9.9\n2,32.0,9.8\n");
        assert_eq!(raw.n_rows(), 6);
        assert!(raw.rows[1].is_empty());
        let curve = parse_named_table(&raw, Modality::Tga, "HDPE-01.csv").unwrap();
        assert_eq!(curve.x, vec![30.0, 31.0, 32.0]);
    }

    #[test]
    fn test_parse_dsc_ldpe_with_blank_metadata_line() {
        let mut text = String::from("Filename,run.tri\nOperator,lab\n\n");
        for k in 0..6 {
            text.push_str(&format!("Meta{k},value\n"));
        }
        text.push_str("Time (min),Temperature (\u{b0}C),Heat Flow (W/g)\n");
        text.push_str("0.0,25.0,-0.10\n0.1,25.5,-0.12\n0.2,bad,-0.13\n0.3,26.5,-0.15\n");
        let raw = table(&text);
        assert_eq!(raw.n_rows(), 14);

        let curve = parse_named_table(&raw, Modality::Dsc, "LDPE-03.csv").unwrap();
        assert_eq!(curve.sample, "LDPE-03");
        assert_eq!(curve.x, vec![25.0, 25.5, 26.5]);
        assert_eq!(curve.y, vec![-0.10, -0.12, -0.15]);
        // rows_out = rows_in - (dropped + skipped)
        assert_eq!(curve.len(), raw.n_rows() - (1 + 10));
    }

    #[test]
    fn test_quoted_newline_does_not_add_rows() {
        let raw = table("\"two\nlines\",x\n1,2\n");
        assert_eq!(raw.n_rows(), 2);
        assert_eq!(raw.field(1, 1), Some("2"));
    }

    #[test]
    fn test_sample_id_strips_extension() {
        assert_eq!(sample_id("HDPE-01.csv"), "HDPE-01");
        assert_eq!(sample_id("LDPE-1.5.csv"), "LDPE-1.5");
        assert_eq!(sample_id("plain"), "plain");
    }

    #[test]
    fn test_latin1_header_is_tolerated() {
        let raw = read_raw_table_from(&b"Temp \xb0C,Signal\n1.0,2.0\n"[..]).unwrap();
        assert_eq!(raw.field(0, 0), Some("Temp °C"));
        let curve = parse_named_table(&raw, Modality::Dsc, "HDPE-9.csv").unwrap();
        assert_eq!(curve.len(), 1);
    }

    #[test]
    fn test_load_folder_records_summary() {
        let dir = TempDir::new().unwrap();
        let write = |name: &str, body: &str| {
            let mut f = fs::File::create(dir.path().join(name)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        };
        write("HDPE-01.csv", "30,1.0\n40,0.9\n");
        write("HDPE-02.CSV", "30,1.0\n40,0.8\n");
        write("PP-01.csv", "30,1.0\n");
        write("LDPE-01.csv", "only,header\n");
        write("notes.txt", "ignored");

        let exts = vec!["csv".to_string()];
        let (curves, summary) =
            load_modality_folder(dir.path(), Modality::Dsc, &exts).unwrap();
        assert_eq!(curves.sample_names(), vec!["HDPE-01", "HDPE-02"]);
        assert_eq!(summary.counts(), (2, 2, 0));
        assert!(summary.to_string().contains("PP-01.csv: unrecognized naming format"));
    }

    #[test]
    fn test_missing_folder_is_error() {
        let exts = vec!["csv".to_string()];
        assert!(load_modality_folder(Path::new("/no/such/dir"), Modality::Tga, &exts).is_err());
    }
}
