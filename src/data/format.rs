use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Modality – which instrument produced the export
// ---------------------------------------------------------------------------

/// Thermal-analysis technique a curve collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Thermogravimetric analysis: weight against temperature.
    Tga,
    /// Differential scanning calorimetry: heat flow against temperature.
    Dsc,
}

impl Modality {
    pub const ALL: [Modality; 2] = [Modality::Tga, Modality::Dsc];

    /// Upper-case label, also the conventional folder name (`TGA/`, `DSC/`).
    pub fn label(self) -> &'static str {
        match self {
            Modality::Tga => "TGA",
            Modality::Dsc => "DSC",
        }
    }

    /// Axis label of the response channel.
    pub fn y_label(self) -> &'static str {
        match self {
            Modality::Tga => "Weight Retention",
            Modality::Dsc => "DSC Signal",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tga" => Ok(Modality::Tga),
            "dsc" => Ok(Modality::Dsc),
            other => Err(format!("unknown modality '{other}' (expected tga or dsc)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Format table
// ---------------------------------------------------------------------------

/// Where the X and Y channels live in one instrument export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    /// Leading header/metadata rows to discard.
    pub rows_to_skip: usize,
    pub x_column: usize,
    pub y_column: usize,
}

impl FormatSpec {
    const fn new(rows_to_skip: usize, x_column: usize, y_column: usize) -> Self {
        Self {
            rows_to_skip,
            x_column,
            y_column,
        }
    }

    /// Minimum number of columns a record needs for this layout.
    pub fn required_columns(&self) -> usize {
        self.x_column.max(self.y_column) + 1
    }
}

/// (modality, sample-name prefix) → layout. Adding an instrument export
/// format means adding a row here.
const FORMAT_TABLE: &[(Modality, &str, FormatSpec)] = &[
    (Modality::Tga, "HDPE-", FormatSpec::new(3, 1, 2)),
    (Modality::Tga, "LDPE-", FormatSpec::new(3, 3, 2)),
    (Modality::Dsc, "HDPE-", FormatSpec::new(0, 0, 1)),
    (Modality::Dsc, "LDPE-", FormatSpec::new(10, 1, 2)),
];

/// Look up the export layout for a file name; `None` if the naming
/// convention is not recognised.
pub fn detect_format(modality: Modality, file_name: &str) -> Option<FormatSpec> {
    FORMAT_TABLE
        .iter()
        .find(|(m, prefix, _)| *m == modality && file_name.starts_with(prefix))
        .map(|(_, _, layout)| *layout)
}

/// Recognised sample-name prefixes for a modality.
pub fn known_prefixes(modality: Modality) -> impl Iterator<Item = &'static str> {
    FORMAT_TABLE
        .iter()
        .filter(move |(m, _, _)| *m == modality)
        .map(|(_, prefix, _)| *prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_tga_layouts() {
        let hdpe = detect_format(Modality::Tga, "HDPE-01.csv").unwrap();
        assert_eq!((hdpe.rows_to_skip, hdpe.x_column, hdpe.y_column), (3, 1, 2));
        let ldpe = detect_format(Modality::Tga, "LDPE-7.csv").unwrap();
        assert_eq!((ldpe.rows_to_skip, ldpe.x_column, ldpe.y_column), (3, 3, 2));
        assert_eq!(ldpe.required_columns(), 4);
    }

    #[test]
    fn test_detect_dsc_layouts() {
        let hdpe = detect_format(Modality::Dsc, "HDPE-01.csv").unwrap();
        assert_eq!((hdpe.rows_to_skip, hdpe.x_column, hdpe.y_column), (0, 0, 1));
        let ldpe = detect_format(Modality::Dsc, "LDPE-01.csv").unwrap();
        assert_eq!((ldpe.rows_to_skip, ldpe.x_column, ldpe.y_column), (10, 1, 2));
    }

    #[test]
    fn test_unknown_prefix() {
        assert_eq!(detect_format(Modality::Tga, "PP-01.csv"), None);
        assert_eq!(detect_format(Modality::Dsc, "hdpe-01.csv"), None);
    }

    #[test]
    fn test_modality_from_str() {
        assert_eq!("TGA".parse::<Modality>().unwrap(), Modality::Tga);
        assert_eq!("dsc".parse::<Modality>().unwrap(), Modality::Dsc);
        assert!("ftir".parse::<Modality>().is_err());
        assert_eq!(known_prefixes(Modality::Tga).count(), 2);
    }
}
