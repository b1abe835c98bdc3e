/// Data layer: core types, parsing, normalization and comparison.
///
/// Architecture:
/// ```text
///  raw .csv exports (TGA/, DSC/)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  format table → Curve per file, BatchSummary
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   trim    │  explicit bounds, then overlap of all curves
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize │  ratio-to-max | min-max
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resample  │  shared linspace grid → ResampledMatrix
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pairwise  │  all-pairs differences, aggregate curves
///   └──────────┘
/// ```
///
/// `replicate` averages repeated measurements; `writer` persists the matrix,
/// sample index and reports.

pub mod format;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pairwise;
pub mod replicate;
pub mod resample;
pub mod trim;
pub mod writer;
