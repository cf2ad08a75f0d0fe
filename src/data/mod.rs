/// Data layer: tabular I/O and the measurement model.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (headers + cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Table + ColumnRoles → Dataset of MeasurementRows
///   └──────────┘
///        │   (analysis)
///        ▼
///   ┌──────────┐
///   │  writer   │  Workbook → staged .csv / .json files
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod table;
pub mod writer;
