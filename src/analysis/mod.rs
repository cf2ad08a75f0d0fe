/// Core frequency processing: column resolution, classification,
/// nearest-neighbour extraction and aggregation.
///
/// ```text
///   Table headers ──► columns::resolve ──► Dataset
///                                            │
///                 ┌──────────────────────────┴───────────┐
///                 ▼                                      ▼
///      classify::classify_dataset              extract::extract(targets)
///                 │                                      │
///                 ▼                                      ▼
///      aggregate::aggregate                     Vec<ExtractedRow>
///                 │
///                 ▼
///          GroupedResult
/// ```

pub mod aggregate;
pub mod classify;
pub mod columns;
pub mod extract;
