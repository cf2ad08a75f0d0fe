use std::collections::BTreeMap;

use crate::analysis::columns::ColumnRoles;
use crate::error::{Error, Result};

use super::table::{CellValue, Table};

// ---------------------------------------------------------------------------
// MeasurementRow – one frequency / magnitude reading
// ---------------------------------------------------------------------------

/// One record of an input table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRow {
    pub raw_frequency: f64,
    pub magnitude: f64,
}

impl MeasurementRow {
    pub fn new(raw_frequency: f64, magnitude: f64) -> Self {
        Self {
            raw_frequency,
            magnitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – rows plus the columns they were read from
// ---------------------------------------------------------------------------

/// Measurement rows of one file with the resolved source columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub rows: Vec<MeasurementRow>,
    /// Header of the column read as frequency.
    pub frequency_column: String,
    /// Header of the column read as magnitude.
    pub magnitude_column: String,
}

impl Dataset {
    /// Build a dataset from in-memory rows with the default column labels.
    pub fn from_rows(rows: Vec<MeasurementRow>) -> Self {
        Self {
            rows,
            frequency_column: "Frequency".to_string(),
            magnitude_column: "Magnitude".to_string(),
        }
    }

    /// Read the frequency / magnitude columns of `table` selected by `roles`.
    ///
    /// Rows where both role cells are blank are skipped (trailing blank
    /// lines in instrument exports). A single blank cell reads as NaN.
    pub fn from_table(table: &Table, roles: &ColumnRoles) -> Result<Self> {
        let header = |idx: usize| table.headers.get(idx).cloned().unwrap_or_default();
        let frequency_column = header(roles.frequency);
        let magnitude_column = header(roles.magnitude);

        let mut rows = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let freq_cell = table.cell(row, roles.frequency);
            let mag_cell = table.cell(row, roles.magnitude);
            if freq_cell.is_null() && mag_cell.is_null() {
                continue;
            }
            let raw_frequency = numeric(freq_cell, row, &frequency_column)?;
            let magnitude = numeric(mag_cell, row, &magnitude_column)?;
            rows.push(MeasurementRow::new(raw_frequency, magnitude));
        }

        Ok(Self {
            rows,
            frequency_column,
            magnitude_column,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn numeric(cell: &CellValue, row: usize, column: &str) -> Result<f64> {
    if cell.is_null() {
        return Ok(f64::NAN);
    }
    cell.as_f64().ok_or_else(|| Error::InvalidCell {
        row,
        column: column.to_string(),
        value: cell.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// A measurement snapped onto the base-frequency grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedRow {
    pub original_frequency: f64,
    pub classified_frequency: i64,
    pub magnitude: f64,
}

/// The measurement selected for one target grid frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedRow {
    pub target_frequency: f64,
    pub actual_frequency: f64,
    pub magnitude: f64,
}

// ---------------------------------------------------------------------------
// GroupedResult – per-bucket aggregate
// ---------------------------------------------------------------------------

/// Mean magnitude and sample count of one classified frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub mean_magnitude: f64,
    pub count: usize,
}

/// Aggregates keyed by classified frequency, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedResult {
    groups: BTreeMap<i64, GroupStats>,
}

impl GroupedResult {
    pub(crate) fn from_groups(groups: BTreeMap<i64, GroupStats>) -> Self {
        Self { groups }
    }

    pub fn get(&self, classified_frequency: i64) -> Option<&GroupStats> {
        self.groups.get(&classified_frequency)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &GroupStats)> + '_ {
        self.groups.iter().map(|(k, v)| (*k, v))
    }

    /// Number of distinct classified frequencies.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Lowest and highest classified frequency.
    pub fn frequency_range(&self) -> Option<(i64, i64)> {
        let lo = self.groups.keys().next()?;
        let hi = self.groups.keys().next_back()?;
        Some((*lo, *hi))
    }
}

// ---------------------------------------------------------------------------
// TargetGrid
// ---------------------------------------------------------------------------

/// Ordered frequencies an extraction pass looks up.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    points: Vec<f64>,
}

impl TargetGrid {
    pub const DEFAULT_START: f64 = 50.0;
    pub const DEFAULT_STOP: f64 = 22_000.0;
    pub const DEFAULT_STEP: f64 = 50.0;

    /// `start, start + step, …` up to and including `stop`.
    ///
    /// A non-positive step yields an empty grid.
    pub fn range(start: f64, stop: f64, step: f64) -> Self {
        let mut points = Vec::new();
        if step > 0.0 && start <= stop {
            let n = ((stop - start) / step + 1e-9).floor() as usize;
            points.extend((0..=n).map(|i| start + i as f64 * step));
        }
        Self { points }
    }

    pub fn from_points(points: Vec<f64>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for TargetGrid {
    fn default() -> Self {
        Self::range(Self::DEFAULT_START, Self::DEFAULT_STOP, Self::DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn default_grid_has_440_points() {
        let grid = TargetGrid::default();
        assert_eq!(grid.len(), 440);
        assert_eq!(grid.points()[0], 50.0);
        assert_eq!(grid.points()[439], 22_000.0);
    }

    #[test]
    fn grid_with_bad_step_is_empty() {
        assert!(TargetGrid::range(50.0, 100.0, 0.0).is_empty());
        assert!(TargetGrid::range(200.0, 100.0, 50.0).is_empty());
    }

    #[test]
    fn dataset_reads_role_columns_and_skips_blank_rows() {
        let t = table(
            &["Level", "Freq"],
            vec![
                vec![CellValue::Float(60.5), CellValue::Integer(100)],
                vec![CellValue::Null, CellValue::Null],
                vec![CellValue::String("61".into()), CellValue::Float(150.5)],
            ],
        );
        let roles = ColumnRoles {
            frequency: 1,
            magnitude: 0,
            frequency_fallback: false,
            magnitude_fallback: false,
        };
        let ds = Dataset::from_table(&t, &roles).unwrap();
        assert_eq!(ds.frequency_column, "Freq");
        assert_eq!(ds.magnitude_column, "Level");
        assert_eq!(
            ds.rows,
            vec![
                MeasurementRow::new(100.0, 60.5),
                MeasurementRow::new(150.5, 61.0)
            ]
        );
    }

    #[test]
    fn dataset_rejects_text_in_role_column() {
        let t = table(
            &["Hz", "dB"],
            vec![vec![CellValue::String("loud".into()), CellValue::Float(1.0)]],
        );
        let err = Dataset::from_table(&t, &ColumnRoles::positional()).unwrap_err();
        assert!(matches!(err, Error::InvalidCell { row: 0, .. }));
    }
}
