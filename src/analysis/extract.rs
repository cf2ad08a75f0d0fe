use crate::data::model::{Dataset, ExtractedRow, MeasurementRow};
use crate::error::{Error, Result};

/// Row of `rows` whose frequency is closest to `target`.
///
/// Ties go to the earliest row; rows with a non-finite frequency are never
/// selected.
fn nearest(rows: &[MeasurementRow], target: f64) -> Option<&MeasurementRow> {
    let mut best: Option<(&MeasurementRow, f64)> = None;
    for row in rows.iter().filter(|r| r.raw_frequency.is_finite()) {
        let distance = (row.raw_frequency - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((row, distance)),
        }
    }
    best.map(|(row, _)| row)
}

/// For each target, select the dataset row with the nearest frequency.
///
/// Output follows the order of `targets`, one row per target; the same
/// measurement may be selected for several targets. An empty `targets`
/// yields an empty result.
pub fn extract(dataset: &Dataset, targets: &[f64]) -> Result<Vec<ExtractedRow>> {
    if !dataset.rows.iter().any(|r| r.raw_frequency.is_finite()) {
        return Err(Error::EmptyDataset);
    }

    targets
        .iter()
        .map(|&target| {
            let row = nearest(&dataset.rows, target).ok_or(Error::EmptyDataset)?;
            Ok(ExtractedRow {
                target_frequency: target,
                actual_frequency: row.raw_frequency,
                magnitude: row.magnitude,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(f64, f64)]) -> Dataset {
        Dataset::from_rows(rows.iter().map(|&(f, m)| MeasurementRow::new(f, m)).collect())
    }

    fn triples(rows: &[ExtractedRow]) -> Vec<(f64, f64, f64)> {
        rows.iter()
            .map(|r| (r.target_frequency, r.actual_frequency, r.magnitude))
            .collect()
    }

    #[test]
    fn selects_nearest_row_per_target() {
        let ds = dataset(&[(40.0, 1.0), (60.0, 2.0), (120.0, 3.0)]);
        let out = extract(&ds, &[50.0, 100.0]).unwrap();
        assert_eq!(triples(&out), vec![(50.0, 40.0, 1.0), (100.0, 120.0, 3.0)]);
    }

    #[test]
    fn ties_go_to_first_occurrence() {
        let ds = dataset(&[(60.0, 2.0), (40.0, 1.0), (60.0, 9.0)]);
        let out = extract(&ds, &[50.0, 60.0]).unwrap();
        assert_eq!(triples(&out), vec![(50.0, 60.0, 2.0), (60.0, 60.0, 2.0)]);
    }

    #[test]
    fn output_follows_target_order_and_may_repeat_rows() {
        let ds = dataset(&[(1000.0, 70.0), (2000.0, 65.0)]);
        let out = extract(&ds, &[2500.0, 50.0, 900.0, 1999.0]).unwrap();
        assert_eq!(
            triples(&out),
            vec![
                (2500.0, 2000.0, 65.0),
                (50.0, 1000.0, 70.0),
                (900.0, 1000.0, 70.0),
                (1999.0, 2000.0, 65.0),
            ]
        );
    }

    #[test]
    fn empty_targets_give_empty_output() {
        let ds = dataset(&[(40.0, 1.0)]);
        assert!(extract(&ds, &[]).unwrap().is_empty());
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = dataset(&[]);
        assert!(matches!(extract(&ds, &[50.0]), Err(Error::EmptyDataset)));
        assert!(matches!(extract(&ds, &[]), Err(Error::EmptyDataset)));
    }

    #[test]
    fn non_finite_frequencies_are_skipped() {
        let ds = dataset(&[(f64::NAN, 5.0), (80.0, 1.0)]);
        let out = extract(&ds, &[50.0]).unwrap();
        assert_eq!(triples(&out), vec![(50.0, 80.0, 1.0)]);

        let ds = dataset(&[(f64::NAN, 5.0)]);
        assert!(matches!(extract(&ds, &[50.0]), Err(Error::EmptyDataset)));
    }
}
