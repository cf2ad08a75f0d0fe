use std::collections::BTreeMap;

use crate::data::model::{ClassifiedRow, GroupStats, GroupedResult};
use crate::error::{Error, Result};

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Group `rows` by classified frequency and compute mean magnitude and count.
///
/// Sums run in input order so repeated runs produce identical means.
/// Rows with a blank (non-finite) magnitude do not contribute; a bucket
/// left with no contributing row is omitted.
pub fn aggregate(rows: &[ClassifiedRow]) -> Result<GroupedResult> {
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut acc: BTreeMap<i64, Accumulator> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.magnitude.is_finite()) {
        let slot = acc.entry(row.classified_frequency).or_default();
        slot.sum += row.magnitude;
        slot.count += 1;
    }

    let groups = acc
        .into_iter()
        .map(|(freq, a)| {
            (
                freq,
                GroupStats {
                    mean_magnitude: a.sum / a.count as f64,
                    count: a.count,
                },
            )
        })
        .collect();

    Ok(GroupedResult::from_groups(groups))
}
