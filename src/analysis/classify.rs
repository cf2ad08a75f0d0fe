use serde::Deserialize;

use crate::data::model::{ClassifiedRow, Dataset};
use crate::error::{Error, Result};

/// Default grid spacing in Hz.
pub const DEFAULT_BASE: i64 = 50;

/// How a frequency exactly halfway between two multiples of the base is snapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// 75 / 50 = 1.5 → 2, 125 / 50 = 2.5 → 3.
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: 1.5 → 2, 2.5 → 2.
    HalfEven,
}

impl RoundingMode {
    fn apply(self, x: f64) -> f64 {
        match self {
            RoundingMode::HalfAwayFromZero => x.round(),
            RoundingMode::HalfEven => x.round_ties_even(),
        }
    }
}

/// Snap `freq` to the nearest multiple of `base`, ties away from zero.
pub fn classify(freq: f64, base: i64) -> Result<i64> {
    classify_with(freq, base, RoundingMode::HalfAwayFromZero)
}

/// Snap `freq` to the nearest multiple of `base` using `mode` for ties.
pub fn classify_with(freq: f64, base: i64, mode: RoundingMode) -> Result<i64> {
    if base <= 0 {
        return Err(Error::InvalidBase(base));
    }
    if !freq.is_finite() {
        return Err(Error::NotANumber(freq));
    }
    let quotient = mode.apply(freq / base as f64);
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if quotient < i64::MIN as f64 || quotient >= i64::MAX as f64 {
        return Err(Error::FrequencyOutOfRange(freq));
    }
    (quotient as i64)
        .checked_mul(base)
        .ok_or(Error::FrequencyOutOfRange(freq))
}

/// Classify every row of `dataset`, preserving row order.
pub fn classify_dataset(dataset: &Dataset, base: i64, mode: RoundingMode) -> Result<Vec<ClassifiedRow>> {
    dataset
        .rows
        .iter()
        .map(|row| {
            Ok(ClassifiedRow {
                original_frequency: row.raw_frequency,
                classified_frequency: classify_with(row.raw_frequency, base, mode)?,
                magnitude: row.magnitude,
            })
        })
        .collect()
}
