use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Column roles
// ---------------------------------------------------------------------------

/// Logical role a column can play in a measurement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Frequency,
    Magnitude,
}

/// Roles in evaluation order; frequency claims its header first.
const VOCABULARY: &[(Role, &[&str])] = &[
    (Role::Frequency, &["frequency", "freq", "hz"]),
    (Role::Magnitude, &["dbspl", "mag", "magnitude", "db"]),
];

/// Column indices selected for frequency and magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    pub frequency: usize,
    pub magnitude: usize,
    /// Frequency came from the positional fallback (column 0).
    pub frequency_fallback: bool,
    /// Magnitude came from the positional fallback (column 1).
    pub magnitude_fallback: bool,
}

impl ColumnRoles {
    /// Column 0 is frequency, column 1 is magnitude; no header sniffing.
    pub fn positional() -> Self {
        Self {
            frequency: 0,
            magnitude: 1,
            frequency_fallback: false,
            magnitude_fallback: false,
        }
    }
}

fn matches(header: &str, words: &[&str]) -> bool {
    let lower = header.to_lowercase();
    words.iter().any(|w| lower.contains(w))
}

/// Pick the frequency and magnitude columns from `headers`.
///
/// The first header (in column order) containing a role's vocabulary wins
/// that role. Unmatched roles fall back to column 0 (frequency) and
/// column 1 (magnitude); a fallback onto a column the other role already
/// claimed is a [`Error::ColumnCollision`].
pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<ColumnRoles> {
    if headers.len() < 2 {
        return Err(Error::InsufficientColumns {
            found: headers.len(),
        });
    }

    let mut frequency: Option<usize> = None;
    let mut magnitude: Option<usize> = None;
    for (role, words) in VOCABULARY {
        let found = headers.iter().enumerate().position(|(idx, h)| {
            Some(idx) != frequency && Some(idx) != magnitude && matches(h.as_ref(), words)
        });
        match role {
            Role::Frequency => frequency = found,
            Role::Magnitude => magnitude = found,
        }
    }

    let collision = |index: usize| Error::ColumnCollision {
        index,
        header: headers[index].as_ref().to_string(),
    };

    let frequency_fallback = frequency.is_none();
    let frequency = match frequency {
        Some(idx) => idx,
        None if magnitude == Some(0) => return Err(collision(0)),
        None => 0,
    };
    let magnitude_fallback = magnitude.is_none();
    let magnitude = match magnitude {
        Some(idx) => idx,
        None if frequency == 1 => return Err(collision(1)),
        None => 1,
    };

    Ok(ColumnRoles {
        frequency,
        magnitude,
        frequency_fallback,
        magnitude_fallback,
    })
}
