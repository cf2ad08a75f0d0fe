use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tempfile::NamedTempFile;

use super::table::{CellValue, Sheet, Workbook};

/// On-disk layout for result workbooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `.csv` per sheet; a single-sheet workbook gets no sheet suffix.
    #[default]
    Csv,
    /// One `.json` file holding every sheet.
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write `workbook` under `dir` using `stem` as the base file name.
///
/// Every file is rendered in memory and staged as a temporary file inside
/// `dir` before any of them is renamed into place, so a failure while
/// rendering or writing leaves no partial output behind.
///
/// Returns the paths written, in sheet order.
pub fn write_workbook(
    dir: &Path,
    stem: &str,
    workbook: &Workbook,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let ext = format.extension();
    let rendered: Vec<(PathBuf, Vec<u8>)> = match format {
        OutputFormat::Json => {
            let path = dir.join(format!("{stem}.{ext}"));
            vec![(path, render_json(workbook)?)]
        }
        OutputFormat::Csv => {
            let single = workbook.sheets.len() == 1;
            workbook
                .sheets
                .iter()
                .map(|sheet| {
                    let name = if single {
                        format!("{stem}.{ext}")
                    } else {
                        format!("{stem}_{}.{ext}", sheet.name)
                    };
                    Ok((dir.join(name), render_csv(sheet)?))
                })
                .collect::<Result<_>>()?
        }
    };

    let mut staged = Vec::with_capacity(rendered.len());
    for (path, bytes) in rendered {
        let mut tmp = NamedTempFile::new_in(dir).context("creating staging file")?;
        tmp.write_all(&bytes)
            .with_context(|| format!("writing staging file for {}", path.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("flushing staging file for {}", path.display()))?;
        staged.push((tmp, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, path) in staged {
        tmp.persist(&path)
            .with_context(|| format!("moving result into {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// CSV rendering
// ---------------------------------------------------------------------------

fn render_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&sheet.table.headers)
        .with_context(|| format!("sheet {}: writing header", sheet.name))?;
    for (row_no, row) in sheet.table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .with_context(|| format!("sheet {}: writing row {row_no}", sheet.name))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("sheet {}: flushing CSV: {}", sheet.name, e.error()))
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WorkbookFile<'a> {
    sheets: Vec<SheetFile<'a>>,
}

#[derive(Serialize)]
struct SheetFile<'a> {
    name: &'a str,
    columns: &'a [String],
    rows: Vec<Vec<JsonValue>>,
}

fn render_json(workbook: &Workbook) -> Result<Vec<u8>> {
    let file = WorkbookFile {
        sheets: workbook
            .sheets
            .iter()
            .map(|sheet| SheetFile {
                name: &sheet.name,
                columns: &sheet.table.headers,
                rows: sheet
                    .table
                    .rows
                    .iter()
                    .map(|row| row.iter().map(cell_to_json).collect())
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_vec_pretty(&file).context("serializing workbook")
}

fn cell_to_json(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::String(s) => JsonValue::String(s.clone()),
        CellValue::Integer(i) => JsonValue::from(*i),
        // Non-finite floats have no JSON form and become null.
        CellValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Null => JsonValue::Null,
    }
}
