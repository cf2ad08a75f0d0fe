use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::table::{CellValue, Table};

/// Extensions [`load_table`] understands, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "json", "parquet", "pq"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one measurement per record
/// * `.json`    – a workbook written by this tool (first sheet is read)
/// * `.parquet` – flat scalar columns, one measurement per row
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one reading per record.
/// Records may be shorter than the header (missing cells read as null).
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.rows.push(record.iter().map(CellValue::guess).collect());
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON workbook loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (as written by [`super::writer`]):
///
/// ```json
/// {
///   "sheets": [
///     {
///       "name": "Extracted_Results",
///       "columns": ["Frequency (Hz)", "dBSPL", "Target_Frequency"],
///       "rows": [[49.8, 61.2, 50.0], ...]
///     }
///   ]
/// }
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let sheet = root
        .get("sheets")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .context("Expected a workbook object with at least one sheet")?;

    let headers = sheet
        .get("columns")
        .and_then(|c| c.as_array())
        .context("Sheet is missing its 'columns' array")?
        .iter()
        .map(|c| match c {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let rows = sheet
        .get("rows")
        .and_then(|r| r.as_array())
        .context("Sheet is missing its 'rows' array")?;

    let mut table = Table::new(headers);
    for (i, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .with_context(|| format!("Row {i} is not a JSON array"))?;
        table.rows.push(cells.iter().map(json_to_cell).collect());
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one measurement per row.
///
/// Every column becomes a table column; numeric, string and boolean columns
/// are read, anything else is carried as its type name.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(headers);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch.columns();
        for row in 0..batch.num_rows() {
            table
                .rows
                .push(columns.iter().map(|col| extract_cell_value(col, row)).collect());
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_table_keeps_headers_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "subject.csv",
            "Frequency (Hz),dBSPL\n20.5,40\n25, 41.25\n30\n",
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Frequency (Hz)", "dBSPL"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, 0), &CellValue::Float(20.5));
        assert_eq!(table.cell(0, 1), &CellValue::Integer(40));
        assert_eq!(table.cell(1, 1), &CellValue::Float(41.25));
        assert_eq!(table.cell(2, 1), &CellValue::Null);
    }

    #[test]
    fn json_workbook_reads_first_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "extracted.json",
            r#"{"sheets":[{"name":"Extracted_Results","columns":["Freq","dB","Target_Frequency"],
               "rows":[[49.5,60.0,50],[101,null,100]]},
               {"name":"Other","columns":["x"],"rows":[]}]}"#,
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Freq", "dB", "Target_Frequency"]);
        assert_eq!(table.cell(0, 0), &CellValue::Float(49.5));
        assert_eq!(table.cell(1, 0), &CellValue::Integer(101));
        assert_eq!(table.cell(1, 1), &CellValue::Null);
    }

    #[test]
    fn garbage_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "broken.json", "{ not json");
        let err = load_table(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing JSON"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_table(Path::new("subject.xls")).unwrap_err();
        assert!(err.to_string().contains(".xls"));
    }
}
