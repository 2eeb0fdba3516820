use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{Cell, RawTable};

/// How many leading records are inspected when looking for the header row.
const HEADER_SCAN_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Cell values treated as absent (after trimming).
    pub missing_tokens: Vec<String>,
    /// Leading metadata lines before the header. `None` detects them.
    pub skip_rows: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_tokens: ["***", "NA", "N/A", "NaN", "nan"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_rows: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated, optional metadata lines above the header
/// * `.json`         – `[{ "Year": 1880, "J-D": -0.17, ... }, ...]`
/// * `.parquet`      – flat scalar columns
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            parse_csv(file, options)
        }
        "json" => load_json(path, options),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse CSV text into a [`RawTable`].
///
/// Records may have differing lengths. The header is the record after
/// `skip_rows` lines or, when that is `None`, the first of the leading records
/// whose width equals the widest one among them. Width ignores trailing empty
/// fields, so data rows ending in a comma do not outrank the header. Published
/// climate series often carry a title line (`Land-Ocean: Global Means`) above it.
pub fn parse_csv<R: Read>(reader: R, options: &LoadOptions) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }

    let header_idx = match options.skip_rows {
        Some(n) => n,
        None => detect_header_row(&records),
    };
    let Some(header) = records.get(header_idx) else {
        bail!("CSV has no header row (skipping {header_idx} lines)");
    };

    let headers: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let rows = records[header_idx + 1..]
        .iter()
        .filter(|r| r.iter().any(|f| !f.is_empty()))
        .map(|r| {
            r.iter()
                .map(|f| Cell::from_text(f, &options.missing_tokens))
                .collect()
        })
        .collect();

    Ok(RawTable::from_rows(headers, rows))
}

fn detect_header_row(records: &[csv::StringRecord]) -> usize {
    let scan = &records[..records.len().min(HEADER_SCAN_ROWS)];
    let widest = scan.iter().map(filled_width).max().unwrap_or(0);
    scan.iter().position(|r| filled_width(r) == widest).unwrap_or(0)
}

/// Number of fields up to and including the last non-empty one.
fn filled_width(record: &csv::StringRecord) -> usize {
    record
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_empty())
        .last()
        .map_or(0, |(i, _)| i + 1)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Year": 1880, "J-D": -0.17 },
///   { "Year": 1881, "J-D": "***" }
/// ]
/// ```
///
/// Column order follows first appearance across records.
fn load_json(path: &Path, options: &LoadOptions) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text, options)
}

pub fn parse_json(text: &str, options: &LoadOptions) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<BTreeMap<String, Cell>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val, options));
        }
        rows.push(row);
    }

    let rows = rows
        .into_iter()
        .map(|mut row| {
            headers
                .iter()
                .map(|h| row.remove(h).unwrap_or(Cell::Missing))
                .collect()
        })
        .collect();
    Ok(RawTable::from_rows(headers, rows))
}

fn json_to_cell(val: &JsonValue, options: &LoadOptions) -> Cell {
    match val {
        JsonValue::String(s) => Cell::from_text(s, &options.missing_tokens),
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
        JsonValue::Bool(b) => Cell::Text(b.to_string()),
        JsonValue::Null => Cell::Missing,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns. Integer and float columns become
/// numeric cells, strings stay text, nulls are missing. Nested columns are
/// kept as their type name so they never classify as numeric.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, cells) in columns.iter_mut().enumerate() {
            let col = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                cells.push(extract_cell(col, row)?);
            }
        }
    }

    Ok(RawTable::from_columns(names.into_iter().zip(columns).collect()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Missing);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Cell::from_text(s.value(row), &[])
        }
        DataType::LargeUtf8 => Cell::from_text(col.as_string::<i64>().value(row), &[]),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Cell::Number(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Cell::Number(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            Cell::Text(arr.value(row).to_string())
        }
        other => Cell::Text(format!("{other:?}")),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_title_line_and_maps_missing_tokens() {
        let text = "Land-Ocean: Global Means\n\
                    Year,Jan,J-D\n\
                    1880,-.18,-.17\n\
                    1881,-.20,***\n";
        let table = parse_csv(text.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["Year", "Jan", "J-D"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("J-D").unwrap().cells[1], Cell::Missing);
        assert_eq!(table.column("Jan").unwrap().cells[0].as_f64(), Some(-0.18));
    }

    #[test]
    fn explicit_skip_rows() {
        let text = "a,b,c\nx,y\nYear,Temp\n2000,1.0\n";
        let options = LoadOptions {
            skip_rows: Some(2),
            ..LoadOptions::default()
        };
        let table = parse_csv(text.as_bytes(), &options).unwrap();
        assert_eq!(table.column_names(), vec!["Year", "Temp"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn trailing_commas_do_not_displace_header() {
        let text = "Year,Temp\n2000,0.40,\n2010,0.70,\n2020,1.00,\n";
        let table = parse_csv(text.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["Year", "Temp"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("Temp").unwrap().cells[2].as_f64(), Some(1.0));
    }

    #[test]
    fn embedded_header_rows_stay_as_text() {
        let text = "Year,Temp\n2000,1\nYear,Temp\n2001,2\n,\n";
        let table = parse_csv(text.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column("Temp").unwrap().cells[1],
            Cell::Text("Temp".into())
        );
    }

    #[test]
    fn empty_input_fails() {
        assert!(parse_csv("".as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn json_records_keep_first_seen_column_order() {
        let text = r#"[{"year": 2000, "ppm": 369.7}, {"year": 2001, "ppm": "***", "site": "MLO"}]"#;
        let table = parse_json(text, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["year", "ppm", "site"]);
        assert_eq!(table.column("ppm").unwrap().cells[1], Cell::Missing);
        assert_eq!(table.column("site").unwrap().cells[0], Cell::Missing);

        let table = parse_json(r#"[{"zeta": 1, "alpha": 2}]"#, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("data.xlsx"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
