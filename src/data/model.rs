use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cell – a single raw value in a column
// ---------------------------------------------------------------------------

/// A raw cell as read from the source file. Nothing is assumed about the
/// column type; numeric coercion happens lazily through [`Cell::as_f64`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Empty cell or one of the configured missing-value tokens.
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Missing => write!(f, "<missing>"),
        }
    }
}

impl Cell {
    /// Build a cell from source text, mapping blanks and missing tokens to
    /// [`Cell::Missing`].
    pub fn from_text(raw: &str, missing_tokens: &[String]) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || missing_tokens.iter().any(|t| t == trimmed) {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Numeric coercion: finite numbers pass, text is parsed, anything else
    /// is absent.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Missing => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

// ---------------------------------------------------------------------------
// RawTable – named columns of raw cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl RawColumn {
    /// First cell that coerces to a number, in row order.
    pub fn first_numeric(&self) -> Option<f64> {
        self.cells.iter().find_map(Cell::as_f64)
    }

    /// A column counts as numeric when it has at least one coercible cell and
    /// coercible cells make up at least half of the present ones. Stray
    /// header rows repeated mid-file do not flip a numeric column to text.
    pub fn is_numeric(&self) -> bool {
        let present = self.cells.iter().filter(|c| !c.is_missing()).count();
        let numeric = self.cells.iter().filter(|c| c.as_f64().is_some()).count();
        numeric > 0 && numeric * 2 >= present
    }
}

/// A loosely structured table: column names and count are only known at
/// runtime. Column names are unique by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    n_rows: usize,
}

impl RawTable {
    /// Build from a header row and row-major cells. Short rows are padded
    /// with [`Cell::Missing`], extra trailing cells are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let names = unique_names(headers);
        let n_rows = rows.len();
        let mut columns: Vec<RawColumn> = names
            .into_iter()
            .map(|name| RawColumn {
                name,
                cells: Vec::with_capacity(n_rows),
            })
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for col in &mut columns {
                col.cells.push(cells.next().unwrap_or(Cell::Missing));
            }
        }

        RawTable { columns, n_rows }
    }

    /// Build from column-major data. Columns are padded to the longest one.
    pub fn from_columns(columns: Vec<(String, Vec<Cell>)>) -> Self {
        let n_rows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let (headers, cells): (Vec<String>, Vec<Vec<Cell>>) = columns.into_iter().unzip();
        let columns = unique_names(headers)
            .into_iter()
            .zip(cells)
            .map(|(name, mut cells)| {
                cells.resize(n_rows, Cell::Missing);
                RawColumn { name, cells }
            })
            .collect();
        RawTable { columns, n_rows }
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// The first `n` rows, row-major, for previews and service prompts.
    pub fn head(&self, n: usize) -> Vec<Vec<&Cell>> {
        (0..self.n_rows.min(n))
            .map(|row| self.columns.iter().map(|c| &c.cells[row]).collect())
            .collect()
    }
}

/// Make header names unique: blanks become `Unnamed: <i>`, repeats get a
/// `.1`, `.2`, ... suffix.
fn unique_names(headers: Vec<String>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = match h.trim() {
                "" => format!("Unnamed: {i}"),
                trimmed => trimmed.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while seen.contains(&name) {
                name = format!("{base}.{suffix}");
                suffix += 1;
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Classification output
// ---------------------------------------------------------------------------

/// Which column holds the time axis and which the measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub time_column: String,
    pub value_column: String,
}

/// Human-facing description of what the measurement is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLabels {
    /// Science type, e.g. "Temperature Anomaly".
    pub kind: String,
    pub unit: String,
}

impl Default for DatasetLabels {
    fn default() -> Self {
        Self {
            kind: "Climate Data".to_string(),
            unit: "Units".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOrigin {
    Heuristic,
    Advisor,
    /// Picked by hand in the UI.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub mapping: ColumnMapping,
    pub labels: DatasetLabels,
    pub origin: MappingOrigin,
}

// ---------------------------------------------------------------------------
// ObservationSeries – cleaned (year, value) pairs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub year: i32,
    pub value: f64,
}

/// Cleaned observations sorted ascending by year. Rows sharing a year keep
/// their source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Sorts by year with a stable sort and drops non-finite values.
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.retain(|o| o.value.is_finite());
        observations.sort_by_key(|o| o.year);
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Full `[min_year, max_year]` span, `None` when empty.
    pub fn span(&self) -> Option<YearRange> {
        let first = self.observations.first()?;
        let last = self.observations.last()?;
        Some(YearRange::new(first.year, last.year))
    }

    /// Observations with `range.start <= year <= range.end`.
    pub fn in_range(&self, range: YearRange) -> &[Observation] {
        let lo = self.observations.partition_point(|o| o.year < range.start);
        let hi = self.observations.partition_point(|o| o.year <= range.end);
        if lo >= hi {
            &[]
        } else {
            &self.observations[lo..hi]
        }
    }
}

// ---------------------------------------------------------------------------
// YearRange – inclusive sub-range selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Intersect with `span`. `None` when the ranges do not overlap or
    /// `self` is inverted.
    pub fn clamp_to(&self, span: YearRange) -> Option<YearRange> {
        if !self.is_valid() || !span.is_valid() {
            return None;
        }
        let start = self.start.max(span.start);
        let end = self.end.min(span.end);
        (start <= end).then_some(YearRange { start, end })
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// FactPack – derived statistics over a range
// ---------------------------------------------------------------------------

/// Statistics that only need one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub range: YearRange,
    pub count: usize,
    pub start_value: f64,
    pub end_value: f64,
    pub net_change: f64,
    pub peak: f64,
    pub trough: f64,
}

/// Least-squares line `value = slope * year + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, year: f64) -> f64 {
        self.slope * year + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactPack {
    pub summary: RangeSummary,
    pub trend: Trend,
}

impl FactPack {
    pub fn range(&self) -> YearRange {
        self.summary.range
    }

    pub fn count(&self) -> usize {
        self.summary.count
    }

    pub fn start_value(&self) -> f64 {
        self.summary.start_value
    }

    pub fn end_value(&self) -> f64 {
        self.summary.end_value
    }

    pub fn net_change(&self) -> f64 {
        self.summary.net_change
    }

    pub fn peak(&self) -> f64 {
        self.summary.peak
    }

    pub fn trough(&self) -> f64 {
        self.summary.trough
    }

    pub fn slope(&self) -> f64 {
        self.trend.slope
    }

    pub fn intercept(&self) -> f64 {
        self.trend.intercept
    }

    /// Fitted value at `year`.
    pub fn trend_at(&self, year: f64) -> f64 {
        self.trend.at(year)
    }
}
