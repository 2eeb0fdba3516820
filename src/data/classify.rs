use log::debug;

use super::model::{Classification, ColumnMapping, DatasetLabels, MappingOrigin, RawTable};
use crate::error::{Error, Result, ServiceError};

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

/// Substrings that mark a column name as the time axis.
pub const TIME_KEYWORDS: &[&str] = &["year", "yr", "date", "time", "period"];

/// Substrings that mark a column name as a measurement.
pub const VALUE_KEYWORDS: &[&str] = &[
    "temp", "anom", "val", "index", "ppm", "aqi", "mean", "avg", "data", "sst", "annual", "j-d",
];

/// A column whose first numeric cell falls in this range is taken to hold years.
const PLAUSIBLE_YEARS: std::ops::Range<f64> = 1700.0..2100.0;

fn matches_keyword(name: &str, keywords: &[&str]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

// ---------------------------------------------------------------------------
// Deterministic classifier
// ---------------------------------------------------------------------------

/// Pick the time and value columns of `table` by name keywords, falling back
/// to value ranges and then position. Pure and deterministic.
pub fn classify(table: &RawTable) -> Result<Classification> {
    let mapping = heuristic_mapping(table)?;
    let labels = infer_labels(&mapping.value_column);
    debug!(
        "heuristic mapping: time={:?} value={:?}",
        mapping.time_column, mapping.value_column
    );
    Ok(Classification {
        mapping,
        labels,
        origin: MappingOrigin::Heuristic,
    })
}

fn heuristic_mapping(table: &RawTable) -> Result<ColumnMapping> {
    let columns = table.columns();
    if columns.len() < 2 {
        return Err(Error::InsufficientColumns {
            found: columns.len(),
        });
    }

    let time_idx = columns
        .iter()
        .position(|c| matches_keyword(&c.name, TIME_KEYWORDS))
        .or_else(|| {
            columns.iter().position(|c| {
                c.first_numeric()
                    .is_some_and(|v| PLAUSIBLE_YEARS.contains(&v))
            })
        })
        .unwrap_or(0);

    let remaining = || {
        columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != time_idx)
    };

    let value_idx = remaining()
        .find(|(_, c)| matches_keyword(&c.name, VALUE_KEYWORDS))
        .or_else(|| remaining().find(|(_, c)| c.is_numeric()))
        .or_else(|| remaining().next())
        .map(|(i, _)| i)
        .ok_or(Error::MappingNotFound)?;

    let time_column = columns[time_idx].name.clone();
    let value_column = columns[value_idx].name.clone();
    if time_column == value_column {
        return Err(Error::MappingNotFound);
    }
    Ok(ColumnMapping {
        time_column,
        value_column,
    })
}

/// Guess the science type and unit from the measurement column name.
pub fn infer_labels(value_column: &str) -> DatasetLabels {
    let lower = value_column.to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));

    let (kind, unit) = if has(&["anom", "j-d"]) {
        ("Temperature Anomaly", "°C")
    } else if has(&["temp", "sst"]) {
        ("Temperature", "°C")
    } else if has(&["ppm", "co2"]) {
        ("CO₂ Concentration", "ppm")
    } else if has(&["aqi"]) {
        ("Air Quality Index", "AQI")
    } else if has(&["sea", "gmsl", "level"]) {
        ("Sea Level", "mm")
    } else if has(&["precip", "rain"]) {
        ("Precipitation", "mm")
    } else {
        return DatasetLabels::default();
    };
    DatasetLabels {
        kind: kind.to_string(),
        unit: unit.to_string(),
    }
}

// ---------------------------------------------------------------------------
// External advisor
// ---------------------------------------------------------------------------

/// What an external service thinks the columns are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSuggestion {
    pub time_column: String,
    pub value_column: String,
    pub kind: Option<String>,
    pub unit: Option<String>,
}

/// A source of column suggestions, typically a language model.
pub trait ColumnAdvisor {
    fn suggest(&self, table: &RawTable) -> std::result::Result<ColumnSuggestion, ServiceError>;
}

/// Heuristic classification with an advisory second opinion.
///
/// The heuristic answer is always computed first. The advisor is consulted
/// at most once per call and its suggestion replaces the heuristic mapping
/// only if both names exist in the table and differ. Advisor errors never
/// escape [`AssistedClassifier::classify`].
pub struct AssistedClassifier<A> {
    advisor: A,
}

impl<A: ColumnAdvisor> AssistedClassifier<A> {
    pub fn new(advisor: A) -> Self {
        Self { advisor }
    }

    pub fn classify(&self, table: &RawTable) -> Result<Classification> {
        let heuristic = classify(table)?;

        let suggestion = match self.advisor.suggest(table) {
            Ok(s) => s,
            Err(e) => {
                debug!("column advisor unavailable, keeping heuristic mapping: {e}");
                return Ok(heuristic);
            }
        };

        match validate_suggestion(table, suggestion) {
            Some(classification) => {
                debug!(
                    "advisor mapping accepted: time={:?} value={:?}",
                    classification.mapping.time_column, classification.mapping.value_column
                );
                Ok(classification)
            }
            None => {
                debug!("advisor mapping rejected, keeping heuristic mapping");
                Ok(heuristic)
            }
        }
    }
}

fn validate_suggestion(table: &RawTable, s: ColumnSuggestion) -> Option<Classification> {
    if s.time_column == s.value_column
        || !table.has_column(&s.time_column)
        || !table.has_column(&s.value_column)
    {
        return None;
    }

    let fallback = infer_labels(&s.value_column);
    let non_empty = |v: Option<String>| v.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let labels = DatasetLabels {
        kind: non_empty(s.kind).unwrap_or(fallback.kind),
        unit: non_empty(s.unit).unwrap_or(fallback.unit),
    };

    Some(Classification {
        mapping: ColumnMapping {
            time_column: s.time_column,
            value_column: s.value_column,
        },
        labels,
        origin: MappingOrigin::Advisor,
    })
}
