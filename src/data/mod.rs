/// Data layer: loading, column classification, cleaning and statistics.
///
/// Architecture:
/// ```text
///  file / URL (.csv .json .parquet)
///        │
///        ▼
///   ┌──────────────────┐
///   │ source / loader   │  cache + parse → RawTable
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  keywords → ranges → position (+ optional advisor)
///   └──────────┘
///        │ ColumnMapping
///        ▼
///   ┌──────────┐
///   │  series   │  coerce, drop absent, sort → ObservationSeries
///   └──────────┘
///        │ YearRange
///        ▼
///   ┌──────────┐
///   │  facts    │  summary + OLS trend → FactPack
///   └──────────┘
/// ```

pub mod classify;
pub mod facts;
pub mod loader;
pub mod model;
pub mod series;
pub mod source;
