//! Tide Tales: turn a loosely structured climate CSV into trend facts and a story.
//!
//! The pipeline is [`data::loader`] → [`data::classify`] → [`data::series`] →
//! [`data::facts`]; the egui shell in [`app`] and [`ui`] drives it and hands the
//! resulting [`data::model::FactPack`] to a [`narrative::Narrator`].

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod narrative;
pub mod service;
pub mod state;
pub mod ui;

pub use data::classify::{AssistedClassifier, ColumnAdvisor, classify};
pub use data::facts::compute_fact_pack;
pub use data::model::{ColumnMapping, FactPack, ObservationSeries, RawTable, YearRange};
pub use data::series::build_series;
pub use error::{Error, Result, ServiceError};
