use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::config::{AnthropicConfig, AppConfig};
use crate::data::classify::{AssistedClassifier, classify, infer_labels};
use crate::data::facts::compute_fact_pack;
use crate::data::model::{
    Classification, ColumnMapping, FactPack, MappingOrigin, ObservationSeries, RawTable, YearRange,
};
use crate::data::series::build_series;
use crate::data::source::{DataSource, HttpFetcher, SourceCache};
use crate::error::{Error, ServiceError};
use crate::narrative::{
    LlmNarrator, Narrative, NarrativeContext, Narrator, StoryFacts, TemplateNarrator,
};
use crate::service::{AnthropicClient, LlmColumnAdvisor};

// ---------------------------------------------------------------------------
// Narrative job
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub enum NarrativeState {
    #[default]
    Idle,
    Pending(Receiver<Result<Narrative, ServiceError>>),
    Ready(Narrative),
    Failed(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Every pipeline stage
/// is recomputed from the one before it; nothing downstream is patched in
/// place.
pub struct AppState {
    pub config: AppConfig,

    /// API key typed into the sidebar; overrides the configured one when set.
    pub api_key_input: String,

    /// Place the narrative is written for.
    pub location: String,

    /// Parsed tables per source.
    pub cache: SourceCache,

    /// Where the current table came from.
    pub source: Option<DataSource>,

    /// Loaded table (None until the user picks a source).
    pub table: Option<RawTable>,

    pub classification: Option<Classification>,

    /// Cleaned series for the current table and mapping.
    pub series: Option<ObservationSeries>,

    /// Selected year range, always inside the series span.
    pub range: Option<YearRange>,

    /// Statistics for `range`, or why they could not be computed.
    pub facts: Option<Result<FactPack, Error>>,

    pub narrative: NarrativeState,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            location: config.location.clone(),
            config,
            api_key_input: String::new(),
            cache: SourceCache::new(),
            source: None,
            table: None,
            classification: None,
            series: None,
            range: None,
            facts: None,
            narrative: NarrativeState::Idle,
            status_message: None,
        }
    }

    /// Anthropic settings with the sidebar key applied.
    pub fn anthropic(&self) -> AnthropicConfig {
        let mut config = self.config.anthropic.clone();
        if !self.api_key_input.trim().is_empty() {
            config.api_key = Some(self.api_key_input.trim().to_string());
        }
        config
    }

    // ---- Sources ----------------------------------------------------------

    /// Load `source` through the cache and analyse it. Local files are
    /// always read again; remote sources come from the cache when present.
    pub fn open_source(&mut self, source: DataSource) {
        if matches!(source, DataSource::File(_)) {
            self.cache.invalidate(&source);
        }
        self.read_source(source, false);
    }

    /// Re-read the current source, bypassing the cache.
    pub fn reload_source(&mut self) {
        if let Some(source) = self.source.clone() {
            self.read_source(source, true);
        }
    }

    fn read_source(&mut self, source: DataSource, refresh: bool) {
        let fetcher = match HttpFetcher::new(self.config.fetch.timeout()) {
            Ok(f) => f,
            Err(e) => {
                self.fail(format!("Error: {e:#}"));
                return;
            }
        };
        let options = self.config.loader.clone();
        let loaded = if refresh {
            self.cache.refresh(&source, &options, &fetcher)
        } else {
            self.cache.load(&source, &options, &fetcher)
        };
        match loaded {
            Ok(table) => {
                let table = table.clone();
                self.source = Some(source);
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e:#}");
                self.fail(format!("Error: {e:#}"));
            }
        }
    }

    fn fail(&mut self, message: String) {
        self.status_message = Some(message);
    }

    /// Ingest a newly loaded table and classify it.
    pub fn set_table(&mut self, table: RawTable) {
        self.table = Some(table);
        self.status_message = None;
        self.reanalyze();
    }

    // ---- Classification ---------------------------------------------------

    /// Classify the current table again, consulting the advisor when a key is set.
    pub fn reanalyze(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let anthropic = self.anthropic();
        let result = match AnthropicClient::new(&anthropic, anthropic.classify_timeout()) {
            Ok(client) => {
                let advisor = LlmColumnAdvisor::new(client, anthropic.classify_max_tokens);
                AssistedClassifier::new(advisor).classify(table)
            }
            Err(_) => classify(table),
        };

        match result {
            Ok(classification) => {
                log::info!(
                    "Classified columns ({:?}): time={:?} value={:?}",
                    classification.origin,
                    classification.mapping.time_column,
                    classification.mapping.value_column
                );
                self.apply_classification(classification);
            }
            Err(e) => {
                log::warn!("Classification failed: {e}");
                self.clear_derived();
                self.status_message = Some(format!("{e}. {}", e.user_hint()));
            }
        }
    }

    /// Use a hand-picked mapping instead of the classifier's.
    pub fn set_mapping(&mut self, time_column: String, value_column: String) {
        let labels = infer_labels(&value_column);
        self.apply_classification(Classification {
            mapping: ColumnMapping {
                time_column,
                value_column,
            },
            labels,
            origin: MappingOrigin::Manual,
        });
    }

    fn apply_classification(&mut self, classification: Classification) {
        let Some(table) = &self.table else {
            return;
        };
        let built = build_series(table, &classification.mapping);
        self.classification = Some(classification);
        self.narrative = NarrativeState::Idle;

        match built {
            Ok(series) => {
                self.range = series.span();
                self.series = Some(series);
                self.status_message = None;
                self.recompute_facts();
            }
            Err(e) => {
                self.series = None;
                self.range = None;
                self.facts = None;
                self.status_message = Some(format!("{e}. {}", e.user_hint()));
            }
        }
        if self.series.as_ref().is_some_and(|s| s.is_empty()) {
            self.status_message =
                Some("No numeric rows in the selected columns. Pick other columns.".to_string());
        }
    }

    fn clear_derived(&mut self) {
        self.classification = None;
        self.series = None;
        self.range = None;
        self.facts = None;
        self.narrative = NarrativeState::Idle;
    }

    // ---- Range and facts --------------------------------------------------

    /// Select a range, clamped to the series span. Ranges outside the span
    /// or inverted ones are kept as-is so the fact pack reports why.
    pub fn set_range(&mut self, range: YearRange) {
        let span = self.series.as_ref().and_then(|s| s.span());
        let effective = span.and_then(|s| range.clamp_to(s)).unwrap_or(range);
        if self.range != Some(effective) {
            self.range = Some(effective);
            self.narrative = NarrativeState::Idle;
            self.recompute_facts();
        }
    }

    fn recompute_facts(&mut self) {
        self.facts = match (&self.series, self.range) {
            (Some(series), Some(range)) => Some(compute_fact_pack(series, range)),
            _ => None,
        };
    }

    /// Facts a story can be told from: the full pack, or the summary of a
    /// degenerate range.
    pub fn story_facts(&self) -> Option<StoryFacts> {
        match self.facts.as_ref()? {
            Ok(fp) => Some(StoryFacts::from(fp)),
            Err(Error::DegenerateFit { summary }) => Some(StoryFacts::partial(*summary)),
            Err(_) => None,
        }
    }

    // ---- Narrative --------------------------------------------------------

    /// Start writing a narrative on a worker thread. Without a key the
    /// template narrator is used.
    pub fn start_narrative(&mut self) {
        let Some(facts) = self.story_facts() else {
            self.narrative = NarrativeState::Failed("Select a range with data first.".to_string());
            return;
        };
        let ctx = NarrativeContext {
            location: self.location.clone(),
            labels: self
                .classification
                .as_ref()
                .map(|c| c.labels.clone())
                .unwrap_or_default(),
        };

        let anthropic = self.anthropic();
        let narrator: Box<dyn Narrator> =
            match AnthropicClient::new(&anthropic, anthropic.narrate_timeout()) {
                Ok(client) => Box::new(LlmNarrator::new(client, anthropic.narrative_max_tokens)),
                Err(_) => Box::new(TemplateNarrator),
            };

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(narrator.narrate(&facts, &ctx));
        });
        self.narrative = NarrativeState::Pending(rx);
    }

    /// Collect a finished narrative. Returns true while still pending.
    pub fn poll_narrative(&mut self) -> bool {
        let NarrativeState::Pending(rx) = &self.narrative else {
            return false;
        };
        match rx.try_recv() {
            Ok(Ok(narrative)) => {
                self.narrative = NarrativeState::Ready(narrative);
                false
            }
            Ok(Err(e)) => {
                log::error!("Narrative generation failed: {e}");
                self.narrative = NarrativeState::Failed(format!("Narrative failed: {e}"));
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                self.narrative = NarrativeState::Failed("Narrative worker stopped.".to_string());
                false
            }
        }
    }
}
