//! Narrative collaborators: turn a fact pack into prose.

use serde::Deserialize;

use crate::data::model::{DatasetLabels, FactPack, RangeSummary, Trend};
use crate::error::ServiceError;
use crate::service::anthropic::{AnthropicClient, extract_json_object};

/// The numbers a story is built from. The trend is absent for ranges too
/// narrow to fit a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoryFacts {
    pub summary: RangeSummary,
    pub trend: Option<Trend>,
}

impl From<&FactPack> for StoryFacts {
    fn from(fp: &FactPack) -> Self {
        Self {
            summary: fp.summary,
            trend: Some(fp.trend),
        }
    }
}

impl StoryFacts {
    pub fn partial(summary: RangeSummary) -> Self {
        Self {
            summary,
            trend: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeContext {
    /// Free-text place the story is told for.
    pub location: String,
    pub labels: DatasetLabels,
}

/// One story in English and optionally a second in the local language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Narrative {
    pub english: String,
    #[serde(default)]
    pub local: Option<String>,
}

pub trait Narrator: Send {
    fn narrate(&self, facts: &StoryFacts, ctx: &NarrativeContext) -> Result<Narrative, ServiceError>;
}

// ---------------------------------------------------------------------------
// Template narrator
// ---------------------------------------------------------------------------

/// Deterministic summary used when no API key is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateNarrator;

impl Narrator for TemplateNarrator {
    fn narrate(&self, facts: &StoryFacts, ctx: &NarrativeContext) -> Result<Narrative, ServiceError> {
        let s = &facts.summary;
        let unit = &ctx.labels.unit;
        let mut text = format!(
            "In {location}, the {kind} record from {start} to {end} holds {count} observations. \
             It moved from {from:.2} to {to:.2} {unit}, a net change of {net:+.2} {unit}, \
             peaking at {peak:.2} and bottoming out at {trough:.2}.",
            location = ctx.location,
            kind = ctx.labels.kind.to_lowercase(),
            start = s.range.start,
            end = s.range.end,
            count = s.count,
            from = s.start_value,
            to = s.end_value,
            net = s.net_change,
            peak = s.peak,
            trough = s.trough,
        );
        match facts.trend {
            Some(trend) => text.push_str(&format!(
                " The fitted trend shifts at {:+.4} {unit} per year.",
                trend.slope
            )),
            None => text.push_str(" Too few years are selected to draw a trend."),
        }
        Ok(Narrative {
            english: text,
            local: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Language-model narrator
// ---------------------------------------------------------------------------

pub struct LlmNarrator {
    client: AnthropicClient,
    max_tokens: u32,
}

impl LlmNarrator {
    pub fn new(client: AnthropicClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

impl Narrator for LlmNarrator {
    fn narrate(&self, facts: &StoryFacts, ctx: &NarrativeContext) -> Result<Narrative, ServiceError> {
        let reply = self.client.complete(&build_prompt(facts, ctx), self.max_tokens)?;
        parse_narrative(&reply)
    }
}

pub fn build_prompt(facts: &StoryFacts, ctx: &NarrativeContext) -> String {
    let s = &facts.summary;
    let unit = &ctx.labels.unit;
    let trend = match facts.trend {
        Some(t) => format!("{:.4} {unit} per year", t.slope),
        None => "not enough years selected to measure".to_string(),
    };
    format!(
        "Identify as a Cultural Data Sentinel.\n\
         Write an immersive story of about 1,500 words for the people of {location}.\n\n\
         THE DATA CONTEXT:\n\
         - Science: {kind}\n\
         - Period: {start} to {end} ({count} observations)\n\
         - Net Change: {net:.2} {unit}\n\
         - Peak: {peak:.2} {unit}, Trough: {trough:.2} {unit}\n\
         - Trend Speed: {trend}\n\n\
         TASK:\n\
         1. Use the local folklore and traditional myths of {location} as the narrative soil.\n\
         2. The scientific data is the atmosphere of the story, the inescapable physical truth.\n\
         3. Integrate the numbers naturally into the prose.\n\
         4. Write the full story in English and the full story in the local vernacular of {location}.\n\n\
         Return ONLY a JSON object: {{\"english\": \"...\", \"local\": \"...\"}}",
        location = ctx.location,
        kind = ctx.labels.kind,
        start = s.range.start,
        end = s.range.end,
        count = s.count,
        net = s.net_change,
        peak = s.peak,
        trough = s.trough,
    )
}

/// Parse the structured two-language reply. A blank `local` is treated as absent.
pub fn parse_narrative(reply: &str) -> Result<Narrative, ServiceError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| ServiceError::Malformed("narrative reply is not a JSON object".to_string()))?;
    let mut narrative: Narrative = serde_json::from_str(json)
        .map_err(|e| ServiceError::Malformed(format!("narrative reply: {e}")))?;

    if narrative.english.trim().is_empty() {
        return Err(ServiceError::Malformed("narrative has no English text".to_string()));
    }
    narrative.local = narrative.local.filter(|l| !l.trim().is_empty());
    Ok(narrative)
}
