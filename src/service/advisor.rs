use serde::Deserialize;

use super::anthropic::{AnthropicClient, extract_json_object};
use crate::data::classify::{ColumnAdvisor, ColumnSuggestion};
use crate::data::model::RawTable;
use crate::error::ServiceError;

/// Rows of sample data sent along with the column names.
const SAMPLE_ROWS: usize = 5;

/// Asks a language model which columns hold the year and the measurement.
pub struct LlmColumnAdvisor {
    client: AnthropicClient,
    max_tokens: u32,
}

impl LlmColumnAdvisor {
    pub fn new(client: AnthropicClient, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

impl ColumnAdvisor for LlmColumnAdvisor {
    fn suggest(&self, table: &RawTable) -> Result<ColumnSuggestion, ServiceError> {
        let reply = self.client.complete(&build_prompt(table), self.max_tokens)?;
        parse_suggestion(&reply)
    }
}

pub fn build_prompt(table: &RawTable) -> String {
    let header = table.column_names().join(" | ");
    let sample: Vec<String> = table
        .head(SAMPLE_ROWS)
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect();

    format!(
        "Analyze this CSV sample and identify its structure for a climate dashboard.\n\
         COLUMNS: {header}\n\
         SAMPLE:\n{}\n\n\
         1. Identify the time/year column.\n\
         2. Identify the primary measurement column.\n\
         3. Identify the science type (e.g. Temperature, AQI, Sea Level) and the unit.\n\n\
         Use column names exactly as listed. Return ONLY this JSON:\n\
         {{\"year\": \"column_name\", \"data\": \"column_name\", \"type\": \"Science Type\", \"unit\": \"Unit\"}}",
        sample.join("\n")
    )
}

#[derive(Deserialize)]
struct SuggestionReply {
    year: String,
    data: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    unit: Option<String>,
}

/// Accepts a JSON object (`year`, `data`, optional `type`, `unit`) or the
/// line form `Year: <name>` / `Data: <name>`.
pub fn parse_suggestion(reply: &str) -> Result<ColumnSuggestion, ServiceError> {
    if let Some(parsed) = extract_json_object(reply)
        .and_then(|json| serde_json::from_str::<SuggestionReply>(json).ok())
    {
        return Ok(ColumnSuggestion {
            time_column: parsed.year.trim().to_string(),
            value_column: parsed.data.trim().to_string(),
            kind: parsed.kind,
            unit: parsed.unit,
        });
    }

    let field = |label: &str| {
        reply.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            let value = value.trim().trim_matches(|c| c == '"' || c == '`' || c == '\'');
            (key.trim().eq_ignore_ascii_case(label) && !value.is_empty()).then(|| value.to_string())
        })
    };

    match (field("year"), field("data")) {
        (Some(time_column), Some(value_column)) => Ok(ColumnSuggestion {
            time_column,
            value_column,
            kind: field("type"),
            unit: field("unit"),
        }),
        _ => Err(ServiceError::Malformed(format!(
            "no column mapping in reply: {}",
            reply.chars().take(80).collect::<String>()
        ))),
    }
}
