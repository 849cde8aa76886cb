//! Entry extraction contract on top of the language-model boundary.
//!
//! Turns a free-form day description into validated draft entries. The model
//! is asked for JSON only; everything it returns is re-validated here before
//! any draft reaches a session.

use crate::core::traits::EntryExtractor;
use crate::infrastructure::entities::{Category, DraftEntry};
use crate::infrastructure::traits::LanguageModel;
use async_trait::async_trait;
use chrono::NaiveDate;
use di::{Ref, inject, injectable};
use log::{debug, error, info};
use minijinja::context;
use serde::Deserialize;
use thiserror::Error;

/// Recoverable extraction failures; each one re-prompts the user in place.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("response did not match the expected schema: {0}")]
    InvalidSchema(String),
    #[error("no activities were found in the text")]
    EmptyResult,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("invalid hours value: {0}")]
    InvalidHours(String),
    #[error("language model call failed: {0}")]
    ModelFailure(String),
}

const EXTRACTION_TEMPLATE: &str = r#"You are an assistant that converts informal workday descriptions into professional time-tracking records.

Analyze the text below and extract EVERY distinct activity it mentions. For each activity provide:
- "description": a clear, professional description of the activity
- "project": the associated project name, inferred from context
- "category": exactly one of "billableProject", "nonBillableProject", "otherNonBillable"
- "estimatedHours": the hours spent; when not explicit, estimate reasonably — a full workday totals 8 hours

The activities happened on {{ target_date }}.

Respond ONLY with valid JSON of this shape:
{"entries": [{"description": "...", "project": "...", "category": "...", "estimatedHours": 2.5}]}

User text: {{ raw_text }}"#;

#[derive(Debug, Deserialize)]
struct RawResponse {
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    description: String,
    project: String,
    category: String,
    estimated_hours: serde_json::Value,
}

/// Normalise an hours value to two fractional digits.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Validate an hours value from the model or an edit command: numeric,
/// two-decimal, within `(0, 24]`.
pub fn validate_hours(raw: &str) -> Result<f64, ExtractionError> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ExtractionError::InvalidHours(raw.trim().to_owned()))?;
    let hours = round_hours(hours);
    if hours > 0.0 && hours <= 24.0 {
        Ok(hours)
    } else {
        Err(ExtractionError::InvalidHours(raw.trim().to_owned()))
    }
}

fn hours_from_value(value: &serde_json::Value) -> Result<f64, ExtractionError> {
    match value {
        serde_json::Value::Number(n) => {
            let hours = round_hours(
                n.as_f64()
                    .ok_or_else(|| ExtractionError::InvalidHours(value.to_string()))?,
            );
            if hours > 0.0 && hours <= 24.0 {
                Ok(hours)
            } else {
                Err(ExtractionError::InvalidHours(value.to_string()))
            }
        }
        serde_json::Value::String(s) => validate_hours(s),
        _ => Err(ExtractionError::InvalidHours(value.to_string())),
    }
}

/// Unwrap JSON from a response that may carry markdown code fences or
/// surrounding prose.
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(open) = text.find("```") {
        let after = &text[open + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(close) = after.find("```") {
            return after[..close].trim();
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return text[start..=end].trim();
        }
    }

    text
}

/// Validate a raw model response into drafts for `target_date`, each carrying
/// the user's original text.
pub fn parse_response(
    raw: &str,
    original_text: &str,
    target_date: NaiveDate,
) -> Result<Vec<DraftEntry>, ExtractionError> {
    let response: RawResponse = serde_json::from_str(extract_json(raw))
        .map_err(|e| ExtractionError::InvalidSchema(e.to_string()))?;

    if response.entries.is_empty() {
        return Err(ExtractionError::EmptyResult);
    }

    response
        .entries
        .into_iter()
        .map(|entry| {
            let category = Category::from_loose(&entry.category)
                .ok_or_else(|| ExtractionError::UnknownCategory(entry.category.clone()))?;
            let estimated_hours = hours_from_value(&entry.estimated_hours)?;
            let description = entry.description.trim().to_owned();
            let project = entry.project.trim().to_owned();
            if description.is_empty() {
                return Err(ExtractionError::InvalidSchema(
                    "entry description is empty".to_owned(),
                ));
            }
            if project.is_empty() {
                return Err(ExtractionError::InvalidSchema(
                    "entry project is empty".to_owned(),
                ));
            }

            Ok(DraftEntry {
                date: target_date,
                description,
                project,
                category,
                estimated_hours,
                original_text: original_text.to_owned(),
            })
        })
        .collect()
}

pub struct LlmEntryExtractor {
    llm: Ref<dyn LanguageModel>,
    templates: minijinja::Environment<'static>,
}

#[injectable(EntryExtractor)]
impl LlmEntryExtractor {
    #[inject]
    pub fn create(llm: Ref<dyn LanguageModel>) -> LlmEntryExtractor {
        let mut templates = minijinja::Environment::new();
        templates.set_trim_blocks(true);
        templates
            .add_template("extract", EXTRACTION_TEMPLATE)
            .unwrap();

        LlmEntryExtractor { llm, templates }
    }
}

#[async_trait]
impl EntryExtractor for LlmEntryExtractor {
    async fn extract(
        &self,
        raw_text: &str,
        target_date: NaiveDate,
    ) -> Result<Vec<DraftEntry>, ExtractionError> {
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::EmptyResult);
        }

        let prompt = self
            .templates
            .get_template("extract")
            .unwrap()
            .render(context! {
                raw_text => raw_text,
                target_date => target_date.to_string(),
            })
            .expect("failed to render extraction prompt");

        info!("extracting entries from {} chars of text", raw_text.len());

        let raw = self.llm.generate(&prompt).await.map_err(|e| {
            error!("language model call failed: {e}");
            ExtractionError::ModelFailure(e.to_string())
        })?;

        debug!(
            "raw model response: {}",
            raw.chars().take(500).collect::<String>()
        );

        let drafts = parse_response(&raw, raw_text, target_date)?;
        info!("model returned {} entries", drafts.len());
        Ok(drafts)
    }
}
