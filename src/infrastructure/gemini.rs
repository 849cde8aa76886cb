//! Gemini REST client for the language-model boundary

use crate::infrastructure::traits::LanguageModel;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use di::{inject, injectable};
use log::{debug, info};
use serde_json::json;
use std::env;

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[injectable(LanguageModel)]
impl GeminiClient {
    #[inject]
    pub fn create() -> GeminiClient {
        dotenvy::dotenv().ok();
        let api_key = env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
        let base_url = env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());

        info!("Gemini client initialised (model={model}, temp=0.3)");
        GeminiClient::with_config(base_url, api_key, model)
    }
}

impl GeminiClient {
    pub fn with_config(base_url: String, api_key: String, model: String) -> GeminiClient {
        GeminiClient {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.3,
                "responseMimeType": "application/json",
                "maxOutputTokens": 4096,
            },
        });

        debug!("sending prompt to Gemini ({} chars)", prompt.len());

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let payload: serde_json::Value = response
            .json()
            .await
            .context("Gemini response was not JSON")?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("Gemini response carried no candidate text"))?;

        Ok(text.to_owned())
    }
}
