//! Language-model boundary tests
//!
//! Runs the Gemini client against a local wiremock server, and the full
//! extractor on top of it — no real API key or network access needed.

use chrono::NaiveDate;
use di::Ref;
use serde_json::json;
use time_tracker_bot::core::extractor::{ExtractionError, LlmEntryExtractor};
use time_tracker_bot::core::traits::EntryExtractor;
use time_tracker_bot::infrastructure::entities::Category;
use time_tracker_bot::infrastructure::gemini::GeminiClient;
use time_tracker_bot::infrastructure::traits::LanguageModel;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.0-flash";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::with_config(server.uri(), "test-key".to_string(), MODEL.to_string())
}

fn generate_content_path() -> String {
    format!("/models/{MODEL}:generateContent")
}

/// Wrap a model answer in the Gemini response envelope.
fn gemini_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [{ "text": text }] } }
        ]
    })
}

#[tokio::test]
async fn test_generate_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response("{\"entries\": []}")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let text = client.generate("prompt").await.unwrap();
    assert_eq!(text, "{\"entries\": []}");
}

#[tokio::test]
async fn test_generate_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.generate("prompt").await.is_err());
}

#[tokio::test]
async fn test_generate_fails_without_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.generate("prompt").await.is_err());
}

#[tokio::test]
async fn test_extractor_end_to_end_over_http() {
    let server = MockServer::start().await;
    let answer = r#"{"entries": [
        {"description": "Acme billing migration", "project": "Acme", "category": "billableProject", "estimatedHours": 3},
        {"description": "Internal standup", "project": "internal", "category": "otherNonBillable", "estimatedHours": 1}
    ]}"#;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response(answer)))
        .mount(&server)
        .await;

    let llm: Ref<dyn LanguageModel> = Ref::new(client_for(&server));
    let extractor = LlmEntryExtractor::create(llm);

    let target = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let raw_text = "migration work and a standup";
    let drafts = extractor.extract(raw_text, target).await.unwrap();

    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].category, Category::BillableProject);
    assert_eq!(drafts[1].estimated_hours, 1.0);
    for draft in &drafts {
        assert_eq!(draft.date, target);
        assert_eq!(draft.original_text, raw_text);
    }
}

#[tokio::test]
async fn test_extractor_maps_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let llm: Ref<dyn LanguageModel> = Ref::new(client_for(&server));
    let extractor = LlmEntryExtractor::create(llm);

    let target = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let err = extractor.extract("a day of work", target).await.unwrap_err();
    assert!(matches!(err, ExtractionError::ModelFailure(_)));
}

#[tokio::test]
async fn test_extractor_skips_the_model_for_empty_text() {
    // No mock server at all: empty input must not reach the network.
    let llm: Ref<dyn LanguageModel> = Ref::new(GeminiClient::with_config(
        "http://127.0.0.1:9".to_string(),
        "test-key".to_string(),
        MODEL.to_string(),
    ));
    let extractor = LlmEntryExtractor::create(llm);

    let target = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let err = extractor.extract("   ", target).await.unwrap_err();
    assert!(matches!(err, ExtractionError::EmptyResult));
}
