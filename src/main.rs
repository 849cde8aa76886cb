//! Conversational time-tracking web service

use time_tracker_bot::api;
use time_tracker_bot::core::extractor::LlmEntryExtractor;
use time_tracker_bot::core::locks::UserLocks;
use time_tracker_bot::core::services::MyTimeTrackingService;
use time_tracker_bot::infrastructure::database::DatabaseConnection;
use time_tracker_bot::infrastructure::gemini::GeminiClient;
use time_tracker_bot::infrastructure::repositories::DbRecordRepository;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::info;
use serde_json::{Value, json};
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task());

    Ok(())
}

async fn web_server_task() {
    let provider = ServiceCollection::new()
        .add(DatabaseConnection::singleton())
        .add(GeminiClient::singleton())
        .add(UserLocks::singleton())
        .add(DbRecordRepository::scoped())
        .add(LlmEntryExtractor::scoped())
        .add(MyTimeTrackingService::scoped())
        .build_provider()
        .unwrap();

    // build our application with a route
    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/messages", api::messages::router())
        .nest("/reports", api::reports::router())
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_origin([
                    "http://localhost:3000".parse::<HeaderValue>().unwrap(),
                    "http://localhost:5173".parse::<HeaderValue>().unwrap(),
                ]),
        )
        .with_provider(provider);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
    info!("Shutting down...");
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "time tracker is running", "status": "ok" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "time-tracker-bot" }))
}
