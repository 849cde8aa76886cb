//! Report endpoints
//!
//! Read-only JSON views of the aggregated data; the spreadsheet-encoding
//! collaborator renders the monthly artifact from these payloads.

use crate::api::ExtractUser;
use crate::core::reports::{MonthlyReport, WeeklyReport};
use crate::core::traits::TimeTrackingService;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use di_axum::Inject;
use serde::Deserialize;

pub fn router() -> Router {
    Router::new()
        .route("/weekly", get(weekly))
        .route("/monthly", get(monthly))
}

#[derive(Deserialize, Debug)]
struct WeeklyParams {
    /// Any date inside the wanted week; defaults to the current week.
    start: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
struct MonthlyParams {
    year: i32,
    month: u32,
}

async fn weekly(
    Inject(service): Inject<dyn TimeTrackingService>,
    ExtractUser(current_user): ExtractUser,
    Query(params): Query<WeeklyParams>,
) -> (StatusCode, Json<WeeklyReport>) {
    match service.weekly_summary(current_user, params.start).await {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(WeeklyReport::default()),
        ),
    }
}

async fn monthly(
    Inject(service): Inject<dyn TimeTrackingService>,
    ExtractUser(current_user): ExtractUser,
    Query(params): Query<MonthlyParams>,
) -> (StatusCode, Json<MonthlyReport>) {
    if !(1..=12).contains(&params.month) {
        return (StatusCode::BAD_REQUEST, Json(MonthlyReport::default()));
    }

    match service
        .monthly_report(current_user, params.year, params.month)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(MonthlyReport::default()),
        ),
    }
}
