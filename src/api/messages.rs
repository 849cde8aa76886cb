//! Inbound message endpoint
//!
//! The chat-transport layer delivers each user event here; the reply payload
//! goes back to the user verbatim.

use crate::api::ExtractUser;
use crate::api::messages::schemas::{IncomingMessage, Reply};
use crate::core::traits::TimeTrackingService;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use di_axum::Inject;
use log::error;

pub fn router() -> Router {
    Router::new().route("/", post(post_message))
}

async fn post_message(
    Inject(service): Inject<dyn TimeTrackingService>,
    ExtractUser(current_user): ExtractUser,
    Json(message): Json<IncomingMessage>,
) -> (StatusCode, Json<Reply>) {
    let received_at = message.timestamp.unwrap_or_else(Utc::now);

    match service
        .handle_message(current_user, &message.text, received_at)
        .await
    {
        Ok(reply) => (StatusCode::OK, Json(Reply { reply })),
        Err(e) => {
            // Session state did not advance; the transport may redeliver.
            error!("failed to handle message for user {current_user}: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Reply::default()))
        }
    }
}

pub mod schemas {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct IncomingMessage {
        pub text: String,
        /// Recording instant; the current time when the transport omits it.
        pub timestamp: Option<DateTime<Utc>>,
    }

    #[derive(Serialize, Debug, Default)]
    pub struct Reply {
        pub reply: String,
    }
}
