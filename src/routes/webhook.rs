// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Moves storyline notifications.

use crate::error::{AppError, Result};
use crate::models::Notification;
use crate::services::DispatchOutcome;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/{secret}", post(handle_notification))
}

/// Summary of what the webhook did.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub outcome: &'static str,
    pub segments: usize,
    pub messages: usize,
}

impl From<DispatchOutcome> for WebhookResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Ignored => Self {
                outcome: "ignored",
                segments: 0,
                messages: 0,
            },
            DispatchOutcome::UpToDate => Self {
                outcome: "up_to_date",
                segments: 0,
                messages: 0,
            },
            DispatchOutcome::Dispatched {
                segments, messages, ..
            } => Self {
                outcome: "dispatched",
                segments,
                messages,
            },
        }
    }
}

/// Handle an incoming storyline notification (POST).
async fn handle_notification(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    if secret != state.config.webhook_path_secret {
        tracing::warn!("Security Alert: Webhook path secret mismatch");
        return Err(AppError::NotFound("Unknown webhook".to_string()));
    }

    let notification: Notification = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse webhook notification");
        AppError::BadRequest(format!("Error unmarshalling JSON: {}", e))
    })?;

    tracing::info!(
        moves_user_id = notification.user_id,
        updates = notification.storyline_updates.len(),
        "Webhook notification received"
    );

    let outcome = state
        .dispatcher
        .handle_notification(&notification)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                moves_user_id = notification.user_id,
                error = %e,
                retryable = e.is_retryable(),
                "Webhook processing failed"
            );
        })?;

    Ok(Json(outcome.into()))
}
