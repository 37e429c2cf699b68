// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipient management routes for the signed-in user.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::RecipientPhone;
use crate::AppState;
use axum::{
    extract::State,
    response::Redirect,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Recipient routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipients", get(list_recipients).post(add_recipient))
        .route("/api/recipients/delete", post(remove_recipient))
}

/// Recipient as shown to its owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub label: String,
    pub phone: String,
}

/// List the caller's recipients.
async fn list_recipients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RecipientResponse>>> {
    let recipients = state.recipients.recipients_for(&user.user_id).await?;

    Ok(Json(
        recipients
            .into_iter()
            .map(|r| RecipientResponse {
                label: r.label,
                phone: r.phone,
            })
            .collect(),
    ))
}

/// Form posted to add a recipient. `parent` is the recipient's label.
#[derive(Debug, Deserialize, Validate)]
pub struct AddRecipientForm {
    #[validate(length(min = 1, max = 64))]
    pub parent: String,
    #[validate(length(min = 3, max = 32))]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveRecipientForm {
    #[validate(length(min = 1, max = 64))]
    pub parent: String,
}

/// Add (or replace) a recipient, then go back to the front page.
async fn add_recipient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<AddRecipientForm>,
) -> Result<Redirect> {
    let form = AddRecipientForm {
        parent: form.parent.trim().to_string(),
        phone: form.phone.trim().to_string(),
    };
    form.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid recipient: {}", e)))?;

    let recipient = RecipientPhone {
        owner_user_id: user.user_id,
        label: form.parent,
        phone: form.phone,
    };
    state.recipients.add_recipient(&recipient).await?;

    tracing::info!(
        user_id = %recipient.owner_user_id,
        label = %recipient.label,
        phone = %recipient.masked_phone(),
        "Recipient saved"
    );

    Ok(Redirect::to("/"))
}

/// Remove a recipient by label, then go back to the front page.
async fn remove_recipient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<RemoveRecipientForm>,
) -> Result<Redirect> {
    let label = form.parent.trim();
    if label.is_empty() {
        return Err(AppError::BadRequest("Missing recipient label".to_string()));
    }

    state.recipients.remove_recipient(&user.user_id, label).await?;

    tracing::info!(user_id = %user.user_id, label, "Recipient removed");

    Ok(Redirect::to("/"))
}
