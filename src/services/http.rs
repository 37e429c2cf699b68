// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared reqwest plumbing for the collaborator clients.

use crate::error::AppError;
use std::time::Duration;

/// Upper bound on any single collaborator request. A timeout is reported
/// like any other failure of that collaborator.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Build the HTTP client used by all collaborator adapters.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Check response status and return the body text if successful.
///
/// `what` names the operation for the operator-facing error message.
pub async fn success_body(response: reqwest::Response, what: &str) -> Result<String, AppError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            tracing::warn!(operation = what, "Upstream rate limit hit (429)");
        }
        return Err(AppError::upstream(
            format!("{} failed with status {}", what, status),
            anyhow::anyhow!("HTTP {}: {}", status, body),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| AppError::upstream(format!("{}: could not read response", what), e))
}
