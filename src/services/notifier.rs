// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound text messages via the Twilio Messages API.

use crate::config::TwilioConfig;
use crate::error::AppError;
use crate::services::http;
use async_trait::async_trait;
use serde::Deserialize;

/// Delivers one message to one phone number. No retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, body: &str, to: &str) -> Result<(), AppError>;
}

/// Twilio SMS notifier.
#[derive(Clone)]
pub struct TwilioNotifier {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioNotifier {
    pub fn new(config: &TwilioConfig) -> Self {
        Self {
            http: http::build_client(),
            base_url: config.api_url.clone(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        }
    }
}

/// Subset of the Twilio message resource we log.
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, body: &str, to: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream("Error sending text message", e))?;

        let body = http::success_body(response, "Error sending text message").await?;

        match serde_json::from_str::<MessageResource>(&body) {
            Ok(message) => {
                tracing::debug!(sid = %message.sid, status = ?message.status, "Text message queued")
            }
            Err(e) => tracing::debug!(error = %e, "Unrecognized Twilio response body"),
        }

        Ok(())
    }
}
