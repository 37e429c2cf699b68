// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Moves API client for fetching a user's recent storyline places.

use crate::config::MovesConfig;
use crate::error::AppError;
use crate::models::DailySegments;
use crate::services::http;
use async_trait::async_trait;

/// Source of day-grouped segment history for a user.
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// Fetch the most recent days of places, oldest day first.
    async fn daily_segments(&self, access_token: &str) -> Result<Vec<DailySegments>, AppError>;
}

/// Moves API client.
#[derive(Clone)]
pub struct MovesClient {
    http: reqwest::Client,
    base_url: String,
    past_days: u32,
}

impl MovesClient {
    pub fn new(config: &MovesConfig) -> Self {
        Self {
            http: http::build_client(),
            base_url: config.api_url.clone(),
            past_days: config.past_days,
        }
    }
}

#[async_trait]
impl HistoryClient for MovesClient {
    async fn daily_segments(&self, access_token: &str) -> Result<Vec<DailySegments>, AppError> {
        let url = format!("{}/user/places/daily", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("pastDays", self.past_days.to_string())])
            .send()
            .await
            .map_err(|e| AppError::upstream("Could not reach Moves", e))?;

        let body = http::success_body(response, "Moves places request").await?;

        serde_json::from_str(&body)
            .map_err(|e| AppError::upstream("Could not parse Moves storyline", e))
    }
}
