// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reverse geocoding via the TomTom Search API.

use crate::config::TomTomConfig;
use crate::error::AppError;
use crate::services::http;
use async_trait::async_trait;
use serde::Deserialize;

/// Turns coordinates into human-readable addresses.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidate formatted addresses, best match first. An empty list means
    /// nothing is known about the location; transport failures are errors.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<String>, AppError>;
}

/// TomTom reverse geocoder.
#[derive(Clone)]
pub struct TomTomGeocoder {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TomTomGeocoder {
    pub fn new(config: &TomTomConfig) -> Self {
        Self {
            http: http::build_client(),
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResponse {
    #[serde(default)]
    addresses: Vec<ReverseGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocodeResult {
    address: TomTomAddress,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomTomAddress {
    #[serde(default)]
    freeform_address: Option<String>,
}

impl ReverseGeocodeResponse {
    /// Keep only results that actually carry an address, in ranking order.
    fn formatted_addresses(self) -> Vec<String> {
        self.addresses
            .into_iter()
            .filter_map(|r| r.address.freeform_address)
            .filter(|a| !a.trim().is_empty())
            .collect()
    }
}

#[async_trait]
impl Geocoder for TomTomGeocoder {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<String>, AppError> {
        let url = format!(
            "{}/search/2/reverseGeocode/{},{}.json",
            self.base_url, lat, lon
        );

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::upstream("Error reverse geocoding address", e))?;

        let body = http::success_body(response, "Reverse geocode request").await?;

        let parsed: ReverseGeocodeResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::upstream("Error parsing reverse geocode response", e))?;

        Ok(parsed.formatted_addresses())
    }
}
