// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Storyline segments returned by the Moves places API.

use crate::time_utils::deserialize_upstream_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One day of segments.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySegments {
    /// Moves sends `null` for days without data
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
}

/// A stay at one place.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub place: Place,
    #[serde(deserialize_with = "deserialize_upstream_timestamp")]
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Place {
    pub location: Location,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl DailySegments {
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments.unwrap_or_default()
    }
}

impl Place {
    /// The place name, verbatim, if it is present and non-empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

impl Location {
    /// Fixed-precision `lat, lon` text used when no address is known.
    pub fn coordinate_string(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lon)
    }
}
