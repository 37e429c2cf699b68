// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing for the timestamp formats the Moves API emits.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Compact ISO-8601 basic form used by the Moves API, e.g. `20240102T071430+0200`.
const BASIC_FORMAT_WITH_OFFSET: &str = "%Y%m%dT%H%M%S%z";
const BASIC_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Parse an upstream timestamp, accepting RFC3339 or the compact basic form.
pub fn parse_upstream_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(naive) = raw.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(naive, BASIC_FORMAT)
            .ok()
            .map(|dt| dt.and_utc());
    }

    DateTime::parse_from_str(raw, BASIC_FORMAT_WITH_OFFSET)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for [`parse_upstream_timestamp`].
pub fn deserialize_upstream_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_upstream_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}
