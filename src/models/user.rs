// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked person, stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Stable user ID (also used as document ID)
    pub id: String,
    /// Moves account ID carried by inbound webhook events
    pub moves_user_id: u64,
    /// Whether the Moves authorization flow has completed
    pub authorized_with_moves: bool,
    /// Moves OAuth access token
    pub moves_access_token: String,
    /// Start time of the newest segment already dispatched
    #[serde(default = "epoch")]
    pub last_segment_start_time: DateTime<Utc>,
    /// Bumped on every watermark write; guards against lost updates
    #[serde(default)]
    pub version: u64,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl User {
    /// A freshly linked user that has not seen any segments yet.
    pub fn new(id: impl Into<String>, moves_user_id: u64, moves_access_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            moves_user_id,
            authorized_with_moves: true,
            moves_access_token: moves_access_token.into(),
            last_segment_start_time: epoch(),
            version: 0,
        }
    }
}
