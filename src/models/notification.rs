// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Inbound Moves webhook notification.

use serde::{Deserialize, Serialize};

/// Update reason signalling that new storyline data was uploaded.
pub const DATA_UPLOAD_REASON: &str = "DataUpload";

/// Webhook payload pushed by Moves when a user's storyline changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Moves account ID
    pub user_id: u64,
    #[serde(default)]
    pub storyline_updates: Vec<StorylineUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorylineUpdate {
    pub reason: String,
}

impl Notification {
    /// True if any update reports a data upload.
    pub fn has_data_upload(&self) -> bool {
        self.storyline_updates
            .iter()
            .any(|u| u.reason == DATA_UPLOAD_REASON)
    }
}
