// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipient phone model.

use serde::{Deserialize, Serialize};

/// A phone number that receives location texts for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientPhone {
    /// Owning user ID
    pub owner_user_id: String,
    /// Display label, unique per owner
    pub label: String,
    /// Destination phone number
    pub phone: String,
}

impl RecipientPhone {
    /// Firestore document ID: `{owner}_{urlencoded label}`.
    pub fn document_id(owner_user_id: &str, label: &str) -> String {
        format!("{}_{}", owner_user_id, urlencoding::encode(label))
    }

    /// Phone number with everything but the last four digits masked, for logs.
    pub fn masked_phone(&self) -> String {
        let digits: Vec<char> = self.phone.chars().collect();
        let visible = digits.len().min(4);
        let hidden = digits.len() - visible;
        let tail: String = digits[hidden..].iter().collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}
