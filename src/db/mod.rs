// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore) and the store traits the pipeline depends on.

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::Result;
use crate::models::{RecipientPhone, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Recipient phones, keyed by `{owner}_{label}`
    pub const RECIPIENTS: &str = "recipients";
}

/// Point lookups and the conditional watermark write for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the single Moves-authorized user with this Moves account ID.
    ///
    /// Fails with `NotFound` when there is none and `Ambiguous` when more
    /// than one user claims the account.
    async fn find_authorized_by_moves_id(&self, moves_user_id: u64) -> Result<User>;

    /// Set the user's watermark, provided the stored record still has the
    /// version that `user` was read at. A stale version yields `Conflict`.
    async fn commit_watermark(&self, user: &User, watermark: DateTime<Utc>) -> Result<()>;
}

/// Recipient phones registered for a user.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// All recipients of a user, ordered by label.
    async fn recipients_for(&self, user_id: &str) -> Result<Vec<RecipientPhone>>;

    /// Create or replace the recipient with this owner and label.
    async fn add_recipient(&self, recipient: &RecipientPhone) -> Result<()>;

    /// Delete a recipient. Deleting a missing label is not an error.
    async fn remove_recipient(&self, user_id: &str, label: &str) -> Result<()>;
}
