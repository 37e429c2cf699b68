// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (Moves account link and segment watermark)
//! - Recipients (phone numbers that receive location texts)

use crate::db::{collections, RecipientStore, UserStore};
use crate::error::AppError;
use crate::models::{RecipientPhone, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations (support) ───────────────────────────────
    //
    // Users are provisioned by the account-linking flow, outside this
    // service. These point operations back the emulator tests; the webhook
    // path goes through `UserStore`.

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user, as the account-linking flow does.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Firestore aborts a transaction whose reads were invalidated by another writer.
fn is_aborted(err: &FirestoreError) -> bool {
    matches!(err, FirestoreError::DatabaseError(db) if db.public.code == "Aborted")
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn find_authorized_by_moves_id(&self, moves_user_id: u64) -> Result<User, AppError> {
        // Limit 2 is enough to tell "unique" from "ambiguous".
        let mut users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all([
                    q.field("authorized_with_moves").eq(true),
                    q.field("moves_user_id").eq(moves_user_id),
                ])
            })
            .limit(2)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match users.len() {
            0 => Err(AppError::NotFound(format!(
                "No authorized user for Moves account {}",
                moves_user_id
            ))),
            1 => Ok(users.remove(0)),
            _ => Err(AppError::Ambiguous(format!(
                "Multiple users linked to Moves account {}",
                moves_user_id
            ))),
        }
    }

    /// Watermark write guarded by the user's version counter.
    ///
    /// The current document is read through the transaction, so Firestore
    /// rejects the commit if another writer touched it in between. The write
    /// is only added when the stored version matches the one the caller read.
    async fn commit_watermark(
        &self,
        user: &User,
        watermark: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let current: Option<User> = tx_client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user.id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(current) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", user.id)));
        };

        if current.version != user.version {
            let _ = transaction.rollback().await;
            tracing::warn!(
                user_id = %user.id,
                read_version = user.version,
                stored_version = current.version,
                "Watermark write lost to a concurrent update"
            );
            return Err(AppError::Conflict(format!(
                "User {} changed since it was read (version {} != {})",
                user.id, current.version, user.version
            )));
        }

        let updated = User {
            last_segment_start_time: watermark,
            version: current.version + 1,
            ..current
        };

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&updated.id)
            .object(&updated)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(|e| {
            if is_aborted(&e) {
                AppError::Conflict(format!(
                    "User {} changed while the watermark was being written: {}",
                    user.id, e
                ))
            } else {
                AppError::Database(format!("Transaction commit failed: {}", e))
            }
        })?;

        tracing::debug!(
            user_id = %updated.id,
            version = updated.version,
            "Watermark committed"
        );

        Ok(())
    }
}

#[async_trait]
impl RecipientStore for FirestoreDb {
    async fn recipients_for(&self, user_id: &str) -> Result<Vec<RecipientPhone>, AppError> {
        let owner = user_id.to_string();
        let mut recipients: Vec<RecipientPhone> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::RECIPIENTS)
            .filter(move |q| q.for_all([q.field("owner_user_id").eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here rather than in the query to avoid a composite index.
        recipients.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(recipients)
    }

    async fn add_recipient(&self, recipient: &RecipientPhone) -> Result<(), AppError> {
        let doc_id = RecipientPhone::document_id(&recipient.owner_user_id, &recipient.label);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::RECIPIENTS)
            .document_id(&doc_id)
            .object(recipient)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn remove_recipient(&self, user_id: &str, label: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::RECIPIENTS)
            .document_id(RecipientPhone::document_id(user_id, label))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
