// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Segment dispatch pipeline.
//!
//! Handles the core workflow for one Moves webhook:
//! 1. Resolve the user linked to the Moves account
//! 2. Load the user's recipients
//! 3. Fetch recent storyline days from Moves
//! 4. Keep only segments newer than the user's watermark
//! 5. Resolve an address per segment and text every recipient
//! 6. Advance the watermark once the whole batch went out
//!
//! Any failure aborts the batch without moving the watermark, so the next
//! webhook retries everything from the first undelivered segment. Recipients
//! already texted in the aborted batch will be texted again.

use crate::db::{RecipientStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{DailySegments, Notification, RecipientPhone, Segment};
use crate::services::{Geocoder, HistoryClient, Notifier};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-account locks serializing invocations for the same user in this process.
pub type UserLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

/// Build the text sent for a newly reached place.
pub fn location_message(address: &str) -> String {
    format!("I'm now at {}.", address)
}

/// Flatten day groups and keep segments strictly after `watermark`,
/// ordered by start time.
pub fn new_segments(days: Vec<DailySegments>, watermark: DateTime<Utc>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = days
        .into_iter()
        .flat_map(DailySegments::into_segments)
        .filter(|s| s.start_time > watermark)
        .collect();
    segments.sort_by_key(|s| s.start_time);
    segments
}

/// What a webhook invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The event carried no data upload.
    Ignored,
    /// Nothing newer than the watermark.
    UpToDate,
    /// New segments went out and the watermark moved.
    Dispatched {
        segments: usize,
        messages: usize,
        watermark: DateTime<Utc>,
    },
}

/// Turns Moves webhooks into location texts.
#[derive(Clone)]
pub struct SegmentDispatcher {
    users: Arc<dyn UserStore>,
    recipients: Arc<dyn RecipientStore>,
    history: Arc<dyn HistoryClient>,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn Notifier>,
    user_locks: UserLocks,
}

impl SegmentDispatcher {
    pub fn new(
        users: Arc<dyn UserStore>,
        recipients: Arc<dyn RecipientStore>,
        history: Arc<dyn HistoryClient>,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            recipients,
            history,
            geocoder,
            notifier,
            user_locks: Arc::new(DashMap::new()),
        }
    }

    /// Process one webhook notification end to end.
    pub async fn handle_notification(&self, notification: &Notification) -> Result<DispatchOutcome> {
        let moves_user_id = notification.user_id;

        if !notification.has_data_upload() {
            tracing::debug!(moves_user_id, "No DataUpload reason, ignoring notification");
            return Ok(DispatchOutcome::Ignored);
        }

        // Held across the whole read-dispatch-commit sequence so a duplicate
        // delivery waits and then sees the advanced watermark.
        let lock = self
            .user_locks
            .entry(moves_user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.dispatch_for_account(moves_user_id).await
        };

        // Drop the entry unless another invocation is waiting on it, so
        // unknown or idle accounts don't accumulate.
        drop(lock);
        self.user_locks
            .remove_if(&moves_user_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Number of accounts with an invocation in flight.
    pub fn active_leases(&self) -> usize {
        self.user_locks.len()
    }

    async fn dispatch_for_account(&self, moves_user_id: u64) -> Result<DispatchOutcome> {
        let user = self.users.find_authorized_by_moves_id(moves_user_id).await?;
        let recipients = self.recipients.recipients_for(&user.id).await?;

        let days = self.history.daily_segments(&user.moves_access_token).await?;
        let segments = new_segments(days, user.last_segment_start_time);

        let Some(watermark) = segments.last().map(|s| s.start_time) else {
            tracing::debug!(user_id = %user.id, "No segments after watermark");
            return Ok(DispatchOutcome::UpToDate);
        };

        tracing::info!(
            user_id = %user.id,
            segments = segments.len(),
            recipients = recipients.len(),
            "Dispatching new segments"
        );

        let messages = self.fan_out(&segments, &recipients).await?;

        self.users.commit_watermark(&user, watermark).await?;

        tracing::info!(
            user_id = %user.id,
            segments = segments.len(),
            messages,
            watermark = %watermark,
            "Segments dispatched, watermark advanced"
        );

        Ok(DispatchOutcome::Dispatched {
            segments: segments.len(),
            messages,
            watermark,
        })
    }

    /// Text every recipient about every segment, segment-major. Stops at the
    /// first failed send and returns the number of messages sent otherwise.
    async fn fan_out(&self, segments: &[Segment], recipients: &[RecipientPhone]) -> Result<usize> {
        if recipients.is_empty() {
            tracing::debug!(segments = segments.len(), "No recipients, skipping sends");
            return Ok(0);
        }

        let mut sent = 0;
        for (index, segment) in segments.iter().enumerate() {
            let address = self.resolve_address(segment).await?;
            let message = location_message(&address);

            for recipient in recipients {
                if let Err(e) = self.notifier.send(&message, &recipient.phone).await {
                    tracing::error!(
                        error = %e,
                        phone = %recipient.masked_phone(),
                        segment = index + 1,
                        already_sent = sent,
                        "Send failed, aborting batch"
                    );
                    return Err(with_batch_progress(e, index + 1, segments.len(), sent));
                }
                sent += 1;
            }
        }

        Ok(sent)
    }

    /// Display address for a segment: the place name if it has one, else the
    /// first reverse-geocode candidate, else the raw coordinates.
    pub async fn resolve_address(&self, segment: &Segment) -> Result<String> {
        if let Some(name) = segment.place.display_name() {
            return Ok(name.to_string());
        }

        let location = segment.place.location;
        let candidates = self
            .geocoder
            .reverse_geocode(location.lat, location.lon)
            .await?;

        Ok(candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| location.coordinate_string()))
    }
}

/// Note how far the batch got, so operators can tell whether recipients
/// may receive duplicates when the event is redelivered.
fn with_batch_progress(err: AppError, segment: usize, total: usize, sent: usize) -> AppError {
    match err {
        AppError::Upstream { message, source } => AppError::Upstream {
            message: format!(
                "{} (segment {} of {}, {} messages already sent in this batch)",
                message, segment, total, sent
            ),
            source,
        },
        other => other,
    }
}
