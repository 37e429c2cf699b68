// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: in-memory collaborators and app builders.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use whereabouts::config::Config;
use whereabouts::db::{FirestoreDb, RecipientStore, UserStore};
use whereabouts::error::AppError;
use whereabouts::models::{DailySegments, Location, Place, RecipientPhone, Segment, User};
use whereabouts::routes::create_router;
use whereabouts::services::{Geocoder, HistoryClient, Notifier, SegmentDispatcher};
use whereabouts::AppState;

pub const MOVES_USER_ID: u64 = 8675309;
pub const USER_ID: &str = "user-1";

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection (emulator).
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A fixed point in time; tests offset from it in minutes.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
}

pub fn minutes(offset: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::minutes(offset)
}

pub fn named_segment(start_time: DateTime<Utc>, name: &str) -> Segment {
    Segment {
        place: Place {
            location: Location {
                lat: 37.386051,
                lon: -122.083855,
            },
            name: Some(name.to_string()),
        },
        start_time,
    }
}

pub fn unnamed_segment(start_time: DateTime<Utc>, lat: f64, lon: f64) -> Segment {
    Segment {
        place: Place {
            location: Location { lat, lon },
            name: None,
        },
        start_time,
    }
}

pub fn day(segments: Vec<Segment>) -> DailySegments {
    DailySegments {
        segments: Some(segments),
    }
}

pub fn test_user(watermark: DateTime<Utc>) -> User {
    User {
        last_segment_start_time: watermark,
        ..User::new(USER_ID, MOVES_USER_ID, "moves-token")
    }
}

pub fn recipient(label: &str, phone: &str) -> RecipientPhone {
    RecipientPhone {
        owner_user_id: USER_ID.to_string(),
        label: label.to_string(),
        phone: phone.to_string(),
    }
}

// ─── Fakes ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryUserStore {
    pub users: Mutex<Vec<User>>,
    pub lookups: AtomicUsize,
    pub commits: AtomicUsize,
    /// Simulate another writer bumping the record right before our commit.
    pub interfere_before_commit: AtomicBool,
}

impl InMemoryUserStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub fn user(&self, id: &str) -> User {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("user exists")
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_authorized_by_moves_id(&self, moves_user_id: u64) -> Result<User, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        let matches: Vec<&User> = users
            .iter()
            .filter(|u| u.authorized_with_moves && u.moves_user_id == moves_user_id)
            .collect();
        match matches.as_slice() {
            [] => Err(AppError::NotFound(format!("Moves account {}", moves_user_id))),
            [user] => Ok((*user).clone()),
            _ => Err(AppError::Ambiguous(format!("Moves account {}", moves_user_id))),
        }
    }

    async fn commit_watermark(&self, user: &User, watermark: DateTime<Utc>) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(user.id.clone()))?;

        if self.interfere_before_commit.load(Ordering::SeqCst) {
            stored.version += 1;
        }
        if stored.version != user.version {
            return Err(AppError::Conflict(format!("user {}", user.id)));
        }

        stored.last_segment_start_time = watermark;
        stored.version += 1;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRecipientStore {
    pub recipients: Mutex<Vec<RecipientPhone>>,
    pub reads: AtomicUsize,
}

impl InMemoryRecipientStore {
    pub fn with_recipients(recipients: Vec<RecipientPhone>) -> Self {
        Self {
            recipients: Mutex::new(recipients),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RecipientStore for InMemoryRecipientStore {
    async fn recipients_for(&self, user_id: &str) -> Result<Vec<RecipientPhone>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut found: Vec<RecipientPhone> = self
            .recipients
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner_user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(found)
    }

    async fn add_recipient(&self, recipient: &RecipientPhone) -> Result<(), AppError> {
        let mut recipients = self.recipients.lock().unwrap();
        recipients.retain(|r| {
            !(r.owner_user_id == recipient.owner_user_id && r.label == recipient.label)
        });
        recipients.push(recipient.clone());
        Ok(())
    }

    async fn remove_recipient(&self, user_id: &str, label: &str) -> Result<(), AppError> {
        self.recipients
            .lock()
            .unwrap()
            .retain(|r| !(r.owner_user_id == user_id && r.label == label));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeHistory {
    pub days: Mutex<Vec<DailySegments>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeHistory {
    pub fn with_days(days: Vec<DailySegments>) -> Self {
        Self {
            days: Mutex::new(days),
            ..Default::default()
        }
    }
}

#[async_trait]
impl HistoryClient for FakeHistory {
    async fn daily_segments(&self, access_token: &str) -> Result<Vec<DailySegments>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(access_token.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::upstream(
                "Could not parse Moves storyline",
                anyhow::anyhow!("expected value at line 1 column 1"),
            ));
        }
        Ok(self.days.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    pub candidates: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub calls: Mutex<Vec<(f64, f64)>>,
}

impl FakeGeocoder {
    pub fn with_candidates(candidates: &[&str]) -> Self {
        Self {
            candidates: Mutex::new(candidates.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<String>, AppError> {
        self.calls.lock().unwrap().push((lat, lon));
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::upstream(
                "Error reverse geocoding address",
                anyhow::anyhow!("connection reset"),
            ));
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}

/// Records every send attempt; optionally fails the Nth attempt (1-based).
#[derive(Default)]
pub struct RecordingNotifier {
    pub attempts: AtomicUsize,
    pub fail_on_attempt: Mutex<Option<usize>>,
    pub delivered: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on_attempt: Mutex::new(Some(attempt)),
            ..Default::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, body: &str, to: &str) -> Result<(), AppError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on_attempt.lock().unwrap() == Some(attempt) {
            return Err(AppError::upstream(
                "Error sending text message",
                anyhow::anyhow!("HTTP 500 Internal Server Error"),
            ));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((body.to_string(), to.to_string()));
        Ok(())
    }
}

// ─── Harness ─────────────────────────────────────────────────

/// All fakes wired into one dispatcher.
pub struct Harness {
    pub users: Arc<InMemoryUserStore>,
    pub recipients: Arc<InMemoryRecipientStore>,
    pub history: Arc<FakeHistory>,
    pub geocoder: Arc<FakeGeocoder>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(user: User, recipients: Vec<RecipientPhone>, days: Vec<DailySegments>) -> Self {
        Self {
            users: Arc::new(InMemoryUserStore::with_users(vec![user])),
            recipients: Arc::new(InMemoryRecipientStore::with_recipients(recipients)),
            history: Arc::new(FakeHistory::with_days(days)),
            geocoder: Arc::new(FakeGeocoder::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn with_geocoder(mut self, geocoder: FakeGeocoder) -> Self {
        self.geocoder = Arc::new(geocoder);
        self
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn dispatcher(&self) -> SegmentDispatcher {
        SegmentDispatcher::new(
            self.users.clone(),
            self.recipients.clone(),
            self.history.clone(),
            self.geocoder.clone(),
            self.notifier.clone(),
        )
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.users.user(USER_ID).last_segment_start_time
    }

    /// Router over these fakes.
    pub fn app(&self) -> axum::Router {
        let state = Arc::new(AppState {
            config: Config::test_default(),
            recipients: self.recipients.clone(),
            dispatcher: self.dispatcher(),
        });
        create_router(state)
    }
}

/// Router whose recipient store is an offline Firestore client (every call fails).
pub fn create_offline_test_app() -> axum::Router {
    let harness = Harness::new(test_user(t0()), vec![], vec![]);
    let state = Arc::new(AppState {
        config: Config::test_default(),
        recipients: Arc::new(FirestoreDb::new_mock()),
        dispatcher: harness.dispatcher(),
    });
    create_router(state)
}
