// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic and collaborator clients.

pub mod dispatch;
pub mod geocode;
pub mod http;
pub mod moves;
pub mod notifier;

pub use dispatch::{DispatchOutcome, SegmentDispatcher};
pub use geocode::{Geocoder, TomTomGeocoder};
pub use moves::{HistoryClient, MovesClient};
pub use notifier::{Notifier, TwilioNotifier};
