// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Whereabouts: text your people when you arrive somewhere new
//!
//! This crate receives Moves storyline webhooks, works out which places a
//! user has reached since the last run, and texts every registered
//! recipient the address of each new place.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RecipientStore;
use services::SegmentDispatcher;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub recipients: Arc<dyn RecipientStore>,
    pub dispatcher: SegmentDispatcher,
}
