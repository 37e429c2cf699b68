// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whereabouts API Server
//!
//! Receives Moves storyline webhooks and texts registered recipients
//! whenever the user arrives somewhere new.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whereabouts::{
    config::Config,
    db::FirestoreDb,
    services::{MovesClient, SegmentDispatcher, TomTomGeocoder, TwilioNotifier},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Whereabouts API");

    // Initialize Firestore database
    let db = Arc::new(FirestoreDb::new(&config.gcp_project_id).await?);

    // Collaborator clients, built from their config sections
    let history = Arc::new(MovesClient::new(&config.moves));
    let geocoder = Arc::new(TomTomGeocoder::new(&config.tomtom));
    let notifier = Arc::new(TwilioNotifier::new(&config.twilio));
    tracing::info!(
        moves = %config.moves.api_url,
        past_days = config.moves.past_days,
        "Collaborator clients initialized"
    );

    let dispatcher = SegmentDispatcher::new(
        db.clone(),
        db.clone(),
        history,
        geocoder,
        notifier,
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        recipients: db,
        dispatcher,
    });

    // Build router
    let app = whereabouts::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("whereabouts=debug".parse().expect("static directive"))
                .add_directive("info".parse().expect("static directive")),
        )
        .with(format)
        .init();
}
