// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitBuddy-Sync API Server
//!
//! Brokers Fitbit OAuth for the FitBuddy web app and keeps each user's
//! daily wellness records in step with their wearable.

use fitbuddy_sync::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, WellnessStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting FitBuddy-Sync API");

    if config.fitbit_credentials().is_none() {
        tracing::warn!("FITBIT_CLIENT_ID/FITBIT_CLIENT_SECRET not set; token exchange will fail");
    }
    tracing::info!(
        gemini_configured = config.gemini_api_key.is_some(),
        "Plan generator key status"
    );

    let store: Arc<dyn WellnessStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, store));

    // Build router
    let app = fitbuddy_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitbuddy_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
