// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitBuddy-Sync: Fitbit token gateway and daily wellness reconciliation
//!
//! This crate provides the backend API that brokers Fitbit OAuth token
//! exchange and merges synced wearable data into per-day progress records
//! without overwriting values the user entered by hand.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::WellnessStore;
use services::{GatewayService, SyncService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn WellnessStore>,
    pub gateway: GatewayService,
    pub sync_service: SyncService,
}

impl AppState {
    /// Wire the services together around a store.
    pub fn new(config: Config, store: Arc<dyn WellnessStore>) -> Self {
        let gateway = GatewayService::new(
            reqwest::Client::new(),
            &config.fitbit_api_base,
            config.fitbit_credentials(),
        );
        let sync_service = SyncService::new(gateway.clone(), store.clone());

        Self {
            config,
            store,
            gateway,
            sync_service,
        }
    }
}
