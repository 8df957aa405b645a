// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token exchange gateway endpoint.

use crate::error::{AppError, Result};
use crate::services::GatewayRequest;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Gateway route (no session required; open CORS is applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/fitbit", post(fitbit_gateway))
}

/// Dispatch one gateway action and relay the upstream JSON.
async fn fitbit_gateway(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GatewayRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    tracing::debug!(action = ?request.action, "Gateway request");

    let body = state.gateway.dispatch(request).await?;
    Ok(Json(body))
}
