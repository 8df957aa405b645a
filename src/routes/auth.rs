// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit OAuth connect routes.
//!
//! The browser is sent to Fitbit with a signed `state` naming the session
//! user; the frontend callback page posts the returned `code` and `state`
//! back here, and the code is exchanged server-side.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::fitbit;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed state stays valid.
const STATE_MAX_AGE_SECS: u64 = 15 * 60;

/// Fitbit connect routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fitbit/authorize", get(authorize))
        .route("/api/fitbit/connect", post(connect))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthorizeResponse {
    pub url: String,
}

/// Build the Fitbit authorization URL for the current user.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AuthorizeResponse>> {
    let client_id = state
        .config
        .fitbit_client_id
        .as_deref()
        .ok_or(AppError::Misconfigured)?;

    let oauth_state = sign_state(&user.user_id, unix_now()?, &state.config.oauth_state_key)?;

    let url = fitbit::authorize_url(
        &state.config.fitbit_auth_url,
        client_id,
        &state.config.fitbit_redirect_uri,
        &oauth_state,
    );

    tracing::info!(user_id = %user.user_id, "Starting Fitbit OAuth flow");

    Ok(Json(AuthorizeResponse { url }))
}

#[derive(Deserialize)]
pub struct ConnectRequest {
    code: String,
    state: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub connected: bool,
    pub fitbit_user_id: Option<String>,
    pub scope: Option<String>,
}

/// Exchange the authorization code and store the user's credentials.
async fn connect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>> {
    if body.code.is_empty() {
        return Err(AppError::BadRequest("Missing code".to_string()));
    }

    let state_user = verify_state(&body.state, &state.config.oauth_state_key, unix_now()?)
        .ok_or_else(|| AppError::BadRequest("Invalid or expired state".to_string()))?;

    if state_user != user.user_id {
        tracing::warn!(user_id = %user.user_id, "OAuth state issued to a different user");
        return Err(AppError::BadRequest("Invalid or expired state".to_string()));
    }

    let record = state
        .sync_service
        .connect(&user.user_id, &body.code, &state.config.fitbit_redirect_uri)
        .await?;

    Ok(Json(ConnectResponse {
        connected: true,
        fitbit_user_id: record.user_id,
        scope: record.scope,
    }))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_secs())
}

fn state_mac(payload: &str, secret: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Sign `timestamp_hex|user_id` and base64 the result for the URL.
fn sign_state(user_id: &str, issued_at: u64, secret: &[u8]) -> Result<String> {
    let timestamp_hex = format!("{:x}", issued_at);
    let payload = format!("{}|{}", timestamp_hex, user_id);
    let signature = hex::encode(state_mac(&payload, secret)?);
    Ok(URL_SAFE_NO_PAD.encode(format!(
        "{}|{}|{}",
        timestamp_hex, signature, user_id
    )))
}

/// Verify a signed state and return the user it was issued to.
fn verify_state(state: &str, secret: &[u8], now: u64) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "timestamp_hex|signature_hex|user_id"; the user id goes last
    // since it may itself contain '|'
    let mut parts = state_str.splitn(3, '|');
    let (timestamp_hex, signature_hex, user_id) = (parts.next()?, parts.next()?, parts.next()?);

    let payload = format!("{}|{}", timestamp_hex, user_id);
    let expected = state_mac(&payload, secret).ok()?;
    let provided = hex::decode(signature_hex).ok()?;

    if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u64::from_str_radix(timestamp_hex, 16).ok()?;
    if now.saturating_sub(issued_at) > STATE_MAX_AGE_SECS || issued_at > now + 60 {
        tracing::warn!(user_id, "OAuth state expired");
        return None;
    }

    Some(user_id.to_string())
}
