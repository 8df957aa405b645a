// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::bmi::BmiInput;
use crate::models::progress::GoalCompletion;
use crate::models::summary::SUMMARY_DAYS;
use crate::models::{
    BmiEntry, BmiReading, DailyProgress, GoalTargets, ManualEdit, MetricFamily, ProfileUpdate,
    UserProfile, WeeklySummary,
};
use crate::services::sync::{SyncOutcome, SyncRange, MAX_SYNC_DATES};
use crate::time_utils::{format_utc_rfc3339, trailing_days};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/profile/goals", put(update_goals))
        .route("/api/sync", post(run_sync))
        .route("/api/progress/{date}", get(get_progress).put(put_progress))
        .route(
            "/api/progress/{date}/overrides/{family}",
            delete(release_override),
        )
        .route(
            "/api/bmi",
            post(record_bmi).get(list_bmi).delete(clear_bmi),
        )
        .route("/api/summary/week", get(weekly_summary))
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))
}

// ─── Profile ─────────────────────────────────────────────────

async fn load_profile(state: &AppState, user_id: &str) -> Result<UserProfile> {
    Ok(state
        .store
        .get_profile(user_id)
        .await?
        .unwrap_or_else(|| UserProfile::new(user_id)))
}

/// Get the current user's profile. Users without one get the defaults.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(load_profile(&state, &user.user_id).await?))
}

/// Update personal details; absent fields are kept.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    update
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid profile: {}", e)))?;

    let mut profile = load_profile(&state, &user.user_id).await?;
    profile.apply_update(&update, &format_utc_rfc3339(Utc::now()));
    state.store.set_profile(&profile).await?;

    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(Json(profile))
}

/// Replace the daily goal targets.
async fn update_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(goals): Json<GoalTargets>,
) -> Result<Json<UserProfile>> {
    goals
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid goals: {}", e)))?;

    let mut profile = load_profile(&state, &user.user_id).await?;
    profile.goal_targets = goals;
    profile.updated_at = format_utc_rfc3339(Utc::now());
    state.store.set_profile(&profile).await?;

    Ok(Json(profile))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RangeName {
    Today,
    Last7,
}

/// Either a named `range` or an explicit list of `dates`.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    range: Option<RangeName>,
    dates: Option<Vec<NaiveDate>>,
    /// The caller's local date; defaults to the UTC date
    today: Option<NaiveDate>,
}

impl SyncRequest {
    fn into_range(self) -> Result<(SyncRange, Option<NaiveDate>)> {
        let range = match (self.range, self.dates) {
            (Some(RangeName::Today), None) => SyncRange::Today,
            (Some(RangeName::Last7), None) => SyncRange::Last7,
            (None, Some(dates)) if dates.is_empty() => {
                return Err(AppError::BadRequest("No dates to sync".to_string()))
            }
            (None, Some(dates)) if dates.len() > MAX_SYNC_DATES => {
                return Err(AppError::BadRequest(format!(
                    "At most {} dates per sync",
                    MAX_SYNC_DATES
                )))
            }
            (None, Some(dates)) => SyncRange::Dates(dates),
            _ => {
                return Err(AppError::BadRequest(
                    "Provide either range or dates".to_string(),
                ))
            }
        };
        Ok((range, self.today))
    }
}

/// Pull the requested days from Fitbit into the user's records.
async fn run_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SyncRequest>,
) -> Result<Json<SyncOutcome>> {
    let (range, client_today) = body.into_range()?;

    let utc_today = Utc::now().date_naive();
    let today = match client_today {
        Some(day) if (day - utc_today).num_days().abs() <= 1 => day,
        Some(_) => {
            return Err(AppError::BadRequest(
                "today is more than a day from server date".to_string(),
            ))
        }
        None => utc_today,
    };
    if let SyncRange::Dates(dates) = &range {
        if dates.iter().any(|d| *d > today + Duration::days(1)) {
            return Err(AppError::BadRequest("Cannot sync future dates".to_string()));
        }
    }

    let dates = range.dates(today);
    tracing::info!(user_id = %user.user_id, count = dates.len(), "Sync requested");

    let outcome = state.sync_service.sync(&user.user_id, &dates).await?;
    Ok(Json(outcome))
}

// ─── Daily Progress ──────────────────────────────────────────

/// A day's record together with goal completion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub progress: DailyProgress,
    pub goals: GoalCompletion,
}

async fn progress_response(
    state: &AppState,
    user_id: &str,
    progress: DailyProgress,
) -> Result<ProgressResponse> {
    let targets = load_profile(state, user_id).await?.goal_targets;

    Ok(ProgressResponse {
        goals: progress.goal_completion(&targets),
        progress,
    })
}

/// Get a day's record. Days never written come back empty.
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<ProgressResponse>> {
    let date = parse_date(&date)?;
    let progress = state
        .store
        .get_progress(&user.user_id, date)
        .await?
        .unwrap_or_else(|| DailyProgress::new(date));

    Ok(Json(progress_response(&state, &user.user_id, progress).await?))
}

/// Apply a manual edit to a day.
async fn put_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(date): Path<String>,
    Json(edit): Json<ManualEdit>,
) -> Result<Json<ProgressResponse>> {
    let date = parse_date(&date)?;
    edit.validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid edit: {}", e)))?;

    let progress = state
        .sync_service
        .apply_manual_edit(&user.user_id, date, &edit)
        .await?;

    Ok(Json(progress_response(&state, &user.user_id, progress).await?))
}

/// Release a manual lock so the next sync may write the family.
async fn release_override(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((date, family)): Path<(String, String)>,
) -> Result<Json<ProgressResponse>> {
    let date = parse_date(&date)?;
    let family: MetricFamily = serde_json::from_value(serde_json::Value::String(family.clone()))
        .map_err(|_| AppError::BadRequest(format!("Unknown metric family: {}", family)))?;

    let progress = state
        .sync_service
        .release_override(&user.user_id, date, family)
        .await?;

    Ok(Json(progress_response(&state, &user.user_id, progress).await?))
}

// ─── BMI ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BmiResponse {
    pub reading: BmiReading,
    pub entry: BmiEntry,
}

/// Calculate a BMI and append it to the user's history.
async fn record_bmi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<BmiInput>,
) -> Result<Json<BmiResponse>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid measurement: {}", e)))?;

    let reading = BmiReading::calculate(&input);
    let entry = BmiEntry {
        id: uuid::Uuid::new_v4().to_string(),
        bmi: reading.bmi,
        height_cm: input.height_cm,
        weight_kg: input.weight_kg,
        category: reading.category,
        timestamp: format_utc_rfc3339(Utc::now()),
    };

    state.store.add_bmi_entry(&user.user_id, &entry).await?;

    Ok(Json(BmiResponse { reading, entry }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BmiHistoryResponse {
    pub entries: Vec<BmiEntry>,
}

/// BMI history, oldest first.
async fn list_bmi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BmiHistoryResponse>> {
    let entries = state.store.list_bmi_entries(&user.user_id).await?;
    Ok(Json(BmiHistoryResponse { entries }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearBmiResponse {
    pub deleted: usize,
}

async fn clear_bmi(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ClearBmiResponse>> {
    let deleted = state.store.clear_bmi_entries(&user.user_id).await?;
    tracing::info!(user_id = %user.user_id, deleted, "Cleared BMI history");
    Ok(Json(ClearBmiResponse { deleted }))
}

// ─── Weekly Summary ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Last day of the window; defaults to the UTC date
    end: Option<String>,
}

/// Seven days of progress ending at `end`, scored against the user's goals.
async fn weekly_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<WeeklySummary>> {
    let end = match query.end.as_deref() {
        Some(date) => parse_date(date)?,
        None => Utc::now().date_naive(),
    };
    let window = trailing_days(end, SUMMARY_DAYS);
    let start = window.first().copied().unwrap_or(end);

    let goals = load_profile(&state, &user.user_id).await?.goal_targets;
    let days = state.store.list_progress(&user.user_id, start, end).await?;
    let bmi_history = state.store.list_bmi_entries(&user.user_id).await?;

    Ok(Json(WeeklySummary::build(
        start,
        end,
        &days,
        &goals,
        bmi_history,
    )))
}
