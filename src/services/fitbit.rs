// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit Web API client.
//!
//! Handles:
//! - Token endpoint calls (authorization-code and refresh-token grants)
//! - Bearer-authenticated GETs for the three daily data resources
//! - Building and recognising the permitted data URLs
//! - Mapping Fitbit's daily JSON into [`SyncedMetrics`]
//!
//! Responses are returned raw (status + JSON) so the gateway can relay them
//! verbatim; interpretation is left to the caller.

use crate::error::AppError;
use crate::models::progress::{ActivityTotals, SleepStages, SleepSummary, SyncedMetrics};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fitbit Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.fitbit.com";

/// Fitbit authorization page
pub const DEFAULT_AUTH_URL: &str = "https://www.fitbit.com/oauth2/authorize";

/// Scopes requested when connecting
pub const SCOPES: &str = "activity heartrate location nutrition profile sleep weight";

/// Requested token lifetime on the authorize page (one week)
pub const AUTH_EXPIRES_IN_SECS: &str = "604800";

/// Server-held OAuth client credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// The daily data resources a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitbitResource {
    ActivitySummary,
    Sleep,
    HeartRate,
}

impl FitbitResource {
    pub const ALL: [FitbitResource; 3] = [
        FitbitResource::ActivitySummary,
        FitbitResource::Sleep,
        FitbitResource::HeartRate,
    ];

    /// Path prefix and suffix around the `YYYY-MM-DD` date.
    fn path_parts(self) -> (&'static str, &'static str) {
        match self {
            FitbitResource::ActivitySummary => ("/1/user/-/activities/date/", ".json"),
            FitbitResource::Sleep => ("/1.2/user/-/sleep/date/", ".json"),
            FitbitResource::HeartRate => ("/1/user/-/activities/heart/date/", "/1d.json"),
        }
    }
}

/// Raw upstream response: status plus body (JSON, or a JSON string holding
/// the raw text when the body was not JSON).
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fitbit API client.
#[derive(Clone)]
pub struct FitbitClient {
    http: reqwest::Client,
    api_base: String,
}

impl FitbitClient {
    pub fn new(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.api_base)
    }

    /// Upstream URL for one resource on one day.
    pub fn resource_url(&self, resource: FitbitResource, date: NaiveDate) -> String {
        let (prefix, suffix) = resource.path_parts();
        format!(
            "{}{}{}{}",
            self.api_base,
            prefix,
            date.format("%Y-%m-%d"),
            suffix
        )
    }

    /// Recognise a caller-supplied URL as one of the permitted resources.
    ///
    /// Only URLs this client would itself build are accepted: same base,
    /// same path, no query string.
    pub fn resolve_endpoint(&self, endpoint: &str) -> Option<(FitbitResource, NaiveDate)> {
        let path = endpoint.strip_prefix(&self.api_base)?;

        FitbitResource::ALL.into_iter().find_map(|resource| {
            let (prefix, suffix) = resource.path_parts();
            let date_str = path.strip_prefix(prefix)?.strip_suffix(suffix)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
            (self.resource_url(resource, date) == endpoint).then_some((resource, date))
        })
    }

    /// POST a grant to the token endpoint with HTTP Basic client auth.
    pub async fn post_token_grant(
        &self,
        credentials: &ClientCredentials,
        form: &[(&str, &str)],
    ) -> Result<UpstreamResponse, reqwest::Error> {
        let response = self
            .http
            .post(self.token_url())
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(form)
            .send()
            .await?;

        Self::read_response(response).await
    }

    /// GET a URL with a Bearer token.
    pub async fn get(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<UpstreamResponse, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(UpstreamResponse { status, body })
    }
}

/// Build the Fitbit authorization page URL for the code grant.
pub fn authorize_url(auth_url: &str, client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&expires_in={}&state={}",
        auth_url,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(SCOPES),
        AUTH_EXPIRES_IN_SECS,
        urlencoding::encode(state)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Daily response shapes
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /1/user/-/activities/date/{date}.json`
#[derive(Debug, Deserialize)]
struct ActivityDayResponse {
    summary: ActivitySummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ActivitySummary {
    steps: u32,
    calories_out: u32,
    fairly_active_minutes: u32,
    very_active_minutes: u32,
    floors: u32,
    distances: Vec<ActivityDistance>,
}

#[derive(Debug, Deserialize)]
struct ActivityDistance {
    activity: String,
    distance: f64,
}

/// `GET /1.2/user/-/sleep/date/{date}.json`
#[derive(Debug, Deserialize)]
struct SleepDayResponse {
    #[serde(default)]
    summary: SleepDaySummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SleepDaySummary {
    total_minutes_asleep: u32,
    stages: Option<SleepDayStages>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SleepDayStages {
    deep: u32,
    light: u32,
    rem: u32,
    wake: u32,
}

/// `GET /1/user/-/activities/heart/date/{date}/1d.json`
#[derive(Debug, Deserialize)]
struct HeartDayResponse {
    #[serde(rename = "activities-heart", default)]
    activities_heart: Vec<HeartDayEntry>,
}

#[derive(Debug, Deserialize)]
struct HeartDayEntry {
    value: HeartDayValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartDayValue {
    resting_heart_rate: Option<u32>,
}

/// Parsed activity summary: steps/distance/floors, calories, active minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDay {
    pub totals: ActivityTotals,
    pub calories: u32,
    pub active_minutes: u32,
}

pub fn parse_activity_day(body: &Value) -> Result<ActivityDay, AppError> {
    let response: ActivityDayResponse = serde_json::from_value(body.clone())
        .map_err(|e| malformed("activity summary", e))?;
    let summary = response.summary;

    let distance_km = summary
        .distances
        .iter()
        .find(|d| d.activity == "total")
        .map(|d| d.distance)
        .unwrap_or(0.0);

    Ok(ActivityDay {
        totals: ActivityTotals {
            steps: summary.steps,
            distance_km,
            floors: summary.floors,
        },
        calories: summary.calories_out,
        active_minutes: summary.fairly_active_minutes + summary.very_active_minutes,
    })
}

pub fn parse_sleep_day(body: &Value) -> Result<SleepSummary, AppError> {
    let response: SleepDayResponse =
        serde_json::from_value(body.clone()).map_err(|e| malformed("sleep", e))?;
    let summary = response.summary;
    let stages = summary.stages.unwrap_or_default();

    Ok(SleepSummary {
        hours: (f64::from(summary.total_minutes_asleep) / 60.0 * 10.0).round() / 10.0,
        stages: SleepStages {
            deep: stages.deep,
            light: stages.light,
            rem: stages.rem,
            awake: stages.wake,
        },
    })
}

/// Resting heart rate, if the day has one.
pub fn parse_resting_heart_rate(body: &Value) -> Result<Option<u32>, AppError> {
    let response: HeartDayResponse =
        serde_json::from_value(body.clone()).map_err(|e| malformed("heart rate", e))?;
    Ok(response
        .activities_heart
        .first()
        .and_then(|entry| entry.value.resting_heart_rate))
}

/// Combine the three daily responses into one set of synced metrics.
pub fn synced_metrics(
    activity: ActivityDay,
    sleep: SleepSummary,
    resting_heart_rate: Option<u32>,
) -> SyncedMetrics {
    SyncedMetrics {
        activity: activity.totals,
        calories: activity.calories,
        active_minutes: activity.active_minutes,
        sleep,
        resting_heart_rate,
    }
}

fn malformed(what: &str, e: serde_json::Error) -> AppError {
    tracing::warn!(error = %e, resource = what, "Unexpected Fitbit response shape");
    AppError::Upstream {
        status: 502,
        error: format!("Unexpected Fitbit {} response", what),
        details: Some(Value::String(e.to_string())),
    }
}
