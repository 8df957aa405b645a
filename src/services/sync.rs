// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit sync and manual-edit reconciliation.
//!
//! A sync walks its dates in ascending order, fetching activity, sleep and
//! heart rate for each through the gateway and merging them into the stored
//! day. A 401 on activity or sleep triggers exactly one token refresh per
//! sync; the failing date is retried once with the new token. Any further
//! 401, or Fitbit refusing the refresh itself, ends the sync as expired and
//! marks the profile disconnected. Outages during the refresh are returned
//! as errors and leave the connection alone.

use crate::db::WellnessStore;
use crate::error::AppError;
use crate::models::{
    CredentialRecord, DailyProgress, ManualEdit, MetricFamily, SyncedMetrics, TokenResponse,
    UserProfile,
};
use crate::services::fitbit::{self, FitbitResource};
use crate::services::gateway::GatewayService;
use crate::time_utils::{format_utc_rfc3339, trailing_days};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest explicit date list accepted for one sync.
pub const MAX_SYNC_DATES: usize = 31;

/// Message returned when the Fitbit connection can no longer be refreshed.
pub const EXPIRED_MESSAGE: &str = "Fitbit connection expired, please reconnect";

/// Which days a sync covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRange {
    Today,
    /// Today and the six preceding days
    Last7,
    Dates(Vec<NaiveDate>),
}

impl SyncRange {
    /// Distinct dates in ascending order.
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        match self {
            SyncRange::Today => vec![today],
            SyncRange::Last7 => trailing_days(today, 7),
            SyncRange::Dates(dates) => {
                let mut dates = dates.clone();
                dates.sort_unstable();
                dates.dedup();
                dates
            }
        }
    }
}

/// What one date's merge did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySyncReport {
    pub date: NaiveDate,
    pub written: Vec<MetricFamily>,
    pub skipped_manual: Vec<MetricFamily>,
}

/// Result of a sync attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No stored credentials, or the connection was marked expired.
    NotConnected,
    #[serde(rename_all = "camelCase")]
    Completed {
        days: Vec<DaySyncReport>,
        refreshed: bool,
        last_synced: String,
    },
    /// Dates merged before the connection expired are kept.
    #[serde(rename_all = "camelCase")]
    Expired {
        synced: Vec<NaiveDate>,
        message: String,
    },
}

/// Sync and manual-edit operations for one store.
#[derive(Clone)]
pub struct SyncService {
    gateway: GatewayService,
    store: Arc<dyn WellnessStore>,
}

impl SyncService {
    pub fn new(gateway: GatewayService, store: Arc<dyn WellnessStore>) -> Self {
        Self { gateway, store }
    }

    /// Exchange an authorization code and store the resulting credentials.
    pub async fn connect(
        &self,
        user_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CredentialRecord, AppError> {
        let body = self.gateway.exchange_token(code, redirect_uri).await?;
        let now = format_utc_rfc3339(Utc::now());
        let record = credential_from_body(body, &now)?;

        self.store.set_credentials(user_id, &record).await?;

        let mut profile = self.profile_or_new(user_id).await?;
        profile.fitbit_connected = true;
        profile.updated_at = now;
        self.store.set_profile(&profile).await?;

        tracing::info!(user_id, fitbit_user = ?record.user_id, "Fitbit connected");
        Ok(record)
    }

    /// Sync the given dates (ascending) from Fitbit.
    pub async fn sync(&self, user_id: &str, dates: &[NaiveDate]) -> Result<SyncOutcome, AppError> {
        let Some(mut credentials) = self.load_connection(user_id).await? else {
            tracing::debug!(user_id, "Sync skipped, Fitbit not connected");
            return Ok(SyncOutcome::NotConnected);
        };

        let mut refreshed = false;
        let mut days = Vec::with_capacity(dates.len());
        let synced_at = format_utc_rfc3339(Utc::now());

        for &date in dates {
            let metrics = match self.fetch_day(&credentials.access_token, date).await {
                Ok(metrics) => metrics,
                Err(e) if e.is_unauthorized_upstream() && !refreshed => {
                    refreshed = true;
                    tracing::info!(user_id, %date, "Fitbit access token rejected, refreshing");

                    let refresh = self.refresh(user_id, &credentials).await;
                    credentials = match refresh {
                        Ok(new_credentials) => new_credentials,
                        Err(e) if e.is_rejected_upstream() => {
                            tracing::warn!(user_id, error = %e, "Fitbit refused token refresh");
                            return self.expire(user_id, &days).await;
                        }
                        Err(e) => {
                            tracing::warn!(user_id, error = %e, "Fitbit token refresh failed");
                            return Err(e);
                        }
                    };

                    match self.fetch_day(&credentials.access_token, date).await {
                        Ok(metrics) => metrics,
                        Err(e) if e.is_unauthorized_upstream() => {
                            tracing::info!(user_id, %date, "Fitbit rejected refreshed token");
                            return self.expire(user_id, &days).await;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) if e.is_unauthorized_upstream() => {
                    tracing::info!(user_id, %date, "Fitbit rejected refreshed token");
                    return self.expire(user_id, &days).await;
                }
                Err(e) => return Err(e),
            };

            days.push(self.reconcile(user_id, date, &metrics, &synced_at).await?);
        }

        tracing::info!(user_id, days = days.len(), refreshed, "Fitbit sync completed");

        Ok(SyncOutcome::Completed {
            days,
            refreshed,
            last_synced: synced_at,
        })
    }

    /// Fetch one day. Heart-rate failures are logged and dropped.
    async fn fetch_day(&self, access_token: &str, date: NaiveDate) -> Result<SyncedMetrics, AppError> {
        let body = self
            .gateway
            .fetch_resource(access_token, FitbitResource::ActivitySummary, date)
            .await?;
        let activity = fitbit::parse_activity_day(&body)?;

        let body = self
            .gateway
            .fetch_resource(access_token, FitbitResource::Sleep, date)
            .await?;
        let sleep = fitbit::parse_sleep_day(&body)?;

        let resting_heart_rate = match self
            .gateway
            .fetch_resource(access_token, FitbitResource::HeartRate, date)
            .await
            .and_then(|body| fitbit::parse_resting_heart_rate(&body))
        {
            Ok(bpm) => bpm,
            Err(e) => {
                tracing::warn!(%date, error = %e, "Heart rate unavailable, continuing without it");
                None
            }
        };

        Ok(fitbit::synced_metrics(activity, sleep, resting_heart_rate))
    }

    /// Refresh the token pair and persist it wholesale.
    async fn refresh(
        &self,
        user_id: &str,
        credentials: &CredentialRecord,
    ) -> Result<CredentialRecord, AppError> {
        let body = self.gateway.refresh_token(&credentials.refresh_token).await?;
        let record = credential_from_body(body, &format_utc_rfc3339(Utc::now()))?;
        self.store.set_credentials(user_id, &record).await?;

        tracing::info!(user_id, "Fitbit token refreshed");
        Ok(record)
    }

    /// Merge one day's metrics into the stored record.
    pub async fn reconcile(
        &self,
        user_id: &str,
        date: NaiveDate,
        metrics: &SyncedMetrics,
        synced_at: &str,
    ) -> Result<DaySyncReport, AppError> {
        let mut progress = self
            .store
            .get_progress(user_id, date)
            .await?
            .unwrap_or_else(|| DailyProgress::new(date));

        let outcome = progress.merge_synced(metrics, synced_at);
        self.store.set_progress(user_id, &progress).await?;

        if !outcome.skipped_manual.is_empty() {
            tracing::debug!(
                user_id,
                %date,
                skipped = ?outcome.skipped_manual,
                "Kept manually entered values"
            );
        }

        Ok(DaySyncReport {
            date,
            written: outcome.written,
            skipped_manual: outcome.skipped_manual,
        })
    }

    /// Store a user's edit to a day, locking any synced family it touches.
    pub async fn apply_manual_edit(
        &self,
        user_id: &str,
        date: NaiveDate,
        edit: &ManualEdit,
    ) -> Result<DailyProgress, AppError> {
        let mut progress = self
            .store
            .get_progress(user_id, date)
            .await?
            .unwrap_or_else(|| DailyProgress::new(date));

        progress.apply_manual_edit(edit, &format_utc_rfc3339(Utc::now()));
        self.store.set_progress(user_id, &progress).await?;

        Ok(progress)
    }

    /// Hand a manually locked family back to the sync.
    pub async fn release_override(
        &self,
        user_id: &str,
        date: NaiveDate,
        family: MetricFamily,
    ) -> Result<DailyProgress, AppError> {
        let mut progress = self
            .store
            .get_progress(user_id, date)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No progress recorded for {}", date)))?;

        if progress.release_override(family) {
            progress.updated_at = format_utc_rfc3339(Utc::now());
            self.store.set_progress(user_id, &progress).await?;
            tracing::info!(user_id, %date, ?family, "Released manual override");
        }

        Ok(progress)
    }

    /// Credentials to sync with, or `None` when not connected.
    async fn load_connection(&self, user_id: &str) -> Result<Option<CredentialRecord>, AppError> {
        if let Some(profile) = self.store.get_profile(user_id).await? {
            if !profile.fitbit_connected {
                return Ok(None);
            }
        }
        self.store.get_credentials(user_id).await
    }

    async fn expire(&self, user_id: &str, days: &[DaySyncReport]) -> Result<SyncOutcome, AppError> {
        self.mark_disconnected(user_id).await?;
        tracing::warn!(user_id, synced = days.len(), "Fitbit connection expired");

        Ok(SyncOutcome::Expired {
            synced: days.iter().map(|d| d.date).collect(),
            message: EXPIRED_MESSAGE.to_string(),
        })
    }

    /// Clear `fitbitConnected`. Stored credentials are left in place.
    pub async fn mark_disconnected(&self, user_id: &str) -> Result<(), AppError> {
        let mut profile = self.profile_or_new(user_id).await?;
        profile.fitbit_connected = false;
        profile.updated_at = format_utc_rfc3339(Utc::now());
        self.store.set_profile(&profile).await
    }

    async fn profile_or_new(&self, user_id: &str) -> Result<UserProfile, AppError> {
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }
}

fn credential_from_body(body: serde_json::Value, now: &str) -> Result<CredentialRecord, AppError> {
    let token: TokenResponse = serde_json::from_value(body).map_err(|e| {
        tracing::error!(error = %e, "Unexpected Fitbit token response");
        AppError::Upstream {
            status: 502,
            error: "Unexpected Fitbit token response".to_string(),
            details: None,
        }
    })?;
    Ok(CredentialRecord::from_token_response(token, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_range_dates_are_ascending_and_distinct() {
        assert_eq!(SyncRange::Today.dates(date(7)), vec![date(7)]);

        let week = SyncRange::Last7.dates(date(7));
        assert_eq!(week.len(), 7);
        assert_eq!(week.first(), Some(&date(1)));
        assert_eq!(week.last(), Some(&date(7)));

        let explicit = SyncRange::Dates(vec![date(3), date(1), date(3)]).dates(date(7));
        assert_eq!(explicit, vec![date(1), date(3)]);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(SyncOutcome::Expired {
            synced: vec![date(1)],
            message: EXPIRED_MESSAGE.to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "expired");
        assert_eq!(json["synced"][0], "2024-05-01");

        let json = serde_json::to_value(SyncOutcome::Completed {
            days: vec![],
            refreshed: true,
            last_synced: "2024-05-01T20:00:00Z".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["lastSynced"], "2024-05-01T20:00:00Z");

        let json = serde_json::to_value(SyncOutcome::NotConnected).unwrap();
        assert_eq!(json["status"], "not_connected");
    }
}
