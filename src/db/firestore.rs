// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Every document lives under `users/{uid}`:
//! - `users/{uid}` (profile)
//! - `users/{uid}/private/fitbit_tokens` (credentials)
//! - `users/{uid}/dailyProgress/{YYYY-MM-DD}`
//! - `users/{uid}/bmiHistory/{id}`

use crate::db::{collections, WellnessStore};
use crate::error::AppError;
use crate::models::{BmiEntry, CredentialRecord, DailyProgress, UserProfile};
use async_trait::async_trait;
use chrono::NaiveDate;
use firestore::{FirestoreQueryDirection, ParentPathBuilder};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Path of the user's document, parent of all their subcollections.
    fn user_path(&self, user_id: &str) -> Result<ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl WellnessStore for FirestoreDb {
    // ─── Credential Operations ───────────────────────────────────

    async fn get_credentials(&self, user_id: &str) -> Result<Option<CredentialRecord>, AppError> {
        let parent = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PRIVATE)
            .parent(&parent)
            .obj()
            .one(collections::FITBIT_TOKENS)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_credentials(
        &self,
        user_id: &str,
        credentials: &CredentialRecord,
    ) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;
        let _: CredentialRecord = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PRIVATE)
            .document_id(collections::FITBIT_TOKENS)
            .parent(&parent)
            .object(credentials)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: UserProfile = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Daily Progress Operations ───────────────────────────────

    async fn get_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgress>, AppError> {
        let parent = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_PROGRESS)
            .parent(&parent)
            .obj()
            .one(date.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;
        let _: DailyProgress = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_PROGRESS)
            .document_id(progress.date.to_string())
            .parent(&parent)
            .object(progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Range query on the stored `date` field; ISO dates order as strings.
    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>, AppError> {
        let parent = self.user_path(user_id)?;
        let (start, end) = (start.to_string(), end.to_string());
        self.get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_PROGRESS)
            .parent(&parent)
            .filter(move |q| {
                q.for_all([
                    q.field("date").greater_than_or_equal(start.clone()),
                    q.field("date").less_than_or_equal(end.clone()),
                ])
            })
            .order_by([("date", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── BMI History Operations ──────────────────────────────────

    async fn add_bmi_entry(&self, user_id: &str, entry: &BmiEntry) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;
        let _: BmiEntry = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::BMI_HISTORY)
            .document_id(&entry.id)
            .parent(&parent)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_bmi_entries(&self, user_id: &str) -> Result<Vec<BmiEntry>, AppError> {
        let parent = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BMI_HISTORY)
            .parent(&parent)
            .order_by([("timestamp", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Deletes concurrently with a limit to avoid overloading Firestore.
    async fn clear_bmi_entries(&self, user_id: &str) -> Result<usize, AppError> {
        let entries = self.list_bmi_entries(user_id).await?;
        let count = entries.len();
        let client = self.get_client()?;
        let parent = self.user_path(user_id)?;
        let parent = &parent;

        stream::iter(entries)
            .map(|entry| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::BMI_HISTORY)
                    .document_id(&entry.id)
                    .parent(parent)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(user_id, count, "Cleared BMI history");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_store_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let result = db.get_credentials("user-1").await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(db.get_progress("user-1", date).await.is_err());
    }
}
