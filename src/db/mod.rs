// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{BmiEntry, CredentialRecord, DailyProgress, UserProfile};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Collection and document names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user subcollection readable only by its owner
    pub const PRIVATE: &str = "private";
    pub const FITBIT_TOKENS: &str = "fitbit_tokens";
    pub const DAILY_PROGRESS: &str = "dailyProgress";
    pub const BMI_HISTORY: &str = "bmiHistory";
}

/// Per-user document storage used by the services.
///
/// All records live under the owning user's document; no operation reads
/// across users.
#[async_trait]
pub trait WellnessStore: Send + Sync {
    // ─── Credentials ─────────────────────────────────────────────
    async fn get_credentials(&self, user_id: &str) -> Result<Option<CredentialRecord>, AppError>;
    async fn set_credentials(
        &self,
        user_id: &str,
        credentials: &CredentialRecord,
    ) -> Result<(), AppError>;

    // ─── Profile ─────────────────────────────────────────────────
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
    async fn set_profile(&self, profile: &UserProfile) -> Result<(), AppError>;

    // ─── Daily progress ──────────────────────────────────────────
    async fn get_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgress>, AppError>;
    async fn set_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<(), AppError>;
    /// Records dated `start..=end`, oldest first. Days never written are absent.
    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>, AppError>;

    // ─── BMI history ─────────────────────────────────────────────
    async fn add_bmi_entry(&self, user_id: &str, entry: &BmiEntry) -> Result<(), AppError>;
    /// Entries ordered oldest first.
    async fn list_bmi_entries(&self, user_id: &str) -> Result<Vec<BmiEntry>, AppError>;
    /// Returns the number of entries removed.
    async fn clear_bmi_entries(&self, user_id: &str) -> Result<usize, AppError>;
}
