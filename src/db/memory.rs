// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for tests and local runs without Firestore.

use crate::db::WellnessStore;
use crate::error::AppError;
use crate::models::{BmiEntry, CredentialRecord, DailyProgress, UserProfile};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

/// [`WellnessStore`] backed by concurrent hash maps.
#[derive(Default)]
pub struct MemoryStore {
    credentials: DashMap<String, CredentialRecord>,
    profiles: DashMap<String, UserProfile>,
    progress: DashMap<(String, NaiveDate), DailyProgress>,
    bmi_history: DashMap<String, Vec<BmiEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WellnessStore for MemoryStore {
    async fn get_credentials(&self, user_id: &str) -> Result<Option<CredentialRecord>, AppError> {
        Ok(self.credentials.get(user_id).map(|c| c.clone()))
    }

    async fn set_credentials(
        &self,
        user_id: &str,
        credentials: &CredentialRecord,
    ) -> Result<(), AppError> {
        self.credentials
            .insert(user_id.to_string(), credentials.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }

    async fn set_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyProgress>, AppError> {
        Ok(self
            .progress
            .get(&(user_id.to_string(), date))
            .map(|p| p.clone()))
    }

    async fn set_progress(&self, user_id: &str, progress: &DailyProgress) -> Result<(), AppError> {
        self.progress
            .insert((user_id.to_string(), progress.date), progress.clone());
        Ok(())
    }

    async fn list_progress(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyProgress>, AppError> {
        let mut days: Vec<DailyProgress> = self
            .progress
            .iter()
            .filter(|e| e.key().0 == user_id && (start..=end).contains(&e.key().1))
            .map(|e| e.value().clone())
            .collect();
        days.sort_by_key(|d| d.date);
        Ok(days)
    }

    async fn add_bmi_entry(&self, user_id: &str, entry: &BmiEntry) -> Result<(), AppError> {
        self.bmi_history
            .entry(user_id.to_string())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn list_bmi_entries(&self, user_id: &str) -> Result<Vec<BmiEntry>, AppError> {
        let mut entries = self
            .bmi_history
            .get(user_id)
            .map(|e| e.clone())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(entries)
    }

    async fn clear_bmi_entries(&self, user_id: &str) -> Result<usize, AppError> {
        Ok(self
            .bmi_history
            .remove(user_id)
            .map(|(_, entries)| entries.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BmiCategory;

    fn entry(id: &str, timestamp: &str) -> BmiEntry {
        BmiEntry {
            id: id.to_string(),
            bmi: 22.0,
            height_cm: 175.0,
            weight_kg: 67.4,
            category: BmiCategory::NormalWeight,
            timestamp: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn test_bmi_history_is_ordered_and_scoped_per_user() {
        let store = MemoryStore::new();
        store
            .add_bmi_entry("alice", &entry("b", "2024-05-02T00:00:00Z"))
            .await
            .unwrap();
        store
            .add_bmi_entry("alice", &entry("a", "2024-05-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .add_bmi_entry("bob", &entry("c", "2024-05-03T00:00:00Z"))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_bmi_entries("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(store.clear_bmi_entries("alice").await.unwrap(), 2);
        assert!(store.list_bmi_entries("alice").await.unwrap().is_empty());
        assert_eq!(store.list_bmi_entries("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_progress_range_is_inclusive_and_per_user() {
        let store = MemoryStore::new();
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        for d in [3, 1, 7, 8] {
            store
                .set_progress("alice", &DailyProgress::new(day(d)))
                .await
                .unwrap();
        }
        store
            .set_progress("bob", &DailyProgress::new(day(2)))
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = store
            .list_progress("alice", day(1), day(7))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(dates, vec![day(1), day(3), day(7)]);
    }
}
