// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore.
///
/// Stored at: `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Application user ID (also used as document ID)
    pub user_id: String,

    // ─── Personal details ────────────────────────────────────────
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,

    /// Cleared when a sync finds the Fitbit connection has expired
    #[serde(default)]
    pub fitbit_connected: bool,
    #[serde(default)]
    pub goal_targets: GoalTargets,
    #[serde(default)]
    pub updated_at: String,
}

impl UserProfile {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: None,
            age: None,
            gender: None,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            fitbit_connected: false,
            goal_targets: GoalTargets::default(),
            updated_at: String::new(),
        }
    }

    /// Merge an edit into the profile; absent fields are left unchanged.
    pub fn apply_update(&mut self, update: &ProfileUpdate, now: &str) {
        if let Some(name) = &update.name {
            self.name = Some(name.trim().to_string());
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(gender) = update.gender {
            self.gender = Some(gender);
        }
        if let Some(height) = update.height_cm {
            self.height_cm = Some(height);
        }
        if let Some(weight) = update.weight_kg {
            self.weight_kg = Some(weight);
        }
        if let Some(level) = update.activity_level {
            self.activity_level = Some(level);
        }
        self.updated_at = now.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days a week
    LightlyActive,
    /// Moderate exercise 3-5 days a week
    ModeratelyActive,
    /// Hard exercise 6-7 days a week
    VeryActive,
}

/// A user's edit to their profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 130))]
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    #[validate(range(min = 50.0, max = 300.0))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 2.0, max = 500.0))]
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
}

/// Daily targets for the core trackers.
///
/// Replaced wholesale when the user saves their goals; fields missing from
/// a stored or submitted document take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase", default)]
pub struct GoalTargets {
    /// Glasses
    #[validate(range(min = 0.0, max = 100.0))]
    pub water_intake: f64,
    /// Minutes
    #[validate(range(min = 0.0, max = 1440.0))]
    pub activity_minutes: f64,
    /// Hours
    #[validate(range(min = 0.0, max = 24.0))]
    pub sleep_hours: f64,
    /// Minutes
    #[validate(range(min = 0.0, max = 1440.0))]
    pub mindfulness_minutes: f64,
    /// Hours
    #[validate(range(min = 0.0, max = 24.0))]
    pub screen_time_hours: f64,
}

impl Default for GoalTargets {
    fn default() -> Self {
        Self {
            water_intake: 8.0,
            activity_minutes: 30.0,
            sleep_hours: 8.0,
            mindfulness_minutes: 10.0,
            screen_time_hours: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_goal_targets_fill_defaults() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "userId": "u1",
            "goalTargets": { "waterIntake": 10.0 }
        }))
        .unwrap();

        assert!(!profile.fitbit_connected);
        assert_eq!(profile.goal_targets.water_intake, 10.0);
        assert_eq!(profile.goal_targets.sleep_hours, 8.0);
        assert_eq!(profile.name, None);
    }

    #[test]
    fn test_update_merges_present_fields() {
        let mut profile = UserProfile::new("u1");
        profile.fitbit_connected = true;
        profile.apply_update(
            &ProfileUpdate {
                name: Some("  Sam ".to_string()),
                height_cm: Some(172.0),
                activity_level: Some(ActivityLevel::LightlyActive),
                ..Default::default()
            },
            "2024-05-01T10:00:00Z",
        );
        profile.apply_update(
            &ProfileUpdate {
                age: Some(34),
                ..Default::default()
            },
            "2024-05-02T10:00:00Z",
        );

        assert_eq!(profile.name.as_deref(), Some("Sam"));
        assert_eq!(profile.height_cm, Some(172.0));
        assert_eq!(profile.age, Some(34));
        assert_eq!(profile.activity_level, Some(ActivityLevel::LightlyActive));
        assert!(profile.fitbit_connected);
        assert_eq!(profile.updated_at, "2024-05-02T10:00:00Z");
    }

    #[test]
    fn test_update_validation() {
        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "age": 0,
            "activityLevel": "very_active"
        }))
        .unwrap();
        assert!(update.validate().is_err());

        let goals = GoalTargets {
            sleep_hours: 30.0,
            ..Default::default()
        };
        assert!(goals.validate().is_err());
        assert!(GoalTargets::default().validate().is_ok());
    }
}
