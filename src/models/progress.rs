// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily progress record and the per-metric manual lock.
//!
//! Each metric family synced from Fitbit is wrapped in [`Tracked`], which
//! carries the value together with where it came from. A family whose
//! source is [`MetricSource::Manual`] is never written by a sync; only a
//! further manual edit or an explicit [`DailyProgress::release_override`]
//! changes it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::profile::GoalTargets;

/// Where a metric value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    Manual,
    Fitbit,
}

/// A metric value paired with its source tag.
///
/// `source` is `None` until the family is first written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct Tracked<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MetricSource>,
}

impl<T> Tracked<T> {
    pub fn is_manual(&self) -> bool {
        self.source == Some(MetricSource::Manual)
    }

    /// Write a synced value unless the family is locked. Returns whether
    /// the value was written.
    pub fn apply_synced(&mut self, value: T) -> bool {
        if self.is_manual() {
            return false;
        }
        self.value = value;
        self.source = Some(MetricSource::Fitbit);
        true
    }

    /// Write a user-entered value and lock the family.
    pub fn apply_manual(&mut self, value: T) {
        self.value = value;
        self.source = Some(MetricSource::Manual);
    }

    /// Drop the manual lock, keeping the current value until the next sync.
    /// Returns whether a lock was present.
    pub fn release(&mut self) -> bool {
        if self.is_manual() {
            self.source = None;
            true
        } else {
            false
        }
    }
}

/// Steps, distance and floors share a single source tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct ActivityTotals {
    pub steps: u32,
    /// Total distance in kilometres
    pub distance_km: f64,
    pub floors: u32,
}

/// Minutes spent in each sleep stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct SleepStages {
    pub deep: u32,
    pub light: u32,
    pub rem: u32,
    pub awake: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct SleepSummary {
    pub hours: f64,
    #[serde(default)]
    pub stages: SleepStages,
}

/// Advisory sync marker, used for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_synced: String,
}

/// Metric families that can be synced from Fitbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    Activity,
    Calories,
    ActiveMinutes,
    Sleep,
    HeartRate,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 5] = [
        MetricFamily::Activity,
        MetricFamily::Calories,
        MetricFamily::ActiveMinutes,
        MetricFamily::Sleep,
        MetricFamily::HeartRate,
    ];
}

/// One day of metrics as reported by Fitbit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncedMetrics {
    pub activity: ActivityTotals,
    pub calories: u32,
    pub active_minutes: u32,
    pub sleep: SleepSummary,
    /// `None` when the heart-rate fetch failed or returned no value.
    pub resting_heart_rate: Option<u32>,
}

/// Which families a merge wrote and which it left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub written: Vec<MetricFamily>,
    pub skipped_manual: Vec<MetricFamily>,
}

impl MergeOutcome {
    fn record(&mut self, family: MetricFamily, written: bool) {
        if written {
            self.written.push(family);
        } else {
            self.skipped_manual.push(family);
        }
    }
}

/// Per-user, per-day wellness document.
///
/// Stored at: `users/{uid}/dailyProgress/{YYYY-MM-DD}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,

    // ─── Synced families ─────────────────────────────────────────
    #[serde(default)]
    pub activity: Tracked<ActivityTotals>,
    #[serde(default)]
    pub calories: Tracked<u32>,
    #[serde(default)]
    pub active_minutes: Tracked<u32>,
    #[serde(default)]
    pub sleep: Tracked<SleepSummary>,
    #[serde(default)]
    pub resting_heart_rate: Tracked<Option<u32>>,

    // ─── Manual-only trackers ────────────────────────────────────
    /// Glasses of water
    #[serde(default)]
    pub water_intake: u32,
    #[serde(default)]
    pub mindfulness_minutes: u32,
    #[serde(default)]
    pub screen_time_hours: f64,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,

    // ─── Metadata ────────────────────────────────────────────────
    #[serde(default)]
    pub sync_status: Option<SyncStatus>,
    #[serde(default)]
    pub updated_at: String,
}

impl DailyProgress {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            activity: Tracked::default(),
            calories: Tracked::default(),
            active_minutes: Tracked::default(),
            sleep: Tracked::default(),
            resting_heart_rate: Tracked::default(),
            water_intake: 0,
            mindfulness_minutes: 0,
            screen_time_hours: 0.0,
            mood: None,
            journal: None,
            sync_status: None,
            updated_at: String::new(),
        }
    }

    pub fn source_of(&self, family: MetricFamily) -> Option<MetricSource> {
        match family {
            MetricFamily::Activity => self.activity.source,
            MetricFamily::Calories => self.calories.source,
            MetricFamily::ActiveMinutes => self.active_minutes.source,
            MetricFamily::Sleep => self.sleep.source,
            MetricFamily::HeartRate => self.resting_heart_rate.source,
        }
    }

    /// Merge a day of synced metrics, family by family.
    ///
    /// Manually locked families are skipped. `lastSynced` is updated
    /// regardless of how many families were written. A missing heart-rate
    /// value leaves that family untouched and is not counted either way.
    pub fn merge_synced(&mut self, metrics: &SyncedMetrics, synced_at: &str) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        outcome.record(
            MetricFamily::Activity,
            self.activity.apply_synced(metrics.activity.clone()),
        );
        outcome.record(
            MetricFamily::Calories,
            self.calories.apply_synced(metrics.calories),
        );
        outcome.record(
            MetricFamily::ActiveMinutes,
            self.active_minutes.apply_synced(metrics.active_minutes),
        );
        outcome.record(
            MetricFamily::Sleep,
            self.sleep.apply_synced(metrics.sleep.clone()),
        );
        if let Some(bpm) = metrics.resting_heart_rate {
            outcome.record(
                MetricFamily::HeartRate,
                self.resting_heart_rate.apply_synced(Some(bpm)),
            );
        }

        self.sync_status = Some(SyncStatus {
            last_synced: synced_at.to_string(),
        });
        self.updated_at = synced_at.to_string();

        outcome
    }

    /// Apply a user edit. Any synced family touched by the edit becomes
    /// manually locked; fields not present in the edit are left alone.
    pub fn apply_manual_edit(&mut self, edit: &ManualEdit, now: &str) {
        if edit.steps.is_some() || edit.distance_km.is_some() || edit.floors.is_some() {
            let mut totals = self.activity.value.clone();
            if let Some(steps) = edit.steps {
                totals.steps = steps;
            }
            if let Some(distance) = edit.distance_km {
                totals.distance_km = distance;
            }
            if let Some(floors) = edit.floors {
                totals.floors = floors;
            }
            self.activity.apply_manual(totals);
        }
        if let Some(calories) = edit.calories {
            self.calories.apply_manual(calories);
        }
        if let Some(minutes) = edit.active_minutes {
            self.active_minutes.apply_manual(minutes);
        }
        if let Some(hours) = edit.sleep_hours {
            let mut sleep = self.sleep.value.clone();
            sleep.hours = hours;
            self.sleep.apply_manual(sleep);
        }
        if let Some(bpm) = edit.resting_heart_rate {
            self.resting_heart_rate.apply_manual(Some(bpm));
        }

        if let Some(water) = edit.water_intake {
            self.water_intake = water;
        }
        if let Some(minutes) = edit.mindfulness_minutes {
            self.mindfulness_minutes = minutes;
        }
        if let Some(hours) = edit.screen_time_hours {
            self.screen_time_hours = hours;
        }
        if let Some(mood) = &edit.mood {
            self.mood = Some(mood.clone());
        }
        if let Some(journal) = &edit.journal {
            self.journal = Some(journal.clone());
        }

        self.updated_at = now.to_string();
    }

    /// Hand a family back to the sync. Returns whether it was locked.
    pub fn release_override(&mut self, family: MetricFamily) -> bool {
        match family {
            MetricFamily::Activity => self.activity.release(),
            MetricFamily::Calories => self.calories.release(),
            MetricFamily::ActiveMinutes => self.active_minutes.release(),
            MetricFamily::Sleep => self.sleep.release(),
            MetricFamily::HeartRate => self.resting_heart_rate.release(),
        }
    }

    /// Which daily goals this day meets.
    pub fn goal_checks(&self, goals: &GoalTargets) -> GoalChecks {
        GoalChecks {
            water_intake: f64::from(self.water_intake) >= goals.water_intake,
            activity_minutes: f64::from(self.active_minutes.value) >= goals.activity_minutes,
            sleep_hours: self.sleep.value.hours >= goals.sleep_hours,
            mindfulness_minutes: f64::from(self.mindfulness_minutes) >= goals.mindfulness_minutes,
            screen_time_hours: self.screen_time_hours >= goals.screen_time_hours,
        }
    }

    /// Count how many daily goals are met.
    pub fn goal_completion(&self, goals: &GoalTargets) -> GoalCompletion {
        let checks = self.goal_checks(goals).as_array();

        GoalCompletion {
            completed: checks.iter().filter(|met| **met).count() as u32,
            total: checks.len() as u32,
        }
    }
}

/// Per-goal result for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalChecks {
    pub water_intake: bool,
    pub activity_minutes: bool,
    pub sleep_hours: bool,
    pub mindfulness_minutes: bool,
    pub screen_time_hours: bool,
}

impl GoalChecks {
    pub fn as_array(&self) -> [bool; 5] {
        [
            self.water_intake,
            self.activity_minutes,
            self.sleep_hours,
            self.mindfulness_minutes,
            self.screen_time_hours,
        ]
    }
}

/// Goals met out of goals tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct GoalCompletion {
    pub completed: u32,
    pub total: u32,
}

/// A user's manual edit to a day. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct ManualEdit {
    #[validate(range(max = 200_000))]
    pub steps: Option<u32>,
    #[validate(range(min = 0.0, max = 500.0))]
    pub distance_km: Option<f64>,
    #[validate(range(max = 1_000))]
    pub floors: Option<u32>,
    #[validate(range(max = 20_000))]
    pub calories: Option<u32>,
    #[validate(range(max = 1_440))]
    pub active_minutes: Option<u32>,
    #[validate(range(min = 0.0, max = 24.0))]
    pub sleep_hours: Option<f64>,
    #[validate(range(min = 20, max = 250))]
    pub resting_heart_rate: Option<u32>,
    #[validate(range(max = 100))]
    pub water_intake: Option<u32>,
    #[validate(range(max = 1_440))]
    pub mindfulness_minutes: Option<u32>,
    #[validate(range(min = 0.0, max = 24.0))]
    pub screen_time_hours: Option<f64>,
    #[validate(length(max = 16))]
    pub mood: Option<String>,
    #[validate(length(max = 5000))]
    pub journal: Option<String>,
}
