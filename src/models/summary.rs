// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly summary read model.
//!
//! Built on request from the stored daily records of the last seven days;
//! nothing here is persisted. Averages are taken over the days that have a
//! record, not over all seven.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::bmi::round_to;
use crate::models::{BmiEntry, DailyProgress, GoalTargets};

/// Days in the summary window, ending on the given date.
pub const SUMMARY_DAYS: u32 = 7;

/// How many days in the window met each goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct GoalAdherence {
    pub water_intake: u32,
    pub activity_minutes: u32,
    pub sleep_hours: u32,
    pub mindfulness_minutes: u32,
    pub screen_time_hours: u32,
}

impl GoalAdherence {
    fn total(&self) -> u32 {
        self.water_intake
            + self.activity_minutes
            + self.sleep_hours
            + self.mindfulness_minutes
            + self.screen_time_hours
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct MoodCount {
    pub mood: String,
    pub count: u32,
}

/// Summary of one week of tracking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days in the window with a stored record
    pub days_tracked: u32,

    // ─── Goals ───────────────────────────────────────────────────
    pub total_goals_met: u32,
    pub goal_adherence: GoalAdherence,

    // ─── Averages ────────────────────────────────────────────────
    /// Minutes, whole
    pub avg_activity_minutes: f64,
    /// Hours, one decimal
    pub avg_sleep_hours: f64,
    /// Glasses, one decimal
    pub avg_water_intake: f64,

    // ─── Journal & Mood ──────────────────────────────────────────
    pub journal_entries: u32,
    /// Most frequent first; ties in mood order
    pub moods: Vec<MoodCount>,
    pub dominant_mood: Option<MoodCount>,

    /// BMI entries recorded within the window, oldest first
    pub bmi_entries: Vec<BmiEntry>,
}

impl WeeklySummary {
    /// Aggregate `days` (records dated `start..=end`) against `goals`.
    /// `bmi_history` may hold entries outside the window; they are dropped.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        days: &[DailyProgress],
        goals: &GoalTargets,
        bmi_history: Vec<BmiEntry>,
    ) -> Self {
        let mut adherence = GoalAdherence::default();
        let mut total_activity = 0.0;
        let mut total_sleep = 0.0;
        let mut total_water = 0.0;
        let mut journal_entries = 0;
        let mut mood_counts: BTreeMap<&str, u32> = BTreeMap::new();

        for day in days {
            let checks = day.goal_checks(goals);
            adherence.water_intake += u32::from(checks.water_intake);
            adherence.activity_minutes += u32::from(checks.activity_minutes);
            adherence.sleep_hours += u32::from(checks.sleep_hours);
            adherence.mindfulness_minutes += u32::from(checks.mindfulness_minutes);
            adherence.screen_time_hours += u32::from(checks.screen_time_hours);

            total_activity += f64::from(day.active_minutes.value);
            total_sleep += day.sleep.value.hours;
            total_water += f64::from(day.water_intake);

            if day.journal.as_deref().is_some_and(|j| !j.trim().is_empty()) {
                journal_entries += 1;
            }
            if let Some(mood) = day.mood.as_deref().filter(|m| !m.is_empty()) {
                *mood_counts.entry(mood).or_default() += 1;
            }
        }

        let mut moods: Vec<MoodCount> = mood_counts
            .into_iter()
            .map(|(mood, count)| MoodCount {
                mood: mood.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps mood order among equal counts
        moods.sort_by(|a, b| b.count.cmp(&a.count));

        let tracked = days.len().max(1) as f64;

        Self {
            start,
            end,
            days_tracked: days.len() as u32,
            total_goals_met: adherence.total(),
            goal_adherence: adherence,
            avg_activity_minutes: round_to(total_activity / tracked, 0),
            avg_sleep_hours: round_to(total_sleep / tracked, 1),
            avg_water_intake: round_to(total_water / tracked, 1),
            journal_entries,
            dominant_mood: moods.first().cloned(),
            moods,
            bmi_entries: bmi_history
                .into_iter()
                .filter(|entry| {
                    DateTime::parse_from_rfc3339(&entry.timestamp)
                        .map(|ts| (start..=end).contains(&ts.date_naive()))
                        .unwrap_or(false)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BmiCategory, ManualEdit};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn edited(d: u32, edit: ManualEdit) -> DailyProgress {
        let mut progress = DailyProgress::new(day(d));
        progress.apply_manual_edit(&edit, "2024-05-07T12:00:00Z");
        progress
    }

    fn bmi(id: &str, timestamp: &str) -> BmiEntry {
        BmiEntry {
            id: id.to_string(),
            bmi: 22.5,
            height_cm: 175.0,
            weight_kg: 69.0,
            category: BmiCategory::NormalWeight,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_empty_week() {
        let summary = WeeklySummary::build(day(1), day(7), &[], &GoalTargets::default(), vec![]);
        assert_eq!(summary.days_tracked, 0);
        assert_eq!(summary.total_goals_met, 0);
        assert_eq!(summary.avg_sleep_hours, 0.0);
        assert_eq!(summary.dominant_mood, None);
    }

    #[test]
    fn test_adherence_and_averages() {
        let days = vec![
            edited(
                1,
                ManualEdit {
                    water_intake: Some(8),
                    active_minutes: Some(40),
                    sleep_hours: Some(7.0),
                    mood: Some("🙂".to_string()),
                    journal: Some("good run".to_string()),
                    ..Default::default()
                },
            ),
            edited(
                3,
                ManualEdit {
                    water_intake: Some(5),
                    active_minutes: Some(31),
                    sleep_hours: Some(8.5),
                    mood: Some("😔".to_string()),
                    ..Default::default()
                },
            ),
            edited(
                4,
                ManualEdit {
                    water_intake: Some(10),
                    sleep_hours: Some(6.2),
                    mood: Some("🙂".to_string()),
                    journal: Some("   ".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let summary =
            WeeklySummary::build(day(1), day(7), &days, &GoalTargets::default(), vec![]);

        assert_eq!(summary.days_tracked, 3);
        assert_eq!(summary.goal_adherence.water_intake, 2);
        assert_eq!(summary.goal_adherence.activity_minutes, 2);
        assert_eq!(summary.goal_adherence.sleep_hours, 1);
        assert_eq!(summary.goal_adherence.mindfulness_minutes, 0);
        assert_eq!(summary.total_goals_met, 5);
        // (40 + 31 + 0) / 3
        assert_eq!(summary.avg_activity_minutes, 24.0);
        // (7.0 + 8.5 + 6.2) / 3
        assert_eq!(summary.avg_sleep_hours, 7.2);
        assert_eq!(summary.avg_water_intake, 7.7);
        assert_eq!(summary.journal_entries, 1);
        assert_eq!(
            summary.dominant_mood,
            Some(MoodCount {
                mood: "🙂".to_string(),
                count: 2
            })
        );
        assert_eq!(summary.moods.len(), 2);
    }

    #[test]
    fn test_custom_goals_change_adherence() {
        let days = vec![edited(
            2,
            ManualEdit {
                water_intake: Some(5),
                ..Default::default()
            },
        )];
        let goals = GoalTargets {
            water_intake: 4.0,
            ..Default::default()
        };

        let summary = WeeklySummary::build(day(1), day(7), &days, &goals, vec![]);
        assert_eq!(summary.goal_adherence.water_intake, 1);
    }

    #[test]
    fn test_bmi_entries_outside_window_are_dropped() {
        let history = vec![
            bmi("old", "2024-04-30T23:00:00Z"),
            bmi("first", "2024-05-01T00:00:00Z"),
            bmi("last", "2024-05-07T22:00:00Z"),
            bmi("later", "2024-05-08T00:00:00Z"),
            bmi("garbled", "yesterday"),
        ];

        let summary =
            WeeklySummary::build(day(1), day(7), &[], &GoalTargets::default(), history);
        let ids: Vec<&str> = summary.bmi_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "last"]);
    }
}
