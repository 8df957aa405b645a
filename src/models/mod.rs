// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod bmi;
pub mod credential;
pub mod profile;
pub mod progress;
pub mod summary;

pub use bmi::{BmiCategory, BmiEntry, BmiReading};
pub use credential::{CredentialRecord, TokenResponse};
pub use profile::{ActivityLevel, Gender, GoalTargets, ProfileUpdate, UserProfile};
pub use progress::{
    DailyProgress, GoalChecks, ManualEdit, MergeOutcome, MetricFamily, MetricSource,
    SyncedMetrics, Tracked,
};
pub use summary::WeeklySummary;
