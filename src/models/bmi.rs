// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Body-mass index readings and history entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// WHO adult BMI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obesity,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obesity
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        };
        f.write_str(label)
    }
}

/// Height and weight submitted for a BMI calculation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct BmiInput {
    #[validate(range(min = 50.0, max = 300.0))]
    pub height_cm: f64,
    #[validate(range(min = 2.0, max = 500.0))]
    pub weight_kg: f64,
}

/// Healthy weight band for a given height, in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

/// A computed BMI with its category and the healthy range for the height.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[serde(rename_all = "camelCase")]
pub struct BmiReading {
    pub bmi: f64,
    pub category: BmiCategory,
    pub category_label: String,
    pub healthy_range: WeightRange,
}

impl BmiReading {
    pub fn calculate(input: &BmiInput) -> Self {
        let height_m = input.height_cm / 100.0;
        let bmi = round_to(input.weight_kg / (height_m * height_m), 2);
        let category = BmiCategory::from_bmi(bmi);

        Self {
            bmi,
            category,
            category_label: category.to_string(),
            healthy_range: WeightRange {
                min: round_to(18.5 * height_m * height_m, 1),
                max: round_to(24.9 * height_m * height_m, 1),
            },
        }
    }
}

/// One stored BMI result.
///
/// Stored at: `users/{uid}/bmiHistory/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct BmiEntry {
    pub id: String,
    pub bmi: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub category: BmiCategory,
    /// RFC3339; history is ordered by this field
    pub timestamp: String,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
