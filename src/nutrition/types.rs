//! Types for meals and their nutrition estimates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How quickly a food raises blood glucose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlycemicCategory {
    Low,
    Medium,
    High,
}

impl GlycemicCategory {
    pub const ALL: [GlycemicCategory; 3] = [
        GlycemicCategory::Low,
        GlycemicCategory::Medium,
        GlycemicCategory::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlycemicCategory::Low => "Low",
            GlycemicCategory::Medium => "Medium",
            GlycemicCategory::High => "High",
        }
    }
}

impl fmt::Display for GlycemicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured estimate returned by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    /// Estimated calories
    pub calories: u32,

    /// Estimated carbohydrates in grams
    pub carbs: u32,

    /// Glycemic index category
    pub glycemic_index: GlycemicCategory,

    /// Short advice for a diabetic regarding this meal
    pub advice: String,
}

/// A meal in the diary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLog {
    /// Unique identifier
    pub id: String,

    /// When the meal was logged
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// What the user ate, as typed
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,

    /// Grams of carbohydrate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_index: Option<GlycemicCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}
