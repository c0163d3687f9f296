//! Types for glucose readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the normal range in mg/dL; values below are Low
pub const LOW_THRESHOLD: u32 = 70;
/// Upper bound of the normal range in mg/dL; values above are High
pub const HIGH_THRESHOLD: u32 = 180;

/// When the reading was taken relative to a meal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingContext {
    Fasting,
    #[serde(rename = "Post-Meal")]
    PostMeal,
    #[default]
    Random,
}

impl ReadingContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingContext::Fasting => "Fasting",
            ReadingContext::PostMeal => "Post-Meal",
            ReadingContext::Random => "Random",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "fasting" => Some(ReadingContext::Fasting),
            "postmeal" => Some(ReadingContext::PostMeal),
            "random" => Some(ReadingContext::Random),
            _ => None,
        }
    }
}

impl fmt::Display for ReadingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a glucose value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseStatus {
    Low,
    Normal,
    High,
}

impl GlucoseStatus {
    /// Low below 70, High above 180, Normal otherwise (both bounds inclusive)
    pub fn classify(blood_sugar: u32) -> Self {
        if blood_sugar < LOW_THRESHOLD {
            GlucoseStatus::Low
        } else if blood_sugar > HIGH_THRESHOLD {
            GlucoseStatus::High
        } else {
            GlucoseStatus::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseStatus::Low => "Low",
            GlucoseStatus::Normal => "Normal",
            GlucoseStatus::High => "High",
        }
    }
}

impl fmt::Display for GlucoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded glucose reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalLog {
    /// Unique identifier
    pub id: String,

    /// When the reading was recorded
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Glucose in mg/dL
    pub blood_sugar: u32,

    pub context: ReadingContext,

    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VitalLog {
    pub fn status(&self) -> GlucoseStatus {
        GlucoseStatus::classify(self.blood_sugar)
    }
}

/// A reading as entered, before it gets an id and a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub blood_sugar: u32,
    pub context: ReadingContext,
    pub notes: Option<String>,
}

impl NewReading {
    pub fn new(blood_sugar: u32, context: ReadingContext) -> Self {
        Self {
            blood_sugar,
            context,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        let notes = notes.trim();
        self.notes = if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        };
        self
    }
}
