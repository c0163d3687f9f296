//! Types for the user profile

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Diagnosed condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiabetesType {
    #[serde(rename = "Type 1")]
    Type1,
    #[serde(rename = "Type 2")]
    Type2,
    #[serde(rename = "Gestational")]
    Gestational,
    #[serde(rename = "Pre-Diabetes")]
    PreDiabetes,
    #[serde(rename = "None (Healthy/At Risk)")]
    None,
}

impl DiabetesType {
    pub const ALL: [DiabetesType; 5] = [
        DiabetesType::Type1,
        DiabetesType::Type2,
        DiabetesType::Gestational,
        DiabetesType::PreDiabetes,
        DiabetesType::None,
    ];

    /// Convert the type to its display string
    pub fn as_str(&self) -> &'static str {
        match self {
            DiabetesType::Type1 => "Type 1",
            DiabetesType::Type2 => "Type 2",
            DiabetesType::Gestational => "Gestational",
            DiabetesType::PreDiabetes => "Pre-Diabetes",
            DiabetesType::None => "None (Healthy/At Risk)",
        }
    }

    /// Parse a display string or a short form such as `type1` or `pre`
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "type1" | "t1" | "1" => Some(DiabetesType::Type1),
            "type2" | "t2" | "2" => Some(DiabetesType::Type2),
            "gestational" => Some(DiabetesType::Gestational),
            "prediabetes" | "pre" => Some(DiabetesType::PreDiabetes),
            "none" | "nonehealthyatrisk" => Some(DiabetesType::None),
            _ => Option::None,
        }
    }
}

impl fmt::Display for DiabetesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" | "o" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single user profile of an install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name
    pub name: String,

    /// Age in years
    #[serde(default = "default_age", deserialize_with = "age_or_default")]
    pub age: u32,

    pub gender: Gender,

    /// Weight in kg
    #[serde(default = "default_weight", deserialize_with = "weight_or_default")]
    pub weight: f64,

    /// Height in cm
    #[serde(default = "default_height", deserialize_with = "height_or_default")]
    pub height: f64,

    /// Diagnosed condition
    pub diabetes_type: DiabetesType,

    /// Current medications, unordered
    pub medications: Vec<String>,

    /// Name of the emergency contact
    pub emergency_contact_name: String,

    /// Phone number of the emergency contact, may be empty
    pub emergency_contact_phone: String,
}

const DEFAULT_AGE: u32 = 45;
const DEFAULT_WEIGHT: f64 = 70.0;
const DEFAULT_HEIGHT: f64 = 165.0;

fn default_age() -> u32 {
    DEFAULT_AGE
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

// A cleared number field is stored as `null`.

fn age_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(DEFAULT_AGE))
}

fn weight_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_WEIGHT))
}

fn height_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_HEIGHT))
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            age: DEFAULT_AGE,
            gender: Gender::Female,
            weight: DEFAULT_WEIGHT,
            height: DEFAULT_HEIGHT,
            diabetes_type: DiabetesType::Type2,
            medications: vec!["Metformin".to_string()],
            emergency_contact_name: "Dr. Smith".to_string(),
            emergency_contact_phone: String::new(),
        }
    }
}

impl UserProfile {
    /// Medications joined for display, `None listed` when empty
    pub fn medications_display(&self) -> String {
        if self.medications.is_empty() {
            "None listed".to_string()
        } else {
            self.medications.join(", ")
        }
    }

    pub fn has_emergency_phone(&self) -> bool {
        !self.emergency_contact_phone.trim().is_empty()
    }
}
