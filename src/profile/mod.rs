//! User profile and the draft used to edit it

mod types;

pub use types::*;

use crate::error::{Error, Result};

/// Editable copy of a profile. Nothing changes in the store until the
/// draft is handed to [`crate::app::AppState::save_profile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    profile: UserProfile,
}

impl ProfileDraft {
    pub fn new(profile: &UserProfile) -> Self {
        Self {
            profile: profile.clone(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn into_profile(self) -> UserProfile {
        self.profile
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name cannot be empty"));
        }
        self.profile.name = name.to_string();
        Ok(())
    }

    pub fn set_age(&mut self, age: u32) -> Result<()> {
        if age == 0 || age > 130 {
            return Err(Error::validation(format!("age out of range: {}", age)));
        }
        self.profile.age = age;
        Ok(())
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.profile.gender = gender;
    }

    /// Weight in kg
    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::validation(format!("invalid weight: {}", weight)));
        }
        self.profile.weight = weight;
        Ok(())
    }

    /// Height in cm
    pub fn set_height(&mut self, height: f64) -> Result<()> {
        if !height.is_finite() || height <= 0.0 {
            return Err(Error::validation(format!("invalid height: {}", height)));
        }
        self.profile.height = height;
        Ok(())
    }

    pub fn set_diabetes_type(&mut self, diabetes_type: DiabetesType) {
        self.profile.diabetes_type = diabetes_type;
    }

    pub fn set_emergency_contact(&mut self, name: &str, phone: &str) {
        self.profile.emergency_contact_name = name.trim().to_string();
        self.profile.emergency_contact_phone = phone.trim().to_string();
    }

    /// Appends a trimmed medication. Blank input is ignored and returns false.
    pub fn add_medication(&mut self, medication: &str) -> bool {
        let medication = medication.trim();
        if medication.is_empty() {
            return false;
        }
        self.profile.medications.push(medication.to_string());
        true
    }

    /// Removes the medication at `index`; out of range is a no-op.
    pub fn remove_medication(&mut self, index: usize) -> Option<String> {
        if index < self.profile.medications.len() {
            Some(self.profile.medications.remove(index))
        } else {
            None
        }
    }
}
