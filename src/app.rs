//! Top-level application state
//!
//! [`AppState`] owns every entity. Each mutation persists the changed value
//! right away and, when the profile or the vitals change, re-primes the
//! conversation before anything else can be sent.

use chrono::{DateTime, Local};
use log::{debug, info};
use std::fmt;
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::config::AppOptions;
use crate::conversation::{Conversation, TurnOutcome};
use crate::dashboard::Dashboard;
use crate::emergency::EmergencyMode;
use crate::error::{Error, Result};
use crate::nutrition::{MealDiary, MealLog, NutritionTracker, PendingMeal};
use crate::profile::{ProfileDraft, UserProfile};
use crate::speech::{SpeechInput, SpeechOutput};
use crate::storage::{self, KeyValueStore, MEALS_KEY, PROFILE_KEY, VITALS_KEY};
use crate::vitals::{NewReading, ReadingContext, VitalLog, VitalsLog};

/// Primary views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Chat,
    Nutrition,
    Profile,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Chat, View::Nutrition, View::Profile];

    /// Label used in the navigation bar
    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Today",
            View::Chat => "Voice",
            View::Nutrition => "Food",
            View::Profile => "Me",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct AppState {
    store: Box<dyn KeyValueStore>,
    assistant: Arc<dyn Assistant>,
    profile: UserProfile,
    vitals: VitalsLog,
    meals: MealDiary,
    conversation: Conversation,
    nutrition: NutritionTracker,
    speech_out: SpeechOutput,
    speech_in: SpeechInput,
    view: View,
    emergency: Option<EmergencyMode>,
}

impl AppState {
    /// Loads the persisted state, falling back to defaults for anything
    /// absent or malformed, and primes the conversation.
    pub fn load(
        store: Box<dyn KeyValueStore>,
        assistant: Arc<dyn Assistant>,
        speech_out: SpeechOutput,
        speech_in: SpeechInput,
        options: &AppOptions,
    ) -> Self {
        let profile: UserProfile = storage::load_or_default(store.as_ref(), PROFILE_KEY);
        let vitals: VitalsLog = storage::load_or_default(store.as_ref(), VITALS_KEY);
        let meals: MealDiary = storage::load_or_default(store.as_ref(), MEALS_KEY);
        info!(
            "loaded profile for {}, {} readings, {} meals",
            profile.name,
            vitals.len(),
            meals.len()
        );

        let mut conversation = Conversation::new(&profile, options.fallback_reply.clone());
        conversation.prime(assistant.as_ref(), &profile, &vitals);

        Self {
            store,
            assistant,
            profile,
            vitals,
            meals,
            conversation,
            nutrition: NutritionTracker::new(),
            speech_out,
            speech_in,
            view: View::Dashboard,
            emergency: None,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn vitals(&self) -> &VitalsLog {
        &self.vitals
    }

    pub fn meals(&self) -> &MealDiary {
        &self.meals
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn pending_meal(&self) -> Option<&PendingMeal> {
        self.nutrition.pending()
    }

    // Navigation

    pub fn view(&self) -> View {
        self.view
    }

    pub fn navigate(&mut self, view: View) {
        debug!("view -> {:?}", view);
        self.view = view;
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.is_some()
    }

    /// Opens the overlay on top of the current view
    pub fn enter_emergency(&mut self, muted: bool) {
        let mode = EmergencyMode::new(muted);
        mode.enter(&mut self.speech_out);
        self.emergency = Some(mode);
    }

    pub fn set_emergency_muted(&mut self, muted: bool) -> Result<()> {
        let mode = self
            .emergency
            .as_mut()
            .ok_or_else(|| Error::general("emergency mode is not active"))?;
        mode.set_muted(muted, &mut self.speech_out);
        Ok(())
    }

    /// Closes the overlay and returns to the view that was open
    pub fn exit_emergency(&mut self) {
        if let Some(mode) = self.emergency.take() {
            mode.exit(&mut self.speech_out);
        }
    }

    // Profile

    pub fn edit_profile(&self) -> ProfileDraft {
        ProfileDraft::new(&self.profile)
    }

    /// Overwrites the profile wholesale. Nothing changes when it cannot be
    /// stored.
    pub fn save_profile(&mut self, draft: ProfileDraft) -> Result<()> {
        let profile = draft.into_profile();
        storage::save(self.store.as_ref(), PROFILE_KEY, &profile)?;
        self.profile = profile;
        self.reprime();
        Ok(())
    }

    // Vitals

    /// Appends a reading. Nothing changes when it cannot be stored.
    pub fn add_vital(&mut self, reading: NewReading) -> Result<VitalLog> {
        let mut vitals = self.vitals.clone();
        let entry = vitals.append(reading)?.clone();
        storage::save(self.store.as_ref(), VITALS_KEY, &vitals)?;
        self.vitals = vitals;
        self.reprime();
        Ok(entry)
    }

    /// Records a reading from raw form input
    pub fn log_vital(
        &mut self,
        level: &str,
        context: ReadingContext,
        notes: &str,
    ) -> Result<VitalLog> {
        let blood_sugar = VitalsLog::parse_glucose(level)?;
        self.add_vital(NewReading::new(blood_sugar, context).with_notes(notes))
    }

    pub fn dashboard(&self, now: DateTime<Local>) -> Dashboard {
        Dashboard::build(&self.vitals, now)
    }

    // Nutrition

    /// Runs a meal analysis and keeps it pending until confirmed
    pub async fn analyze_meal(&mut self, description: &str) -> Result<Option<PendingMeal>> {
        let pending = self
            .nutrition
            .analyze(self.assistant.as_ref(), description, self.profile.diabetes_type)
            .await?;
        Ok(pending.cloned())
    }

    /// Logs the pending analysis to the diary. When the diary cannot be
    /// stored the analysis stays pending.
    pub fn confirm_meal(&mut self) -> Result<Option<MealLog>> {
        let pending = match self.nutrition.pending() {
            Some(pending) => pending.clone(),
            None => return Ok(None),
        };
        let mut meals = self.meals.clone();
        let meal = meals
            .append(&pending.description, &pending.analysis, storage::now())
            .clone();
        storage::save(self.store.as_ref(), MEALS_KEY, &meals)?;
        self.meals = meals;
        self.nutrition.discard();
        Ok(Some(meal))
    }

    pub fn discard_meal(&mut self) {
        self.nutrition.discard();
    }

    // Conversation

    /// Sends a typed message and speaks the reply
    pub async fn send_message(&mut self, text: &str) -> Result<TurnOutcome> {
        let outcome = self
            .conversation
            .submit(self.assistant.as_ref(), &self.profile, &self.vitals, text)
            .await?;
        if let Some(reply) = outcome.reply() {
            self.speech_out.speak_reply(&reply.text);
        }
        Ok(outcome)
    }

    /// Listens once and submits whatever was heard. `None` when nothing
    /// was recognized.
    pub async fn send_voice_message(&mut self) -> Result<Option<TurnOutcome>> {
        match self.speech_in.listen().await? {
            Some(transcript) => Ok(Some(self.send_message(&transcript).await?)),
            None => Ok(None),
        }
    }

    pub fn voice_supported(&self) -> bool {
        self.speech_in.is_supported()
    }

    pub fn voice_enabled(&self) -> bool {
        self.speech_out.is_enabled()
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.speech_out.set_enabled(enabled);
    }

    fn reprime(&mut self) {
        self.conversation.prime(self.assistant.as_ref(), &self.profile, &self.vitals);
    }
}
