//! Meal diary and AI nutrition estimates

mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assistant::{meal_prompt, Assistant};
use crate::error::{Error, Result};
use crate::profile::DiabetesType;
use crate::storage;

/// Meals in insertion order. Entries are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealDiary {
    entries: Vec<MealLog>,
}

impl MealDiary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MealLog] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Meals newest first, as listed in the history
    pub fn newest_first(&self) -> impl Iterator<Item = &MealLog> {
        self.entries.iter().rev()
    }

    pub(crate) fn append(
        &mut self,
        description: &str,
        analysis: &MealAnalysis,
        timestamp: DateTime<Utc>,
    ) -> &MealLog {
        self.entries.push(MealLog {
            id: Uuid::new_v4().to_string(),
            timestamp,
            description: description.to_string(),
            calories: Some(analysis.calories),
            carbs: Some(analysis.carbs),
            glycemic_index: Some(analysis.glycemic_index),
            advice: Some(analysis.advice.clone()),
        });
        &self.entries[self.entries.len() - 1]
    }
}

/// Asks the assistant for an estimate of `description`.
///
/// Any remote failure is logged and reported as `None`; a single attempt
/// is made.
pub async fn analyze_meal(
    assistant: &dyn Assistant,
    description: &str,
    diabetes_type: DiabetesType,
) -> Result<Option<MealAnalysis>> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::validation("meal description cannot be empty"));
    }

    match assistant
        .analyze_meal(&meal_prompt(description, diabetes_type))
        .await
    {
        Ok(analysis) => {
            debug!(
                "meal analysis: {} kcal, {} g carbs, GI {}",
                analysis.calories, analysis.carbs, analysis.glycemic_index
            );
            Ok(Some(analysis))
        }
        Err(e) => {
            error!("Meal analysis error: {}", e);
            Ok(None)
        }
    }
}

/// An analysis waiting for the user to log it
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMeal {
    pub description: String,
    pub analysis: MealAnalysis,
}

/// Analyze-then-confirm flow of the nutrition screen
#[derive(Debug, Default)]
pub struct NutritionTracker {
    pending: Option<PendingMeal>,
}

impl NutritionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingMeal> {
        self.pending.as_ref()
    }

    /// Replaces any pending analysis with a fresh one. Returns `None` when
    /// the assistant gave no usable estimate.
    pub async fn analyze(
        &mut self,
        assistant: &dyn Assistant,
        description: &str,
        diabetes_type: DiabetesType,
    ) -> Result<Option<&PendingMeal>> {
        let analysis = analyze_meal(assistant, description, diabetes_type).await?;
        self.pending = analysis.map(|analysis| PendingMeal {
            description: description.trim().to_string(),
            analysis,
        });
        Ok(self.pending.as_ref())
    }

    /// Logs the pending analysis to `diary`. Without one nothing happens.
    pub fn confirm(&mut self, diary: &mut MealDiary) -> Option<MealLog> {
        self.confirm_at(diary, storage::now())
    }

    pub fn confirm_at(
        &mut self,
        diary: &mut MealDiary,
        timestamp: DateTime<Utc>,
    ) -> Option<MealLog> {
        let pending = self.pending.take()?;
        Some(diary.append(&pending.description, &pending.analysis, timestamp).clone())
    }

    /// Drops the pending analysis without logging it
    pub fn discard(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantChat;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAssistant {
        reply: Option<MealAnalysis>,
        calls: AtomicUsize,
    }

    impl ScriptedAssistant {
        fn answering(reply: Option<MealAnalysis>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Assistant for ScriptedAssistant {
        fn start_chat(&self, _system_instruction: &str) -> Box<dyn AssistantChat> {
            unreachable!("chat is not used by the nutrition tracker")
        }

        async fn analyze_meal(&self, prompt: &str) -> Result<MealAnalysis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("Type 2"));
            self.reply
                .clone()
                .ok_or_else(|| Error::general("network unreachable"))
        }
    }

    fn oatmeal() -> MealAnalysis {
        MealAnalysis {
            calories: 300,
            carbs: 54,
            glycemic_index: GlycemicCategory::Medium,
            advice: "Add some protein.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_analyze_then_confirm_appends_meal() {
        let assistant = ScriptedAssistant::answering(Some(oatmeal()));
        let mut tracker = NutritionTracker::new();
        let mut diary = MealDiary::new();

        let pending = tracker
            .analyze(&assistant, "  oatmeal with banana ", DiabetesType::Type2)
            .await
            .unwrap()
            .cloned()
            .unwrap();
        assert_eq!(pending.description, "oatmeal with banana");

        let meal = tracker.confirm(&mut diary).unwrap();
        assert_eq!(meal.calories, Some(300));
        assert_eq!(meal.glycemic_index, Some(GlycemicCategory::Medium));
        assert_eq!(diary.len(), 1);
        assert!(tracker.pending().is_none());
    }

    #[tokio::test]
    async fn test_failed_analysis_appends_nothing() {
        let assistant = ScriptedAssistant::answering(None);
        let mut tracker = NutritionTracker::new();
        let mut diary = MealDiary::new();

        let result = tracker
            .analyze(&assistant, "pizza", DiabetesType::Type2)
            .await;
        assert!(matches!(result, Ok(None)));
        assert!(tracker.confirm(&mut diary).is_none());
        assert!(diary.is_empty());
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_description_makes_no_request() {
        let assistant = ScriptedAssistant::answering(Some(oatmeal()));
        let mut tracker = NutritionTracker::new();

        let result = tracker.analyze(&assistant, "   ", DiabetesType::Type2).await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_clears_previous_pending() {
        let mut tracker = NutritionTracker::new();
        let ok = ScriptedAssistant::answering(Some(oatmeal()));
        tracker.analyze(&ok, "oatmeal", DiabetesType::Type2).await.unwrap();
        assert!(tracker.pending().is_some());

        let failing = ScriptedAssistant::answering(None);
        tracker.analyze(&failing, "cake", DiabetesType::Type2).await.unwrap();
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn test_meal_serialized_shape() {
        let mut diary = MealDiary::new();
        let mut tracker = NutritionTracker {
            pending: Some(PendingMeal {
                description: "oatmeal".to_string(),
                analysis: oatmeal(),
            }),
        };
        tracker.confirm(&mut diary);
        let value = serde_json::to_value(&diary).unwrap();
        assert_eq!(value[0]["glycemicIndex"], "Medium");
        assert_eq!(value[0]["carbs"], 54);
        assert_eq!(value[0]["description"], "oatmeal");
    }

    #[test]
    fn test_meal_without_estimate_deserializes() {
        let diary: MealDiary = serde_json::from_str(
            r#"[{"id":"1","timestamp":1700000000000,"description":"tea"}]"#,
        )
        .unwrap();
        let meal = &diary.entries()[0];
        assert!(meal.calories.is_none());
        assert!(meal.glycemic_index.is_none());
    }
}
