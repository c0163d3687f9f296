//! The AI capability behind the chat and the meal analysis
//!
//! [`Assistant`] is the seam between the application and the generative
//! API. [`afya_genai::GenAiClient`] implements it over HTTP; tests plug in
//! scripted implementations.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;

use afya_genai::{ChatSession, GenAiClient, Schema};

use crate::error::Result;
use crate::nutrition::{GlycemicCategory, MealAnalysis};
use crate::profile::{DiabetesType, UserProfile};
use crate::vitals::VitalsLog;

/// Number of readings included in the context primer
pub const PRIMER_VITALS: usize = 3;

pub const SYSTEM_INSTRUCTION: &str = "\
You are AFYA, a compassionate, specialized AI health assistant for people with diabetes.
Your goal is to help users manage their condition, provide nutrition/exercise advice, and support healthy habits.

CRITICAL SAFETY RULES:
1. You are NOT a doctor. Do not provide medical diagnoses or prescribe medication.
2. Always advise the user to consult a healthcare professional for serious concerns.
3. If a user reports blood sugar < 70 mg/dL (Hypoglycemia) or > 300 mg/dL (Hyperglycemia) with symptoms like confusion, fainting, or rapid breathing, strongly advise them to seek IMMEDIATE emergency medical help.
4. Be empathetic, encouraging, and clear.

CONTEXT AWARENESS:
Use the provided user profile and recent vitals to tailor your advice (e.g., specific advice for Type 1 vs Type 2).

TONE:
Supportive, knowledgeable, calm, and motivating.
";

/// One remote conversation
#[async_trait]
pub trait AssistantChat: Send {
    /// Sends a user message and returns the reply text
    async fn send(&mut self, message: &str) -> Result<String>;
}

/// The remote AI capability
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Opens a new remote conversation with an empty history
    fn start_chat(&self, system_instruction: &str) -> Box<dyn AssistantChat>;

    /// One-shot structured estimate for `prompt`
    async fn analyze_meal(&self, prompt: &str) -> Result<MealAnalysis>;
}

#[async_trait]
impl AssistantChat for ChatSession {
    async fn send(&mut self, message: &str) -> Result<String> {
        Ok(self.send_message(message).await?)
    }
}

#[async_trait]
impl Assistant for GenAiClient {
    fn start_chat(&self, system_instruction: &str) -> Box<dyn AssistantChat> {
        Box::new(GenAiClient::start_chat(self, system_instruction))
    }

    async fn analyze_meal(&self, prompt: &str) -> Result<MealAnalysis> {
        Ok(self.generate_json::<MealAnalysis>(prompt, meal_schema()).await?)
    }
}

/// Output schema for meal analysis
pub fn meal_schema() -> Schema {
    Schema::object()
        .property(
            "calories",
            Schema::integer().with_description("Estimated calories"),
        )
        .property(
            "carbs",
            Schema::integer().with_description("Estimated carbohydrates in grams"),
        )
        .property(
            "glycemicIndex",
            Schema::string_enum(GlycemicCategory::ALL.iter().map(|c| c.as_str()))
                .with_description("Glycemic index category"),
        )
        .property(
            "advice",
            Schema::string()
                .with_description("Brief health advice for a diabetic regarding this meal"),
        )
        .with_required(["calories", "carbs", "glycemicIndex", "advice"])
}

pub fn meal_prompt(description: &str, diabetes_type: DiabetesType) -> String {
    format!(
        "Analyze this meal for a patient with {}: \"{}\". Estimate values.",
        diabetes_type, description
    )
}

/// Local time as shown in the primer and the history lists
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Profile summary plus the most recent readings, newest first
pub fn context_primer(profile: &UserProfile, vitals: &VitalsLog) -> String {
    let mut primer = String::new();
    let _ = writeln!(primer, "User Profile:");
    let _ = writeln!(primer, "Name: {}", profile.name);
    let _ = writeln!(primer, "Age: {}", profile.age);
    let _ = writeln!(primer, "Type: {}", profile.diabetes_type);
    let _ = writeln!(primer, "Meds: {}", profile.medications.join(", "));
    let _ = writeln!(primer);
    let _ = writeln!(primer, "Recent Vitals (Last {}):", PRIMER_VITALS);
    for vital in vitals.most_recent(PRIMER_VITALS) {
        let _ = writeln!(
            primer,
            "{}: {} mg/dL ({})",
            format_timestamp(&vital.timestamp),
            vital.blood_sugar,
            vital.context
        );
    }
    primer
}

/// Full system instruction for a chat primed with `primer`
pub fn primed_instruction(primer: &str) -> String {
    format!(
        "{}\n\nCurrent User Context:\n{}",
        SYSTEM_INSTRUCTION, primer
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Log {
        instructions: Vec<String>,
        sent: Vec<(usize, String)>,
        meal_prompts: Vec<String>,
    }

    /// Scripted assistant: chats echo the message back, or fail
    #[derive(Clone, Default)]
    pub struct FakeAssistant {
        log: Arc<Mutex<Log>>,
        fail: bool,
        delay: Option<Duration>,
        meal: Option<MealAnalysis>,
    }

    impl FakeAssistant {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn with_meal(mut self, meal: MealAnalysis) -> Self {
            self.meal = Some(meal);
            self
        }

        /// System instructions of every chat started, in order
        pub fn instructions(&self) -> Vec<String> {
            self.log.lock().unwrap().instructions.clone()
        }

        /// (chat index, message) of every request sent
        pub fn sent(&self) -> Vec<(usize, String)> {
            self.log.lock().unwrap().sent.clone()
        }

        pub fn meal_prompts(&self) -> Vec<String> {
            self.log.lock().unwrap().meal_prompts.clone()
        }
    }

    struct FakeChat {
        index: usize,
        log: Arc<Mutex<Log>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl AssistantChat for FakeChat {
        async fn send(&mut self, message: &str) -> Result<String> {
            self.log
                .lock()
                .unwrap()
                .sent
                .push((self.index, message.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::general("network unreachable"));
            }
            Ok(format!("echo: {}", message))
        }
    }

    #[async_trait]
    impl Assistant for FakeAssistant {
        fn start_chat(&self, system_instruction: &str) -> Box<dyn AssistantChat> {
            let mut log = self.log.lock().unwrap();
            log.instructions.push(system_instruction.to_string());
            Box::new(FakeChat {
                index: log.instructions.len() - 1,
                log: self.log.clone(),
                fail: self.fail,
                delay: self.delay,
            })
        }

        async fn analyze_meal(&self, prompt: &str) -> Result<MealAnalysis> {
            self.log.lock().unwrap().meal_prompts.push(prompt.to_string());
            self.meal
                .clone()
                .ok_or_else(|| Error::general("analysis unavailable"))
        }
    }
}
