//! Emergency overlay: call actions, the medical ID card and spoken guidance

use std::fmt::Write as _;

use crate::profile::UserProfile;
use crate::speech::{SpeechOutput, Utterance};

pub const EMERGENCY_NUMBER: &str = "911";

pub const SAFETY_SCRIPT: &str = "Emergency mode active. Stay calm. If you have severe symptoms like confusion or fainting, please call emergency services immediately. If your blood sugar is low, consume 15 grams of sugar now.";

/// A phone call the user can place from the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAction {
    pub label: String,
    pub number: String,
}

impl CallAction {
    /// `tel:` URI for the number
    pub fn uri(&self) -> String {
        format!("tel:{}", self.number)
    }
}

/// Fields of the medical ID card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicalId {
    pub patient: String,
    pub condition: String,
    pub medications: String,
}

/// Available calls: emergency services first, then the contact when a
/// phone number is on file
pub fn call_actions(profile: &UserProfile) -> Vec<CallAction> {
    let mut actions = vec![CallAction {
        label: format!("Call {}", EMERGENCY_NUMBER),
        number: EMERGENCY_NUMBER.to_string(),
    }];
    if profile.has_emergency_phone() {
        actions.push(CallAction {
            label: format!("Call {}", profile.emergency_contact_name),
            number: profile.emergency_contact_phone.trim().to_string(),
        });
    }
    actions
}

pub fn medical_id(profile: &UserProfile) -> MedicalId {
    MedicalId {
        patient: profile.name.clone(),
        condition: profile.diabetes_type.to_string(),
        medications: profile.medications_display(),
    }
}

pub fn render(profile: &UserProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Need Help?");
    let _ = writeln!(
        out,
        "If you feel confused, faint, or have severe chest pain, do not wait."
    );
    let _ = writeln!(out);
    for action in call_actions(profile) {
        let _ = writeln!(out, "  [{}]  {}", action.label, action.uri());
    }
    let id = medical_id(profile);
    let _ = writeln!(out);
    let _ = writeln!(out, "MEDICAL ID CARD");
    let _ = writeln!(out, "  Patient:     {}", id.patient);
    let _ = writeln!(out, "  Condition:   {}", id.condition);
    let _ = writeln!(out, "  Medications: {}", id.medications);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "AFYA supports you, but cannot replace emergency medical care."
    );
    out
}

/// Spoken guidance of the overlay. The script plays on entry and again
/// whenever it is unmuted; muting and leaving silence it.
#[derive(Debug, Default)]
pub struct EmergencyMode {
    muted: bool,
}

impl EmergencyMode {
    pub fn new(muted: bool) -> Self {
        Self { muted }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn script() -> Utterance {
        Utterance::new(SAFETY_SCRIPT).with_rate(0.9).with_pitch(1.0)
    }

    pub fn enter(&self, speech: &mut SpeechOutput) {
        if !self.muted {
            speech.say(Self::script());
        }
    }

    pub fn set_muted(&mut self, muted: bool, speech: &mut SpeechOutput) {
        self.muted = muted;
        speech.cancel();
        if !muted {
            speech.say(Self::script());
        }
    }

    pub fn exit(&self, speech: &mut SpeechOutput) {
        speech.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::testing::{Event, RecordingSynthesizer};

    #[test]
    fn test_contact_call_requires_phone() {
        let mut profile = UserProfile::default();
        assert_eq!(call_actions(&profile).len(), 1);

        profile.emergency_contact_phone = "+254 700 000000".to_string();
        let actions = call_actions(&profile);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].uri(), "tel:911");
        assert_eq!(actions[1].label, "Call Dr. Smith");
    }

    #[test]
    fn test_medical_id() {
        let mut profile = UserProfile::default();
        profile.medications = vec!["Metformin".into(), "Insulin".into()];
        let id = medical_id(&profile);
        assert_eq!(id.condition, "Type 2");
        assert_eq!(id.medications, "Metformin, Insulin");

        profile.medications.clear();
        assert_eq!(medical_id(&profile).medications, "None listed");
    }

    #[test]
    fn test_enter_speaks_script_slowly() {
        let synth = RecordingSynthesizer::default();
        let mut speech = SpeechOutput::new(Box::new(synth.clone()), false);
        EmergencyMode::new(false).enter(&mut speech);

        match synth.events().last().unwrap() {
            Event::Speak(u) => {
                assert_eq!(u.text, SAFETY_SCRIPT);
                assert_eq!(u.rate, 0.9);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_muted_entry_is_silent_and_unmute_speaks() {
        let synth = RecordingSynthesizer::default();
        let mut speech = SpeechOutput::new(Box::new(synth.clone()), true);
        let mut mode = EmergencyMode::new(true);
        mode.enter(&mut speech);
        assert!(synth.spoken().is_empty());

        mode.set_muted(false, &mut speech);
        assert_eq!(synth.spoken(), vec![SAFETY_SCRIPT.to_string()]);

        mode.set_muted(true, &mut speech);
        mode.exit(&mut speech);
        assert_eq!(synth.spoken().len(), 1);
        assert_eq!(synth.events().last(), Some(&Event::Cancel));
    }

    #[test]
    fn test_render_lists_card() {
        let text = render(&UserProfile::default());
        assert!(text.contains("Patient:     User"));
        assert!(text.contains("Medications: Metformin"));
        assert!(!text.contains("Call Dr. Smith"));
    }
}
