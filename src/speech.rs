//! Speech input and output
//!
//! Recognition is one-shot and exclusive: a second attempt is refused while
//! one is active. Output has a single slot: every new utterance cancels the
//! one still playing.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};

/// Recognition language
pub const RECOGNITION_LANG: &str = "en-US";

/// A voice offered by the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
}

/// Something to say and how to say it
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
        }
    }

    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// Host text-to-speech
pub trait SpeechSynthesizer: Send {
    fn voices(&self) -> Vec<Voice>;

    /// Starts speaking; must not block until playback ends
    fn speak(&mut self, utterance: Utterance);

    /// Stops whatever is playing
    fn cancel(&mut self);
}

/// Host speech-to-text
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Listens once and returns the best transcript, `None` if nothing was heard
    async fn recognize(&mut self, lang: &str) -> Result<Option<String>>;
}

/// Prefers a voice named "Female" or "Google US English", else the first one
pub fn select_voice(voices: &[Voice]) -> Option<Voice> {
    voices
        .iter()
        .find(|v| v.name.contains("Female") || v.name.contains("Google US English"))
        .or_else(|| voices.first())
        .cloned()
}

/// Single-slot speech output with an on/off toggle for replies
pub struct SpeechOutput {
    synthesizer: Box<dyn SpeechSynthesizer>,
    enabled: bool,
}

impl SpeechOutput {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, enabled: bool) -> Self {
        Self {
            synthesizer,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggling always silences pending speech
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.synthesizer.cancel();
    }

    /// Cancel-then-speak, regardless of the reply toggle
    pub fn say(&mut self, utterance: Utterance) {
        self.synthesizer.cancel();
        self.synthesizer.speak(utterance);
    }

    /// Speaks an assistant reply when voice is enabled
    pub fn speak_reply(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        let voice = select_voice(&self.synthesizer.voices());
        self.say(
            Utterance::new(text)
                .with_voice(voice)
                .with_rate(1.0)
                .with_pitch(1.05),
        );
    }

    pub fn cancel(&mut self) {
        self.synthesizer.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
    Idle,
    Active,
}

/// Exclusive one-shot recognition
pub struct SpeechInput {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    state: RecognitionState,
}

impl SpeechInput {
    /// `None` when the host has no recognizer
    pub fn new(recognizer: Option<Box<dyn SpeechRecognizer>>) -> Self {
        Self {
            recognizer,
            state: RecognitionState::Idle,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    /// Idle -> Active
    pub fn begin(&mut self) -> Result<()> {
        if self.recognizer.is_none() {
            return Err(Error::speech("Voice input is not supported"));
        }
        if self.state == RecognitionState::Active {
            return Err(Error::busy("speech recognition already active"));
        }
        self.state = RecognitionState::Active;
        debug!("recognition started");
        Ok(())
    }

    /// Active -> Idle
    pub fn finish(&mut self) {
        self.state = RecognitionState::Idle;
    }

    /// Runs one recognition attempt and returns its transcript
    pub async fn listen(&mut self) -> Result<Option<String>> {
        self.begin()?;
        let result = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.recognize(RECOGNITION_LANG).await,
            None => Ok(None),
        };
        self.finish();
        let transcript = result?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        debug!("recognition finished, heard {:?}", transcript);
        Ok(transcript)
    }
}

/// Synthesizer that only writes utterances to the log
#[derive(Debug, Default)]
pub struct LogSynthesizer;

impl SpeechSynthesizer for LogSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, utterance: Utterance) {
        info!("speaking: {}", utterance.text);
    }

    fn cancel(&mut self) {}
}

/// Speaks by running an external program (`espeak`, `say`, ...) with the
/// text as its last argument. Cancelling kills the running process.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSynthesizer {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            current: None,
        }
    }

    /// Parses a command line such as `espeak -s 150`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(&program, &parts.collect::<Vec<_>>()))
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&mut self, utterance: Utterance) {
        match Command::new(&self.program)
            .args(&self.args)
            .arg(&utterance.text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.current = Some(child),
            Err(e) => warn!("could not start {}: {}", self.program, e),
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Recognizes by running an external program that records one phrase and
/// prints the transcript on stdout. The language is passed as `--lang`.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&mut self, lang: &str) -> Result<Option<String>> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--lang")
            .arg(lang)
            .stderr(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(Error::speech(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        let transcript = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(if transcript.is_empty() {
            None
        } else {
            Some(transcript)
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records what would have been played
    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        Speak(Utterance),
        Cancel,
    }

    #[derive(Clone, Default)]
    pub struct RecordingSynthesizer {
        pub events: Arc<Mutex<Vec<Event>>>,
        pub voices: Vec<Voice>,
    }

    impl RecordingSynthesizer {
        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn spoken(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Speak(u) => Some(u.text),
                    Event::Cancel => None,
                })
                .collect()
        }
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn voices(&self) -> Vec<Voice> {
            self.voices.clone()
        }

        fn speak(&mut self, utterance: Utterance) {
            self.events.lock().unwrap().push(Event::Speak(utterance));
        }

        fn cancel(&mut self) {
            self.events.lock().unwrap().push(Event::Cancel);
        }
    }

    pub struct FixedRecognizer(pub Option<String>);

    #[async_trait]
    impl SpeechRecognizer for FixedRecognizer {
        async fn recognize(&mut self, lang: &str) -> Result<Option<String>> {
            assert_eq!(lang, RECOGNITION_LANG);
            Ok(self.0.clone())
        }
    }
}
