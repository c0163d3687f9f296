#[cfg(test)]
mod tests {
    use afya::app::AppState;
    use afya::config::AppOptions;
    use afya::conversation::{MessageRole, TurnOutcome};
    use afya::nutrition::GlycemicCategory;
    use afya::speech::{LogSynthesizer, SpeechInput, SpeechOutput};
    use afya::vitals::ReadingContext;
    use afya::Afya;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    // Helper to open the app against the mock server with an empty data dir
    fn setup_app(server_uri: &str, data_dir: &TempDir) -> AppState {
        let options = AppOptions::default()
            .with_api_base_url(server_uri)
            .with_data_dir(data_dir.path())
            .with_request_timeout(Some(Duration::from_millis(500)))
            .with_voice_enabled(false);
        let afya = Afya::new_with_options("test-key", options);
        afya.open(
            SpeechOutput::new(Box::new(LogSynthesizer), false),
            SpeechInput::new(None),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_turn_carries_profile_and_vitals() {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();
        let mut app = setup_app(&server.uri(), &data_dir);

        app.log_vital("240", ReadingContext::PostMeal, "after lunch")
            .unwrap();

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("Recent Vitals (Last 3)"))
            .and(body_string_contains("240 mg/dL (Post-Meal)"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Is 240 too high?"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(
                "240 mg/dL is above your target range. Drink water and take a short walk.",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = app.send_message("Is 240 too high?").await.unwrap();
        assert!(outcome.is_success());

        let transcript = app.conversation().transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, MessageRole::User);
        assert_eq!(transcript[2].role, MessageRole::Model);
        assert!(transcript[2].text.starts_with("240 mg/dL is above"));
    }

    #[tokio::test]
    async fn test_unreachable_assistant_records_fallback() {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();
        let mut app = setup_app(&server.uri(), &data_dir);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let outcome = app.send_message("Hello").await.unwrap();
        match outcome {
            TurnOutcome::Fallback(message) => {
                assert!(message.text.starts_with("I'm having trouble connecting"))
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(!app.conversation().is_awaiting());

        // The next turn is accepted
        assert!(app.send_message("Hello again").await.is_ok());
    }

    #[tokio::test]
    async fn test_meal_analysis_is_logged_after_confirmation() {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();
        let mut app = setup_app(&server.uri(), &data_dir);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_string_contains("for a patient with Type 2"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(
                r#"{"calories": 520, "carbs": 70, "glycemicIndex": "High", "advice": "Pair ugali with more greens."}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let pending = app
            .analyze_meal("ugali with sukuma wiki")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pending.analysis.carbs, 70);
        assert_eq!(pending.analysis.glycemic_index, GlycemicCategory::High);
        assert!(app.meals().is_empty());

        let meal = app.confirm_meal().unwrap().unwrap();
        assert_eq!(meal.description, "ugali with sukuma wiki");
        assert_eq!(meal.calories, Some(520));

        let stored = std::fs::read_to_string(data_dir.path().join("afya_meals.json")).unwrap();
        assert!(stored.contains("\"glycemicIndex\":\"High\""));
    }

    #[tokio::test]
    async fn test_malformed_meal_reply_logs_nothing() {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();
        let mut app = setup_app(&server.uri(), &data_dir);

        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("not json")))
            .mount(&server)
            .await;

        assert!(app.analyze_meal("rice").await.unwrap().is_none());
        assert!(app.confirm_meal().unwrap().is_none());
        assert!(!data_dir.path().join("afya_meals.json").exists());
    }

    #[tokio::test]
    async fn test_state_is_restored_from_data_dir() {
        let server = MockServer::start().await;
        let data_dir = TempDir::new().unwrap();

        {
            let mut app = setup_app(&server.uri(), &data_dir);
            app.log_vital("120", ReadingContext::Fasting, "").unwrap();
            app.log_vital("65", ReadingContext::Random, "felt shaky").unwrap();
            let mut draft = app.edit_profile();
            draft.set_name("Wanjiru").unwrap();
            draft.add_medication("Insulin");
            app.save_profile(draft).unwrap();
        }

        let app = setup_app(&server.uri(), &data_dir);
        assert_eq!(app.profile().name, "Wanjiru");
        assert_eq!(app.profile().medications, vec!["Metformin", "Insulin"]);
        assert_eq!(app.vitals().len(), 2);
        assert_eq!(app.vitals().latest().unwrap().notes.as_deref(), Some("felt shaky"));
        assert!(app.conversation().transcript()[0].text.starts_with("Hello Wanjiru"));
    }
}
