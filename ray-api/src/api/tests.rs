use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use ray_core::transport::mock::{
    MockUpstreams, RecordingMailer, Reply, ScriptedCompletion, StaticSearch,
};
use ray_core::{InMemoryItemStore, SearchResult};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::services::{Services, relay_config};
use crate::create_app;

const TOKEN: &str = "test-token";

struct Harness {
    server: TestServer,
    upstreams: MockUpstreams,
    store: Arc<InMemoryItemStore>,
}

fn token_header(value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-app-token"),
        HeaderValue::from_static(value),
    )
}

fn harness_with(
    completion: ScriptedCompletion,
    search: StaticSearch,
    mailer: RecordingMailer,
    configure: impl FnOnce(&mut Settings),
) -> Harness {
    let mut settings = Settings::for_tests();
    settings.auth.app_token = Some(TOKEN.to_string());
    configure(&mut settings);

    let upstreams = MockUpstreams::new(completion, search, mailer);
    let store = Arc::new(InMemoryItemStore::new());
    let services = Services::new(
        upstreams.completion.clone(),
        upstreams.search.clone(),
        upstreams.mailer.clone(),
        store.clone(),
        relay_config(&settings),
    );

    Harness {
        server: TestServer::new(create_app(&settings, services)).unwrap(),
        upstreams,
        store,
    }
}

fn harness() -> Harness {
    harness_with(
        ScriptedCompletion::new([]),
        StaticSearch::empty(),
        RecordingMailer::new(),
        |_| {},
    )
}

/// Completion double that routes on the system prompt
fn routed(tier: u8) -> ScriptedCompletion {
    ScriptedCompletion::with_responder(move |request| {
        let system = request.system_text();
        if system.starts_with("You route questions") {
            Reply::text(format!(r#"{{"tier": {tier}, "reasoning": "test routing"}}"#))
        } else if system.starts_with("Rewrite the user's question") {
            Reply::text("search keywords")
        } else if system.starts_with("Extract personal details") {
            Reply::text(r#"{"facts": [{"category": "work", "fact": "Works night shifts"}]}"#)
        } else {
            Reply::text("model answer")
        }
    })
}

#[tokio::test]
async fn test_health_is_open_and_tagged() {
    let h = harness();
    let response = h.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_missing_or_wrong_token_is_rejected_before_upstream_calls() {
    let h = harness_with(
        routed(2),
        StaticSearch::empty(),
        RecordingMailer::new(),
        |_| {},
    );

    let response = h
        .server
        .post("/api/ray")
        .json(&json!({"query": "What is the capital of Peru?"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Unauthorized");

    let (name, _) = token_header(TOKEN);
    let response = h
        .server
        .post("/api/ray")
        .add_header(name, HeaderValue::from_static("wrong"))
        .json(&json!({"query": "What is the capital of Peru?"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = h
        .server
        .post("/api/ray-items")
        .json(&json!({"title": "x", "content": "y"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = h
        .server
        .post("/api/google-search")
        .json(&json!({"query": "news"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    assert_eq!(h.upstreams.completion.call_count(), 0);
    assert_eq!(h.upstreams.search.call_count(), 0);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_unset_app_token_is_a_configuration_error() {
    let h = harness_with(
        ScriptedCompletion::new([]),
        StaticSearch::empty(),
        RecordingMailer::new(),
        |settings| settings.auth.app_token = None,
    );
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"query": "hi"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.upstreams.completion.call_count(), 0);
}

#[tokio::test]
async fn test_bare_save_command_saves_last_answer() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({
            "query": "save this",
            "conversationHistory": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["savedItem"]["content"], "hello");
    assert_eq!(body["savedItem"]["title"], "hello");
    assert_eq!(body["savedItem"]["zone"], "brain");
    assert_eq!(body["savedItem"]["source"], "assistant_answer");
    assert_eq!(body["classification"]["zone"], "brain");

    assert_eq!(h.store.len(), 1);
    assert_eq!(h.upstreams.completion.call_count(), 0);
}

#[tokio::test]
async fn test_save_command_keeps_explicit_content() {
    let h = harness();
    let (name, value) = token_header(TOKEN);
    let history = json!([{"role": "assistant", "content": "previous answer"}]);

    for (query, expected) in [
        ("save the dentist appointment at 10:30", "the dentist appointment at 10:30"),
        ("save https://example.com/recipe", "https://example.com/recipe"),
        ("save buy milk on friday", "buy milk on friday"),
    ] {
        let body: Value = h
            .server
            .post("/api/ray")
            .add_header(name.clone(), value.clone())
            .json(&json!({"query": query, "conversationHistory": history}))
            .await
            .json();

        assert_eq!(body["ok"], true, "{query:?}");
        assert_eq!(body["savedItem"]["content"], expected);
        assert_eq!(body["savedItem"]["source"], "user_note");
    }

    assert_eq!(h.store.len(), 3);
    assert_eq!(h.upstreams.completion.call_count(), 0);
}

#[tokio::test]
async fn test_save_with_nothing_to_save_is_bad_request() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"query": "save"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_direct_save_files_into_brain() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray-items")
        .add_header(name.clone(), value.clone())
        .json(&json!({"title": "buy milk", "content": "buy milk"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["zone"], "brain");
    assert_eq!(body["subzone"], "food");
    assert_eq!(body["kind"], "note");
    assert_eq!(body["source"], "user_note");
    assert!(body["id"].is_string());

    let listed = h
        .server
        .get("/api/ray-items")
        .add_header(name.clone(), value.clone())
        .add_query_param("subzone", "food")
        .await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    let rows: Value = listed.json();
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["title"], "buy milk");

    let other = h
        .server
        .get("/api/ray-items")
        .add_header(name, value)
        .add_query_param("subzone", "family")
        .await;
    assert_eq!(other.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_direct_save_requires_content() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray-items")
        .add_header(name, value)
        .json(&json!({"title": "empty", "content": "   "}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .contains("content is required"));
}

#[tokio::test]
async fn test_live_question_without_results_uses_tier_two_model() {
    let h = harness_with(routed(3), StaticSearch::empty(), RecordingMailer::new(), |_| {});
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"query": "Who won the match last night?"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["tier"], 3);
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["message"], "model answer");
    assert_eq!(h.upstreams.search.call_count(), 1);
}

#[tokio::test]
async fn test_relay_settings_reach_the_relay() {
    let h = harness_with(routed(2), StaticSearch::empty(), RecordingMailer::new(), |settings| {
        settings.relay.models.tier2 = "gpt-4.1".to_string();
        settings.relay.history_limit = 2;
    });
    let (name, value) = token_header(TOKEN);
    let history: Vec<Value> = (0..6)
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            json!({"role": role, "content": format!("turn {i}")})
        })
        .collect();

    let body: Value = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({
            "query": "Plan a three day trip to Lisbon",
            "conversationHistory": history
        }))
        .await
        .json();

    assert_eq!(body["tier"], 2);
    assert_eq!(body["model"], "gpt-4.1");

    let answer = h
        .upstreams
        .completion
        .requests()
        .into_iter()
        .find(|r| r.model == "gpt-4.1")
        .unwrap();
    // system + two history turns + the question
    assert_eq!(answer.messages.len(), 4);
    assert_eq!(answer.messages[1]["content"], "turn 4");
    assert_eq!(answer.last_text(), "Plan a three day trip to Lisbon");
}

#[tokio::test]
async fn test_live_question_with_results_reports_sources() {
    let search = StaticSearch::new(vec![SearchResult {
        title: "Final score".to_string(),
        snippet: "Team A won 2-1".to_string(),
        link: "https://sports.example/final".to_string(),
    }]);
    let h = harness_with(routed(3), search, RecordingMailer::new(), |_| {});
    let (name, value) = token_header(TOKEN);

    let body: Value = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"query": "Who won the match last night?"}))
        .await
        .json();

    assert_eq!(body["model"], "google-search");
    assert_eq!(body["sources"], json!(["https://sports.example/final"]));
}

#[tokio::test]
async fn test_personal_details_are_merged_into_answer() {
    let h = harness_with(routed(1), StaticSearch::empty(), RecordingMailer::new(), |_| {});
    let (name, value) = token_header(TOKEN);

    let body: Value = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"query": "I work nights, when should I sleep?"}))
        .await
        .json();

    assert_eq!(body["tier"], 1);
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["extractedPersonalDetails"][0]["category"], "work");
}

#[tokio::test]
async fn test_email_request_uses_last_answer() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let body: Value = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({
            "query": "email that to me",
            "userEmail": "me@example.com",
            "conversationHistory": [{"role": "assistant", "content": "Bring a jacket."}]
        }))
        .await
        .json();

    assert_eq!(body["ok"], true);
    assert_eq!(body["email"]["sent"], true);
    assert!(body["message"].as_str().unwrap().contains("Bring a jacket."));
    assert_eq!(h.upstreams.mailer.sent().len(), 1);
    assert_eq!(h.upstreams.completion.call_count(), 0);
}

#[tokio::test]
async fn test_email_failure_is_reported_in_band() {
    let h = harness_with(
        ScriptedCompletion::new([]),
        StaticSearch::empty(),
        RecordingMailer::failing(),
        |_| {},
    );
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({
            "query": "send it to my email",
            "userEmail": "me@example.com",
            "conversationHistory": [{"role": "assistant", "content": "Bring a jacket."}]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["email"]["sent"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("I tried to email that but something went wrong"));
}

#[tokio::test]
async fn test_wrong_method_gets_json_405() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h.server.get("/api/ray").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.json::<Value>()["error"], "Method not allowed");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray")
        .add_header(name.clone(), value.clone())
        .text("{not json")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Bad request");

    let response = h
        .server
        .post("/api/ray")
        .add_header(name, value)
        .json(&json!({"conversationHistory": []}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(h.upstreams.completion.call_count(), 0);
}

#[tokio::test]
async fn test_upstream_failure_passes_status_through() {
    let h = harness_with(
        ScriptedCompletion::new([Reply::Status(
            429,
            r#"{"error": {"message": "rate limited"}}"#.to_string(),
        )]),
        StaticSearch::empty(),
        RecordingMailer::new(),
        |_| {},
    );
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/openai")
        .add_header(name, value)
        .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["details"]["error"]["message"], "rate limited");
}

#[tokio::test]
async fn test_openai_proxy_returns_raw_upstream_json() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let body: Value = h
        .server
        .post("/api/openai")
        .add_header(name, value)
        .json(&json!({"messages": [{"role": "user", "content": "hi"}], "max_tokens": 20}))
        .await
        .json();

    assert_eq!(body["choices"][0]["message"]["content"], "ok");
    let requests = h.upstreams.completion.requests();
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(requests[0].max_tokens, Some(20));
}

#[tokio::test]
async fn test_vision_validates_image() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/vision")
        .add_header(name.clone(), value.clone())
        .json(&json!({"base64Image": "%%%", "prompt": "what is this?"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(h.upstreams.completion.call_count(), 0);

    let response = h
        .server
        .post("/api/vision")
        .add_header(name, value)
        .json(&json!({"base64Image": "aGVsbG8=", "prompt": "what is this?"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(h.upstreams.completion.requests()[0].model, "gpt-4o");
}

#[tokio::test]
async fn test_search_clamps_result_count() {
    let search = StaticSearch::new(vec![SearchResult {
        title: "Rust".to_string(),
        snippet: "A language".to_string(),
        link: "https://rust-lang.org".to_string(),
    }]);
    let h = harness_with(ScriptedCompletion::new([]), search, RecordingMailer::new(), |_| {});
    let (name, value) = token_header(TOKEN);

    let body: Value = h
        .server
        .post("/api/google-search")
        .add_header(name, value)
        .json(&json!({"query": "rust", "num": 50}))
        .await
        .json();

    assert_eq!(body["ok"], true);
    assert_eq!(body["query"], "rust");
    assert_eq!(body["results"][0]["link"], "https://rust-lang.org");
    assert_eq!(h.upstreams.search.queries(), vec![("rust".to_string(), 10)]);
}

#[tokio::test]
async fn test_send_email_route() {
    let h = harness();
    let (name, value) = token_header(TOKEN);

    let response = h
        .server
        .post("/api/ray/send-email")
        .add_header(name.clone(), value.clone())
        .json(&json!({"to": "me@example.com", "subject": "Hi", "html": "<p>Hi</p>"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"ok": true, "to": "me@example.com"}));

    let sent = h.upstreams.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Hi");

    let response = h
        .server
        .post("/api/ray/send-email")
        .add_header(name, value)
        .json(&json!({"html": "<p>Hi</p>"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_live_route_is_opt_in() {
    let h = harness();
    let response = h
        .server
        .post("/api/ray-live")
        .json(&json!({"query": "hi"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let h = harness_with(
        routed(1),
        StaticSearch::empty(),
        RecordingMailer::new(),
        |settings| settings.auth.enable_live_route = true,
    );
    let response = h
        .server
        .post("/api/ray-live")
        .json(&json!({"query": "hi"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "model answer");
}
