use std::time::Duration;

use rubric_grader::{
    EvaluationRequest, GraderConfig, GradingClient, RetryPolicy, Submission, Transport,
    TransportError, client::gemini::GenerateContentTransport,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const ENDPOINT: &str = "/models/test-model:generateContent";

fn config(server: &MockServer) -> GraderConfig {
    GraderConfig::builder()
        .api_base(format!("{}/", server.uri()))
        .api_key("secret".to_string())
        .model("test-model".to_string())
        .build()
}

fn reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn sends_prompt_attachments_and_safety_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("SCORE: 9")))
        .expect(1)
        .mount(&server)
        .await;

    let transport = GenerateContentTransport::connect(&config(&server)).expect("configured");
    assert_eq!(transport.endpoint(), format!("{}{ENDPOINT}", server.uri()));

    let answer = Submission::new("alice.png", "image/png", b"answer".to_vec());
    let key = Submission::new("key.pdf", "application/pdf", b"key".to_vec());
    let text = transport
        .evaluate(EvaluationRequest {
            prompt:     "grade it",
            submission: &answer,
            reference:  Some(&key),
        })
        .await
        .expect("evaluated");
    assert_eq!(text, "SCORE: 9");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let parts = body["contents"][0]["parts"].as_array().expect("parts");
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["text"], "grade it");
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert_eq!(parts[1]["inline_data"]["data"], "YW5zd2Vy");
    assert_eq!(parts[2]["inline_data"]["mime_type"], "application/pdf");
    assert_eq!(parts[2]["inline_data"]["data"], "a2V5");

    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    assert_eq!(body["generationConfig"]["topK"], 40);
    let safety = body["safetySettings"].as_array().expect("safety settings");
    assert_eq!(safety.len(), 4);
    assert!(
        safety
            .iter()
            .all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE")
    );
}

#[tokio::test]
async fn maps_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Resource has been exhausted"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .with_priority(3)
        .mount(&server)
        .await;

    let transport = GenerateContentTransport::connect(&config(&server)).expect("configured");
    let answer = Submission::new("alice.png", "image/png", vec![0]);
    let request = EvaluationRequest {
        prompt:     "grade it",
        submission: &answer,
        reference:  None,
    };

    let err = transport.evaluate(request).await.expect_err("429");
    assert!(matches!(err, TransportError::RateLimited { status: Some(429), .. }));

    let err = transport.evaluate(request).await.expect_err("400");
    assert!(!err.is_rate_limit());
    assert!(matches!(err, TransportError::Status { status: 400, .. }));

    let err = transport.evaluate(request).await.expect_err("no candidates");
    assert!(matches!(err, TransportError::InvalidResponse(_)));
}

#[tokio::test]
async fn client_retries_through_http_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("SCORE: 2")))
        .with_priority(2)
        .mount(&server)
        .await;

    let config = config(&server);
    let client = GradingClient::new(move || GenerateContentTransport::connect(&config))
        .with_retry_policy(RetryPolicy {
            max_retries:   1,
            initial_delay: Duration::from_millis(10),
        });

    let answer = Submission::new("alice.png", "image/png", vec![0]);
    let text = client
        .evaluate(&answer, "grade it", None)
        .await
        .expect("second attempt succeeds");

    assert_eq!(text, "SCORE: 2");
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(2));
}
