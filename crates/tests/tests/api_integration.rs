use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use showme_agents::GenerationSettings;
use showme_api::{build_app, build_router, ApiState, ServiceConfig};
use showme_core::{CompletionProvider, CompletionRequest, CompletionResult};
use tower::ServiceExt;

const FRONTEND: &str = "http://localhost:5500";

enum Reply {
    Result(CompletionResult),
    Fail(&'static str),
}

struct StandInProvider {
    reply: Reply,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl StandInProvider {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CompletionProvider for StandInProvider {
    async fn create_completion(&self, request: CompletionRequest) -> Result<CompletionResult> {
        self.calls.lock().unwrap().push(request);
        match &self.reply {
            Reply::Result(result) => Ok(result.clone()),
            Reply::Fail(cause) => Err(anyhow!(*cause)),
        }
    }
}

fn app_with(provider: Arc<StandInProvider>) -> Router {
    let settings = GenerationSettings::new("gpt-4o", Duration::from_secs(5));
    let origins = vec![
        FRONTEND.to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:5500".to_string(),
    ];
    build_router(ApiState::new(provider, settings, origins))
}

fn itinerary_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-itinerary")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn paris_itinerary_is_returned_verbatim() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text(
        "Day 1: ...\nDay 2: ...",
    )));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Paris",
            "days": 2,
            "interests": ["art", "food"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "text": "Day 1: ...\nDay 2: ..." }));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn empty_city_is_rejected_without_calling_the_model() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("unused")));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "",
            "days": 3,
            "interests": ["history"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let detail = json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(detail.contains("city"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn zero_days_is_rejected() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("unused")));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Rome",
            "days": 0,
            "interests": ["food"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .contains("days"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn empty_interests_are_rejected() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("unused")));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Vienna",
            "days": 2,
            "interests": []
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn provider_failure_maps_to_server_error() {
    let provider = StandInProvider::new(Reply::Fail("simulated network error"));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Madrid",
            "days": 2,
            "interests": ["tapas"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(detail.starts_with("AI generation failed:"));
    assert!(detail.contains("simulated network error"));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn structured_result_without_text_still_yields_text() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_raw(json!({
        "id": "resp_fallback",
        "output": [
            {
                "type": "message",
                "content": [{ "type": "output_text", "text": "Day 1: Old Town" }]
            }
        ]
    }))));
    let app = app_with(provider);

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Prague",
            "days": 1,
            "interests": ["architecture"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["text"], "Day 1: Old Town");
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("unused")));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({ "city": "Athens" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"].is_string());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_detail() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("unused")));
    let app = app_with(provider.clone());
    let body = json!({
        "city": "x".repeat(70 * 1024),
        "days": 1,
        "interests": ["food"]
    })
    .to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/generate-itinerary")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json_body(response).await["detail"].is_string());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn blank_interest_label_reaches_the_model_as_given() {
    let provider = StandInProvider::new(Reply::Result(CompletionResult::from_text("Day 1")));
    let app = app_with(provider.clone());

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Hanoi",
            "days": 1,
            "interests": ["", "street   food"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = provider.calls.lock().unwrap().clone();
    assert!(calls[0].input.contains("User interests: , street   food."));
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_with_credentials() {
    let app = app_with(StandInProvider::new(Reply::Fail("unused")));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/generate-itinerary")
        .header("origin", FRONTEND)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-client-version")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], FRONTEND);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], "POST");
    assert_eq!(
        headers["access-control-allow-headers"],
        "content-type,x-client-version"
    );
}

#[tokio::test]
async fn cors_ignores_unknown_origin() {
    let app = app_with(StandInProvider::new(Reply::Result(CompletionResult::from_text(
        "Day 1",
    ))));

    let request = Request::builder()
        .method("POST")
        .uri("/generate-itinerary")
        .header("origin", "https://evil.example.com")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "city": "Oslo", "days": 1, "interests": ["fjords"] }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn health_reports_model_and_request_id() {
    let app = app_with(StandInProvider::new(Reply::Fail("unused")));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gpt-4o");
}

type SeenRequests = Arc<Mutex<Vec<(String, Value)>>>;

#[derive(Clone)]
struct MockResponses {
    status: StatusCode,
    body: Value,
    seen: SeenRequests,
}

async fn mock_responses(
    State(mock): State<MockResponses>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    mock.seen.lock().unwrap().push((authorization, body));
    (mock.status, Json(mock.body.clone()))
}

async fn spawn_mock_openai(status: StatusCode, body: Value) -> (ServiceConfig, SeenRequests) {
    let seen = SeenRequests::default();
    let mock = MockResponses {
        status,
        body,
        seen: seen.clone(),
    };
    let router = Router::new()
        .route("/v1/responses", post(mock_responses))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = ServiceConfig::from_lookup(|name| match name {
        "OPENAI_API_KEY" => Some("sk-test-key".to_string()),
        "SHOWME_OPENAI_BASE_URL" => Some(base_url.clone()),
        "SHOWME_GENERATION_TIMEOUT_SECONDS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();

    (config, seen)
}

#[tokio::test]
async fn openai_client_sends_prompt_and_generation_parameters() {
    let (config, seen) = spawn_mock_openai(
        StatusCode::OK,
        json!({
            "id": "resp_123",
            "object": "response",
            "output_text": "Day 1: Shibuya\nDay 2: Asakusa"
        }),
    )
    .await;
    let app = build_app(&config).unwrap();

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Tokyo",
            "days": 2,
            "interests": ["food", "temples"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["text"], "Day 1: Shibuya\nDay 2: Asakusa");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let (authorization, body) = &seen[0];
    assert_eq!(authorization, "Bearer sk-test-key");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_output_tokens"], 800);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert!(body["input"]
        .as_str()
        .unwrap()
        .contains("2-day itinerary for the city \"Tokyo\""));
}

#[tokio::test]
async fn openai_error_status_surfaces_as_generation_failure() {
    let (config, seen) = spawn_mock_openai(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "quota exceeded" } }),
    )
    .await;
    let app = build_app(&config).unwrap();

    let response = app
        .oneshot(itinerary_request(json!({
            "city": "Seoul",
            "days": 3,
            "interests": ["markets"]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(detail.starts_with("AI generation failed:"));
    assert!(detail.contains("429"));
    assert!(detail.contains("quota exceeded"));
    assert_eq!(seen.lock().unwrap().len(), 1);
}
