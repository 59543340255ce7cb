mod config;
mod openai;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use showme_agents::{GenerationSettings, ItineraryAgent};
use showme_core::{CompletionProvider, ItineraryError, ItineraryRequest, ItineraryResponse};
use showme_observability::{AppMetrics, MetricsSnapshot};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServiceConfig};
pub use openai::OpenAiResponsesClient;

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

pub struct ApiState<P> {
    pub agent: Arc<ItineraryAgent<P>>,
    pub metrics: Arc<AppMetrics>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl<P> Clone for ApiState<P> {
    fn clone(&self) -> Self {
        Self {
            agent: self.agent.clone(),
            metrics: self.metrics.clone(),
            allowed_origins: self.allowed_origins.clone(),
        }
    }
}

impl<P> ApiState<P>
where
    P: CompletionProvider,
{
    pub fn new(provider: Arc<P>, settings: GenerationSettings, allowed_origins: Vec<String>) -> Self {
        let metrics = AppMetrics::shared();
        let agent = Arc::new(ItineraryAgent::new(provider, settings, metrics.clone()));

        Self {
            agent,
            metrics,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    model: String,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub enum ApiError {
    Itinerary(ItineraryError),
    Rejected(JsonRejection),
}

impl From<ItineraryError> for ApiError {
    fn from(error: ItineraryError) -> Self {
        Self::Itinerary(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Itinerary(error @ ItineraryError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Self::Itinerary(error @ ItineraryError::GenerationFailure(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            Self::Rejected(rejection) => {
                let status = match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, format!("invalid request body: {}", rejection.body_text()))
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Builds the production router: OpenAI provider plus the settings from `config`.
pub fn build_app(config: &ServiceConfig) -> Result<Router> {
    let provider = Arc::new(OpenAiResponsesClient::new(config)?);
    let settings = GenerationSettings::new(config.model.clone(), config.generation_timeout);
    let state = ApiState::new(provider, settings, config.allowed_origins());

    Ok(build_router(state))
}

pub fn build_router<P>(state: ApiState<P>) -> Router
where
    P: CompletionProvider + 'static,
{
    Router::new()
        .route("/health", get(health::<P>))
        .route("/generate-itinerary", post(generate_itinerary::<P>))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn health<P>(State(state): State<ApiState<P>>) -> impl IntoResponse
where
    P: CompletionProvider + 'static,
{
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        model: state.agent.settings().model.clone(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn generate_itinerary<P>(
    State(state): State<ApiState<P>>,
    payload: Result<Json<ItineraryRequest>, JsonRejection>,
) -> Result<Json<ItineraryResponse>, ApiError>
where
    P: CompletionProvider + 'static,
{
    let Json(request) = payload?;
    let response = state.agent.generate_itinerary(&request).await?;
    Ok(Json(response))
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
