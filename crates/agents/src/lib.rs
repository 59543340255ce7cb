use std::sync::Arc;
use std::time::{Duration, Instant};

use showme_core::{
    render_prompt, CompletionProvider, CompletionRequest, ItineraryError, ItineraryRequest,
    ItineraryResponse, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE,
};
use showme_observability::AppMetrics;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout,
        }
    }
}

pub struct ItineraryAgent<P> {
    provider: Arc<P>,
    settings: GenerationSettings,
    metrics: Arc<AppMetrics>,
}

impl<P> ItineraryAgent<P>
where
    P: CompletionProvider,
{
    pub fn new(provider: Arc<P>, settings: GenerationSettings, metrics: Arc<AppMetrics>) -> Self {
        Self {
            provider,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    #[instrument(skip(self, request), fields(days = request.days))]
    pub async fn generate_itinerary(
        &self,
        request: &ItineraryRequest,
    ) -> Result<ItineraryResponse, ItineraryError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let result = self.run_pipeline(request).await;

        self.metrics.observe_latency(started.elapsed());
        match &result {
            Ok(response) => {
                self.metrics.inc_generated();
                info!(
                    chars = response.text.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "itinerary generated"
                );
            }
            Err(ItineraryError::InvalidInput(_)) => self.metrics.inc_invalid_input(),
            Err(ItineraryError::GenerationFailure(_)) => self.metrics.inc_generation_failure(),
        }

        result
    }

    async fn run_pipeline(
        &self,
        request: &ItineraryRequest,
    ) -> Result<ItineraryResponse, ItineraryError> {
        let itinerary = request.validate().inspect_err(|error| {
            warn!(fields = ?error.invalid_fields(), "rejected itinerary request");
        })?;

        let completion = CompletionRequest {
            model: self.settings.model.clone(),
            input: render_prompt(&itinerary),
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        };

        let result = match tokio::time::timeout(
            self.settings.timeout,
            self.provider.create_completion(completion),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(cause)) => {
                error!(city = %itinerary.city, error = %format!("{cause:#}"), "completion call failed");
                return Err(ItineraryError::generation(format!("{cause:#}")));
            }
            Err(_) => {
                error!(city = %itinerary.city, timeout = ?self.settings.timeout, "completion call timed out");
                return Err(ItineraryError::generation(format!(
                    "completion timed out after {:?}",
                    self.settings.timeout
                )));
            }
        };

        let text = match result.canonical_text() {
            Some(text) => text.to_string(),
            None => {
                self.metrics.inc_fallback_render();
                warn!(city = %itinerary.city, "combined output text missing, rendering raw result");
                result.fallback_text()
            }
        };

        if text.is_empty() {
            error!(city = %itinerary.city, "completion produced no text");
            return Err(ItineraryError::generation("completion returned no text"));
        }

        Ok(ItineraryResponse { text })
    }
}
