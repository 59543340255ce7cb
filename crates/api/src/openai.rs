use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use showme_core::{CompletionProvider, CompletionRequest, CompletionResult};

use crate::config::ServiceConfig;

/// Completion provider backed by the OpenAI Responses API.
#[derive(Clone)]
pub struct OpenAiResponsesClient {
    http_client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiResponsesClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(config.generation_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_key: config.openai_api_key.clone(),
            endpoint: format!("{}/responses", config.openai_base_url),
        })
    }
}

impl CompletionProvider for OpenAiResponsesClient {
    async fn create_completion(&self, request: CompletionRequest) -> Result<CompletionResult> {
        let payload = serde_json::json!({
            "model": request.model,
            "input": request.input,
            "temperature": request.temperature,
            "max_output_tokens": request.max_output_tokens
        });

        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .bearer_auth(self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI non-success status {}: {}", status.as_u16(), body);
        }

        let body: serde_json::Value = response.json().await.context("OpenAI parse failed")?;
        Ok(CompletionResult::from_raw(body))
    }
}
