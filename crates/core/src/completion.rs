use std::future::Future;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub input: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// What a completion provider handed back: the combined output text when the
/// provider exposes one, plus the raw structured payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub output_text: Option<String>,
    pub raw: Value,
}

impl CompletionResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: Value::String(text.clone()),
            output_text: Some(text),
        }
    }

    pub fn from_raw(raw: Value) -> Self {
        let output_text = raw
            .get("output_text")
            .and_then(|value| value.as_str())
            .map(ToString::to_string);
        Self { output_text, raw }
    }

    pub fn canonical_text(&self) -> Option<&str> {
        self.output_text
            .as_deref()
            .filter(|text| !text.is_empty())
    }

    /// Best-effort text when the canonical field is missing: the `output_text`
    /// content parts of `output[]` joined by blank lines, else compact JSON of
    /// the raw payload. Empty only when the payload itself is empty.
    pub fn fallback_text(&self) -> String {
        let chunks = self
            .raw
            .get("output")
            .and_then(|value| value.as_array())
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("content").and_then(|value| value.as_array()))
            .flatten()
            .filter(|part| {
                part.get("type")
                    .and_then(|value| value.as_str())
                    .map(|value| value == "output_text")
                    .unwrap_or(false)
            })
            .filter_map(|part| part.get("text").and_then(|value| value.as_str()))
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>();
        if !chunks.is_empty() {
            return chunks.join("\n\n");
        }

        match &self.raw {
            Value::Null => String::new(),
            Value::String(text) if text.trim().is_empty() => String::new(),
            Value::Object(map) if map.is_empty() => String::new(),
            other => other.to_string(),
        }
    }

    pub fn combined_text(&self) -> String {
        match self.canonical_text() {
            Some(text) => text.to_string(),
            None => self.fallback_text(),
        }
    }
}

/// Reaches the external text-generation model. One call per request.
pub trait CompletionProvider: Send + Sync {
    fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResult>> + Send;
}
