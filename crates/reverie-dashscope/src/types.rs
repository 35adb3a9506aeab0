// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DashScope API request/response types for embeddings and text generation.

use reverie_core::ChatMessage;
use serde::{Deserialize, Serialize};

// --- Embedding types ---

/// A request to the DashScope text-embedding endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    /// Model identifier (e.g., "text-embedding-v2").
    pub model: String,
    /// Input texts to embed.
    pub input: EmbeddingInput,
    /// Embedding parameters.
    pub parameters: EmbeddingParameters,
}

/// Input block of an embedding request.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Parameter block of an embedding request.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingParameters {
    /// "document" for stored text; DashScope also accepts "query".
    pub text_type: String,
}

/// A response from the embedding endpoint. Every field is optional so a
/// diagnostic body parses instead of erroring; the client decides what is
/// usable.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub output: Option<EmbeddingOutput>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Output block of an embedding response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingOutput {
    #[serde(default)]
    pub embeddings: Vec<EmbeddingItem>,
}

/// A single embedding in the response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingItem {
    #[serde(default)]
    pub text_index: Option<usize>,
    pub embedding: Vec<f32>,
}

// --- Generation types ---

/// A request to the DashScope text-generation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Model identifier (e.g., "qwen-turbo").
    pub model: String,
    /// Conversation input.
    pub input: GenerationInput,
    /// Generation parameters; omitted entirely for non-streaming calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GenerationParameters>,
}

/// Input block of a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationInput {
    pub messages: Vec<ChatMessage>,
}

/// Parameter block of a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParameters {
    /// Emit each SSE frame as an incremental delta rather than the full
    /// accumulated text.
    pub incremental_output: bool,
}

/// A response frame from the generation endpoint.
///
/// The same shape serves the non-streaming response body and each SSE
/// frame payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub output: Option<GenerationOutput>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub usage: Option<GenerationUsage>,
}

/// Output block of a generation response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationOutput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationUsage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

/// Error body returned by DashScope on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_request_serializes_provider_shape() {
        let req = EmbeddingRequest {
            model: "text-embedding-v2".into(),
            input: EmbeddingInput {
                texts: vec!["hello".into()],
            },
            parameters: EmbeddingParameters {
                text_type: "document".into(),
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["input"]["texts"][0], "hello");
        assert_eq!(json["parameters"]["text_type"], "document");
    }

    #[test]
    fn generation_request_omits_absent_parameters() {
        let req = GenerationRequest {
            model: "qwen-turbo".into(),
            input: GenerationInput { messages: vec![] },
            parameters: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("parameters"));
    }

    #[test]
    fn generation_frame_parses_incremental_delta() {
        let frame: GenerationResponse =
            serde_json::from_str(r#"{"output":{"text":"A","finish_reason":"null"}}"#).unwrap();
        assert_eq!(frame.output.unwrap().text.as_deref(), Some("A"));
    }

    #[test]
    fn diagnostic_body_still_parses() {
        let frame: EmbeddingResponse =
            serde_json::from_str(r#"{"code":"InvalidApiKey","message":"Invalid API-key provided."}"#)
                .unwrap();
        assert!(frame.output.is_none());
    }
}
