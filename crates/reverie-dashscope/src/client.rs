// SPDX-FileCopyrightText: 2026 Reverie Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the DashScope embedding and text-generation APIs.
//!
//! Provides [`DashScopeClient`] which handles request construction,
//! authentication, dimension checking for embeddings, streaming SSE
//! generation, and transient-error retry for generation calls.
//!
//! Embedding calls are deliberately retry-free: batch ingestion must abort
//! on the first failure rather than upserting partial or garbage vectors,
//! so retry policy belongs to callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reverie_core::{ChatMessage, EmbeddingAdapter, GenerationAdapter, ReverieError, TextDeltaStream};
use tracing::{debug, warn};

use crate::sse;
use crate::types::{
    ApiErrorResponse, EmbeddingInput, EmbeddingParameters, EmbeddingRequest, EmbeddingResponse,
    GenerationInput, GenerationParameters, GenerationRequest, GenerationResponse,
};

/// Path of the text-embedding service under the API base URL.
const EMBEDDING_PATH: &str = "/services/embeddings/text-embedding/text-embedding";

/// Path of the text-generation service under the API base URL.
const GENERATION_PATH: &str = "/services/aigc/text-generation/generation";

/// Tuning options for [`DashScopeClient`].
#[derive(Debug, Clone)]
pub struct DashScopeOptions {
    /// API base URL (overridable for tests).
    pub base_url: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Fixed embedding dimension; responses of any other width fail.
    pub embedding_dimension: usize,
    /// Generation model identifier.
    pub generation_model: String,
}

impl Default for DashScopeOptions {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/api/v1".to_string(),
            embedding_model: "text-embedding-v2".to_string(),
            embedding_dimension: 1536,
            generation_model: "qwen-turbo".to_string(),
        }
    }
}

/// HTTP client for DashScope API communication.
#[derive(Debug, Clone)]
pub struct DashScopeClient {
    client: reqwest::Client,
    options: DashScopeOptions,
    max_retries: u32,
}

impl DashScopeClient {
    /// Creates a new DashScope API client.
    pub fn new(api_key: &str, options: DashScopeOptions) -> Result<Self, ReverieError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&auth)
                .map_err(|e| ReverieError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ReverieError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            options,
            max_retries: 1,
        })
    }

    fn embedding_url(&self) -> String {
        format!("{}{EMBEDDING_PATH}", self.options.base_url)
    }

    fn generation_url(&self) -> String {
        format!("{}{GENERATION_PATH}", self.options.base_url)
    }

    /// Embeds one text. Exactly one provider call; no retry.
    ///
    /// The response must carry a vector at `output.embeddings[0].embedding`
    /// of exactly the configured dimension; anything else fails with the
    /// provider's raw diagnostic payload attached.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ReverieError> {
        let request = EmbeddingRequest {
            model: self.options.embedding_model.clone(),
            input: EmbeddingInput {
                texts: vec![text.to_string()],
            },
            parameters: EmbeddingParameters {
                text_type: "document".to_string(),
            },
        };

        let response = self
            .client
            .post(self.embedding_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ReverieError::Embedding {
                message: format!("embedding request failed: {e}"),
                payload: None,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ReverieError::Embedding {
                message: format!("embedding API returned {status}"),
                payload: Some(body),
            });
        }

        let parsed: EmbeddingResponse =
            serde_json::from_str(&body).map_err(|_| ReverieError::Embedding {
                message: "unparseable embedding response".to_string(),
                payload: Some(body.clone()),
            })?;

        let embedding = parsed
            .output
            .and_then(|o| o.embeddings.into_iter().next())
            .map(|item| item.embedding)
            .ok_or_else(|| ReverieError::Embedding {
                message: "no embedding in provider response".to_string(),
                payload: Some(body.clone()),
            })?;

        if embedding.len() != self.options.embedding_dimension {
            return Err(ReverieError::Embedding {
                message: format!(
                    "embedding dimension {} does not match configured {}",
                    embedding.len(),
                    self.options.embedding_dimension
                ),
                payload: Some(body),
            });
        }

        Ok(embedding)
    }

    /// Sends a generation request, retrying once on transient errors
    /// (429, 500, 503) after a 1-second delay.
    async fn send_generation(
        &self,
        request: &GenerationRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, ReverieError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generation request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut builder = self.client.post(self.generation_url()).json(request);
            if streaming {
                builder = builder.header("X-DashScope-SSE", "enable");
            }

            let response = builder.send().await.map_err(|e| ReverieError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(status = %status, attempt, streaming, "generation response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(ReverieError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "DashScope API error ({}): {}",
                    api_err.code.unwrap_or_else(|| status.to_string()),
                    api_err.message.unwrap_or_default()
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(ReverieError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| ReverieError::Provider {
            message: "generation request failed after retries".into(),
            source: None,
        }))
    }
}

#[async_trait]
impl EmbeddingAdapter for DashScopeClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ReverieError> {
        self.embed_text(text).await
    }

    fn dimension(&self) -> usize {
        self.options.embedding_dimension
    }
}

#[async_trait]
impl GenerationAdapter for DashScopeClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReverieError> {
        let request = GenerationRequest {
            model: self.options.generation_model.clone(),
            input: GenerationInput {
                messages: messages.to_vec(),
            },
            parameters: None,
        };

        let response = self.send_generation(&request, false).await?;
        let body = response.text().await.map_err(|e| ReverieError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        let parsed: GenerationResponse =
            serde_json::from_str(&body).map_err(|e| ReverieError::Provider {
                message: format!("failed to parse generation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        parsed
            .output
            .and_then(|o| o.text)
            .ok_or_else(|| ReverieError::Provider {
                message: format!("no text in generation response: {body}"),
                source: None,
            })
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<TextDeltaStream, ReverieError> {
        let request = GenerationRequest {
            model: self.options.generation_model.clone(),
            input: GenerationInput {
                messages: messages.to_vec(),
            },
            parameters: Some(GenerationParameters {
                incremental_output: true,
            }),
        };

        let response = self.send_generation(&request, true).await?;
        Ok(sse::parse_generation_stream(response))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> DashScopeClient {
        DashScopeClient::new(
            "test-api-key",
            DashScopeOptions {
                base_url: base_url.to_string(),
                embedding_dimension: 4,
                ..DashScopeOptions::default()
            },
        )
        .unwrap()
    }

    fn test_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are Mira."),
            ChatMessage::user("Where were you born?"),
        ]
    }

    #[tokio::test]
    async fn embed_returns_vector_of_configured_dimension() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "output": {"embeddings": [{"text_index": 0, "embedding": [0.1, 0.2, 0.3, 0.4]}]},
            "request_id": "req-1"
        });

        Mock::given(method("POST"))
            .and(path(EMBEDDING_PATH))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "parameters": {"text_type": "document"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let vector = client.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[tokio::test]
    async fn embed_rejects_wrong_dimension_with_payload() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "output": {"embeddings": [{"embedding": [0.1, 0.2]}]}
        });

        Mock::given(method("POST"))
            .and(path(EMBEDDING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.embed("hello").await.unwrap_err();
        match err {
            ReverieError::Embedding { message, payload } => {
                assert!(message.contains("dimension"), "got: {message}");
                assert!(payload.unwrap().contains("embeddings"));
            }
            other => panic!("expected Embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_surfaces_provider_diagnostics() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "code": "InvalidApiKey",
            "message": "Invalid API-key provided."
        });

        Mock::given(method("POST"))
            .and(path(EMBEDDING_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.embed("hello").await.unwrap_err();
        match err {
            ReverieError::Embedding { payload, .. } => {
                assert!(payload.unwrap().contains("InvalidApiKey"));
            }
            other => panic!("expected Embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_does_not_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EMBEDDING_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.embed("hello").await.is_err());
    }

    #[tokio::test]
    async fn complete_returns_output_text() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "output": {"text": "By the river shrine.", "finish_reason": "stop"},
            "request_id": "req-2"
        });

        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let text = client.complete(&test_messages()).await.unwrap();
        assert_eq!(text, "By the river shrine.");
    }

    #[tokio::test]
    async fn complete_retries_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let body = serde_json::json!({
            "output": {"text": "After retry.", "finish_reason": "stop"}
        });
        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let text = client.complete(&test_messages()).await.unwrap();
        assert_eq!(text, "After retry.");
    }

    #[tokio::test]
    async fn complete_fails_on_400_with_api_error() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "code": "InvalidParameter",
            "message": "messages must not be empty"
        });

        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.complete(&test_messages()).await.unwrap_err();
        assert!(err.to_string().contains("InvalidParameter"), "got: {err}");
    }

    #[tokio::test]
    async fn stream_sets_sse_header_and_yields_deltas() {
        use futures::StreamExt;

        let server = MockServer::start().await;

        let sse = "event: result\ndata: {\"output\":{\"text\":\"A\"}}\n\nevent: result\ndata: {\"output\":{\"text\":\"B\"}}\n\n";
        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .and(header("X-DashScope-SSE", "enable"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.stream(&test_messages()).await.unwrap();
        let mut deltas = Vec::new();
        while let Some(item) = stream.next().await {
            deltas.push(item.unwrap());
        }
        assert_eq!(deltas, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn stream_request_enables_incremental_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATION_PATH))
            .and(body_partial_json(serde_json::json!({
                "parameters": {"incremental_output": true}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(""),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.stream(&test_messages()).await.is_ok());
    }
}
