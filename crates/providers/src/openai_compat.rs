//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI and any endpoint exposing the same REST shape.
//!
//! Supports:
//! - Embeddings (`/embeddings`)
//! - Legacy text completions (`/completions`)
//! - Chat completions (`/chat/completions`), with the prompt sent as a
//!   single user message
//! - Health checks (`/models`)

use std::time::Duration;

use async_trait::async_trait;
use askbook_config::CompletionApi;
use askbook_core::error::ProviderError;
use askbook_core::provider::*;
use serde::Deserialize;
use tracing::{debug, warn};

/// Seconds to wait after a 429 that carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// An OpenAI-compatible provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    completion_api: CompletionApi,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            completion_api: CompletionApi::default(),
            timeout,
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
            Duration::from_secs(30),
        )
    }

    /// Choose which completion endpoint to call.
    pub fn with_completion_api(mut self, api: CompletionApi) -> Self {
        self.completion_api = api;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        check_status(response).await
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout.as_secs())
        } else {
            ProviderError::Network(e.to_string())
        }
    }

    fn completions_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.config.model,
            "prompt": request.prompt,
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_output_tokens,
        })
    }

    fn chat_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.config.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_output_tokens,
            "stream": false,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let body = serde_json::json!({
            "model": request.model,
            "input": request.input,
            "encoding_format": "float",
        });

        debug!(
            provider = %self.name,
            model = %request.model,
            purpose = ?request.purpose,
            "Sending embedding request"
        );

        let response = self.post_json("embeddings", &body).await?;
        let api_resp: EmbeddingApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("embedding response: {e}")))?;

        let embedding = api_resp
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::MalformedResponse("No embedding in response".into()))?;

        let usage = api_resp.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: 0,
            total_tokens: u.total_tokens,
        });

        Ok(EmbeddingResponse {
            embedding,
            model: api_resp.model,
            usage,
        })
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        debug!(
            provider = %self.name,
            model = %request.config.model,
            api = ?self.completion_api,
            prompt_len = request.prompt.len(),
            "Sending completion request"
        );

        let (text, model, usage) = match self.completion_api {
            CompletionApi::Completions => {
                let response = self
                    .post_json("completions", &Self::completions_body(&request))
                    .await?;
                let api_resp: CompletionsApiResponse = response.json().await.map_err(|e| {
                    ProviderError::MalformedResponse(format!("completion response: {e}"))
                })?;
                let choice = api_resp.choices.into_iter().next().ok_or_else(|| {
                    ProviderError::MalformedResponse("No choices in response".into())
                })?;
                (choice.text, api_resp.model, api_resp.usage)
            }
            CompletionApi::Chat => {
                let response = self
                    .post_json("chat/completions", &Self::chat_body(&request))
                    .await?;
                let api_resp: ChatApiResponse = response.json().await.map_err(|e| {
                    ProviderError::MalformedResponse(format!("chat response: {e}"))
                })?;
                let choice = api_resp.choices.into_iter().next().ok_or_else(|| {
                    ProviderError::MalformedResponse("No choices in response".into())
                })?;
                (
                    choice.message.content.unwrap_or_default(),
                    api_resp.model,
                    api_resp.usage,
                )
            }
        };

        Ok(CompletionResponse {
            text,
            model,
            usage: usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(response.status().is_success())
    }
}

/// Map non-success statuses to provider errors.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}

// --- API types ---

#[derive(Debug, Deserialize)]
struct CompletionsApiResponse {
    model: String,
    choices: Vec<CompletionsChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<EmbeddingApiUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiUsage {
    prompt_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn provider(base_url: &str) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new("test", base_url, "sk-test", Duration::from_secs(5)).unwrap()
    }

    fn completion_request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            prompt: prompt.into(),
            config: CompletionConfig::deterministic("text-davinci-003"),
        }
    }

    #[test]
    fn openai_constructor() {
        let p = OpenAiCompatProvider::openai("sk-test").unwrap();
        assert_eq!(p.name(), "openai");
        assert_eq!(p.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(provider("http://localhost:9/v1/").base_url(), "http://localhost:9/v1");
    }

    #[test]
    fn completions_body_carries_generation_settings() {
        let body = OpenAiCompatProvider::completions_body(&completion_request("Q: hi\n\nA: "));
        assert_eq!(body["model"], "text-davinci-003");
        assert_eq!(body["prompt"], "Q: hi\n\nA: ");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 150);
    }

    #[test]
    fn chat_body_wraps_prompt_in_one_user_message() {
        let body = OpenAiCompatProvider::chat_body(&completion_request("hello"));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 150);
    }

    #[test]
    fn parse_embedding_response() {
        let data = r#"{
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
            "model": "text-search-curie-query-001",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(parsed.model, "text-search-curie-query-001");
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 8);
    }

    #[test]
    fn parse_completions_response() {
        let data = r#"{
            "id": "cmpl-1",
            "model": "text-davinci-003",
            "choices": [{"text": " Start small.", "index": 0, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 900, "completion_tokens": 4, "total_tokens": 904}
        }"#;
        let parsed: CompletionsApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].text, " Start small.");
        assert_eq!(parsed.usage.unwrap().total_tokens, 904);
    }

    #[test]
    fn parse_chat_response_with_null_content() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }"#;
        let parsed: ChatApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert!(parsed.usage.is_none());
    }

    #[tokio::test]
    async fn embed_against_local_server() {
        let router = Router::new().route(
            "/v1/embeddings",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                assert_eq!(body["input"], "What is Gumroad?");
                axum::Json(serde_json::json!({
                    "data": [{"embedding": [0.5, -0.5], "index": 0}],
                    "model": body["model"],
                    "usage": {"prompt_tokens": 4, "total_tokens": 4}
                }))
            }),
        );
        let p = provider(&serve(router).await);

        let resp = p
            .embed(EmbeddingRequest {
                model: "text-search-curie-query-001".into(),
                input: "What is Gumroad?".into(),
                purpose: EmbeddingPurpose::Query,
            })
            .await
            .unwrap();
        assert_eq!(resp.embedding, vec![0.5, -0.5]);
        assert_eq!(resp.model, "text-search-curie-query-001");
    }

    #[tokio::test]
    async fn complete_uses_the_configured_endpoint() {
        let router = Router::new()
            .route(
                "/v1/completions",
                post(|| async {
                    axum::Json(serde_json::json!({
                        "model": "text-davinci-003",
                        "choices": [{"text": " legacy "}]
                    }))
                }),
            )
            .route(
                "/v1/chat/completions",
                post(|| async {
                    axum::Json(serde_json::json!({
                        "model": "gpt-4o-mini",
                        "choices": [{"message": {"role": "assistant", "content": "chat"}}]
                    }))
                }),
            );
        let base = serve(router).await;

        let legacy = provider(&base)
            .complete(completion_request("p"))
            .await
            .unwrap();
        assert_eq!(legacy.text, " legacy ");

        let chat = provider(&base)
            .with_completion_api(CompletionApi::Chat)
            .complete(completion_request("p"))
            .await
            .unwrap();
        assert_eq!(chat.text, "chat");
        assert_eq!(chat.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let router = Router::new()
            .route(
                "/v1/embeddings",
                post(|| async {
                    (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "12")], "slow down")
                        .into_response()
                }),
            )
            .route(
                "/v1/completions",
                post(|| async { (StatusCode::UNAUTHORIZED, "bad key").into_response() }),
            )
            .route(
                "/v1/chat/completions",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down").into_response() }),
            );
        let base = serve(router).await;

        let err = provider(&base)
            .embed(EmbeddingRequest {
                model: "m".into(),
                input: "x".into(),
                purpose: EmbeddingPurpose::Query,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: 12
            }
        ));

        let err = provider(&base)
            .complete(completion_request("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));

        let err = provider(&base)
            .with_completion_api(CompletionApi::Chat)
            .complete(completion_request("p"))
            .await
            .unwrap_err();
        match err {
            ProviderError::ApiError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let router = Router::new().route(
            "/v1/completions",
            post(|| async { axum::Json(serde_json::json!({"model": "m", "choices": []})) }),
        );
        let err = provider(&serve(router).await)
            .complete(completion_request("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }
}
