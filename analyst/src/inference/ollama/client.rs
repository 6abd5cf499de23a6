//! Ollama HTTP client implementation.

use crate::inference::ollama::mapping::{
    OllamaChatRequest, OllamaChatResponse, OllamaErrorResponse, create_request, map_response,
};
use crate::inference::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES, RetryConfig};
use crate::infrastructure::config::InferenceSettings;
use agent_sdk::{ChatRequest, ChatResponse, InferenceError, LLMProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server, with a trailing slash
    pub base_url: Url,
    /// Bearer token for servers behind an authenticating proxy
    pub api_key: Option<SecretString>,
    /// Maximum number of retries for rate limits and transient errors
    pub max_retries: Option<u32>,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: Option<u64>,
    /// Per-request timeout
    pub request_timeout: Option<Duration>,
}

impl OllamaConfig {
    /// Creates a new config with default retry settings
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            max_retries: None,
            base_delay_ms: None,
            request_timeout: None,
        }
    }

    /// Builds the config from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self, InferenceError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            InferenceError::ConfigError(format!("Invalid base URL '{}': {e}", settings.base_url))
        })?;

        let mut config = Self::new(base_url)
            .with_max_retries(settings.max_retries)
            .with_request_timeout(Duration::from_secs(settings.request_timeout_secs));
        config.api_key.clone_from(&settings.api_key);
        Ok(config)
    }

    /// Sets the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the maximum number of retries
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the base delay for exponential backoff
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.base_delay_ms = Some(delay_ms);
        self
    }

    /// Sets the per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Provider implementation for Ollama's chat API.
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
    retry_config: RetryConfig,
}

impl OllamaProvider {
    /// Creates a new Ollama provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, InferenceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| InferenceError::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry_config: RetryConfig::new()
                .with_max_retries(config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
                .with_base_delay_ms(config.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
            config,
        })
    }

    /// Returns the retry policy in effect.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        self.retry_config
    }

    /// Makes a single request attempt
    async fn make_request(
        &self,
        provider_req: &OllamaChatRequest,
    ) -> Result<ChatResponse, (InferenceError, bool)> {
        let request = self
            .build_api_request(provider_req)
            .map_err(|e| (e, false))?;

        let res = request.send().await.map_err(|e| {
            (
                InferenceError::NetworkError(e.to_string()),
                true, // Retry network errors
            )
        })?;

        map_api_response(res, &provider_req.model).await
    }

    fn build_api_request(
        &self,
        provider_req: &OllamaChatRequest,
    ) -> Result<reqwest::RequestBuilder, InferenceError> {
        let url = self
            .config
            .base_url
            .join("api/chat")
            .map_err(|e| InferenceError::ConfigError(format!("Invalid URL join: {e}")))?;

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(provider_req);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }
        Ok(request)
    }
}

async fn map_api_response(
    res: reqwest::Response,
    model: &str,
) -> Result<ChatResponse, (InferenceError, bool)> {
    let status = res.status();
    match status {
        StatusCode::OK => {
            let body: OllamaChatResponse = res.json().await.map_err(|e| {
                (
                    InferenceError::ParseError(format!("Parse error: {e}")),
                    false,
                )
            })?;

            map_response(body).map_err(|msg| (InferenceError::ParseError(msg), false))
        }
        StatusCode::TOO_MANY_REQUESTS => Err((InferenceError::RateLimit, true)),
        StatusCode::NOT_FOUND => Err((
            InferenceError::InvalidModel {
                model: model.to_string(),
            },
            false,
        )),
        StatusCode::BAD_REQUEST => {
            let text = error_text(res).await;
            if text.contains("context") {
                Err((InferenceError::ContextLengthExceeded, false))
            } else {
                Err((
                    InferenceError::ProviderError(format!("Bad Request: {text}")),
                    false,
                ))
            }
        }
        _ => {
            let text = error_text(res).await;
            let error = InferenceError::ProviderError(format!("HTTP {status}: {text}"));
            let retry = error.is_retryable();
            Err((error, retry))
        }
    }
}

// Ollama wraps errors as {"error": "..."}; fall back to the raw body.
async fn error_text(res: reqwest::Response) -> String {
    let text = res.text().await.unwrap_or_default();
    serde_json::from_str::<OllamaErrorResponse>(&text).map_or(text, |body| body.error)
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InferenceError> {
        let provider_req = create_request(request);
        debug!(
            model = %provider_req.model,
            messages = provider_req.messages.len(),
            "Sending chat request"
        );

        let mut last_error = InferenceError::NetworkError("No attempts made".to_string());

        for attempt in 0..=self.retry_config.max_retries {
            match self.make_request(&provider_req).await {
                Ok(response) => return Ok(response),
                Err((error, should_retry)) => {
                    last_error = error;

                    if !should_retry || attempt >= self.retry_config.max_retries {
                        break;
                    }

                    let delay = self.retry_config.calculate_backoff_delay(attempt);
                    let delay_ms: u64 = delay.as_millis().try_into().unwrap_or(u64::MAX);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.retry_config.max_retries,
                        delay_ms = delay_ms,
                        error = %last_error,
                        "Ollama request failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        debug!(
            attempts = self.retry_config.max_retries + 1,
            "All Ollama retry attempts exhausted"
        );
        Err(last_error)
    }
}
