//! Structured-completion advisory client
//!
//! Typed wrapper around an OpenAI-style chat-completions endpoint:
//! - Request building with strict JSON-schema response format
//! - Model parameter validation before any network I/O
//! - Hard 30-second timeout enforced via cancellation
//! - Full HTTP-status-to-error-kind mapping
//! - Response shape validation (choices, finish_reason, content)
//!
//! Single attempt per call, no automatic retry. The instance is stateless
//! apart from immutable configuration, so one client may serve concurrent
//! calls; each call builds its own request and deadline.

use crate::config::AdvisorySettings;
use crate::errors::{AdvisoryError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard deadline for one advisory call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback retry delay when a 429 carries no usable Retry-After header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Sampling parameters forwarded to the completion endpoint.
///
/// All fields optional; unset fields are omitted from the wire request and
/// the remote service applies its own defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelParams {
    /// Check every set parameter against the endpoint's documented bounds.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(AdvisoryError::Validation(format!(
                    "temperature must be within [0, 2], got {}",
                    t
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(AdvisoryError::Validation(format!(
                    "top_p must be within [0, 1], got {}",
                    p
                )));
            }
        }
        if let Some(f) = self.frequency_penalty {
            if !(-2.0..=2.0).contains(&f) {
                return Err(AdvisoryError::Validation(format!(
                    "frequency_penalty must be within [-2, 2], got {}",
                    f
                )));
            }
        }
        if let Some(p) = self.presence_penalty {
            if !(-2.0..=2.0).contains(&p) {
                return Err(AdvisoryError::Validation(format!(
                    "presence_penalty must be within [-2, 2], got {}",
                    p
                )));
            }
        }
        if let Some(m) = self.max_tokens {
            if m == 0 {
                return Err(AdvisoryError::Validation(
                    "max_tokens must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// One structured-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Name the schema is registered under in the response_format block.
    pub schema_name: String,
    /// JSON schema the response content must satisfy; sent with strict mode.
    pub response_schema: serde_json::Value,
    /// Override for the configured default model.
    pub model: Option<String>,
    pub params: Option<ModelParams>,
}

/// Client for the remote structured-completion service.
#[derive(Debug, Clone)]
pub struct AdvisoryClient {
    client: Client,
    settings: AdvisorySettings,
}

impl AdvisoryClient {
    /// Create a client, validating local configuration up front.
    ///
    /// An empty credential or one without the expected "sk-" prefix is a
    /// `Config` error raised here, before any network I/O ever happens.
    pub fn new(settings: AdvisorySettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(AdvisoryError::Config(
                "advisory API key is not set".to_string(),
            ));
        }
        if !settings.api_key.starts_with("sk-") {
            return Err(AdvisoryError::Config(
                "advisory API key does not match the expected sk- format".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(AdvisoryError::Network)?;

        Ok(Self { client, settings })
    }

    /// Default model tag this client sends when a request does not override it.
    pub fn model(&self) -> &str {
        self.settings.model()
    }

    /// Issue one completion call and parse the content as `T`.
    ///
    /// Parameter validation happens before the request is sent. The whole
    /// exchange (connect, send, read body) runs under a 30-second deadline;
    /// when it elapses the future is dropped, aborting the connection, and
    /// `Timeout` is returned. A timed-out call is terminal and never retried
    /// here.
    pub async fn complete<T: DeserializeOwned>(&self, request: CompletionRequest) -> Result<T> {
        if let Some(params) = &request.params {
            params.validate()?;
        }

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.settings.model().to_string());
        let body = self.build_body(&request, &model);
        let url = format!("{}/chat/completions", self.settings.base_url());

        let exchange = async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.settings.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, retry_after, text))
        };

        let (status, retry_after, text) = tokio::time::timeout(REQUEST_TIMEOUT, exchange)
            .await
            .map_err(|_| AdvisoryError::Timeout {
                secs: REQUEST_TIMEOUT.as_secs(),
            })?
            .map_err(AdvisoryError::Network)?;

        if !(200..300).contains(&status) {
            return Err(classify_http_failure(
                status,
                retry_after.as_deref(),
                &text,
                &model,
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            AdvisoryError::Parse {
                message: format!("completion envelope is not valid JSON: {}", e),
                raw: text.clone(),
            }
        })?;
        let content = extract_content(parsed)?;

        serde_json::from_str(&content).map_err(|e| AdvisoryError::Parse {
            message: format!("completion content does not match the declared schema: {}", e),
            raw: content.clone(),
        })
    }

    fn build_body(&self, request: &CompletionRequest, model: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.response_schema
                }
            }
        });

        if let Some(params) = &request.params {
            let extra = serde_json::to_value(params).unwrap_or_default();
            if let (Some(obj), serde_json::Value::Object(extra)) = (body.as_object_mut(), extra) {
                for (k, v) in extra {
                    obj.insert(k, v);
                }
            }
        }

        body
    }
}

/// Map an HTTP error status to its error kind.
///
/// `requested_model` is echoed into the 404 variant when the server body
/// does not name the model itself.
fn classify_http_failure(
    status: u16,
    retry_after: Option<&str>,
    body: &str,
    requested_model: &str,
) -> AdvisoryError {
    let detail = parse_error_detail(body);

    match status {
        401 => AdvisoryError::Auth(
            detail.unwrap_or_else(|| "credential rejected by advisory service".to_string()),
        ),
        429 => AdvisoryError::RateLimited {
            retry_after_secs: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        400 => AdvisoryError::Validation(
            detail.unwrap_or_else(|| "advisory service rejected the request".to_string()),
        ),
        404 => AdvisoryError::Model {
            model: detail.unwrap_or_else(|| requested_model.to_string()),
        },
        402 => AdvisoryError::Payment(
            detail.unwrap_or_else(|| "advisory account requires payment".to_string()),
        ),
        _ => AdvisoryError::Api {
            status,
            body: body.to_string(),
        },
    }
}

/// Pull the human-readable detail out of an OpenAI-style error body, if any.
fn parse_error_detail(body: &str) -> Option<String> {
    let envelope: ApiErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = envelope.error?.message?;
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Validate the successful envelope and pull out the message content.
///
/// HTTP success is necessary but not sufficient: the envelope must carry at
/// least one choice with non-empty content, and a truncated response
/// (finish_reason "length") is an error even on status 200.
fn extract_content(response: ChatResponse) -> Result<String> {
    let choice = match response.choices.into_iter().next() {
        Some(c) => c,
        None => {
            return Err(AdvisoryError::Parse {
                message: "completion contained no choices".to_string(),
                raw: String::new(),
            })
        }
    };

    if choice.finish_reason.as_deref() == Some("length") {
        return Err(AdvisoryError::TokenLimit);
    }

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(AdvisoryError::Parse {
            message: "completion choice had empty content".to_string(),
            raw: String::new(),
        }),
    }
}

/// Chat completions success envelope (the fields this crate consumes).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Chat completions error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}
