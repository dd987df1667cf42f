//! Remote model caller speaking the OpenAI-compatible chat-completions API.
//!
//! Requires the `remote` feature. Without it the caller still exists (so
//! settings with a credential keep working) but every attempt fails with a
//! transport error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{secrets::ApiCredential, CallError, ModelCaller};

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// HTTP caller for a hosted model.
///
/// # Security
///
/// The key is an [`ApiCredential`]: it cannot be printed via `Debug` or
/// `Display` and is only exposed when the `Authorization` header is set.
pub struct RemoteCaller {
    credential: Arc<ApiCredential>,
    endpoint: String,
    model: String,
    #[cfg(feature = "remote")]
    client: reqwest::Client,
}

impl std::fmt::Debug for RemoteCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCaller")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl RemoteCaller {
    pub fn new(
        credential: Arc<ApiCredential>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            credential,
            endpoint: endpoint.into(),
            model: model.into(),
            #[cfg(feature = "remote")]
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    type_: &'static str,
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(not(feature = "remote"), allow(dead_code))]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(not(feature = "remote"), allow(dead_code))]
struct ApiErrorDetail {
    message: String,
}

#[cfg_attr(not(feature = "remote"), allow(dead_code))]
fn build_request<'a>(model: &'a str, prompt: &'a str, system_prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system_prompt,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: 0.0,
        response_format: ResponseFormat {
            type_: "json_object",
        },
    }
}

#[cfg_attr(not(feature = "remote"), allow(dead_code))]
fn extract_content(body: ChatResponse) -> Result<String, CallError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| CallError::Transport("empty completion from model".to_string()))
}

#[async_trait]
impl ModelCaller for RemoteCaller {
    #[cfg(feature = "remote")]
    async fn invoke(
        &self,
        prompt: &str,
        system_prompt: &str,
        timeout: Duration,
    ) -> Result<String, CallError> {
        let request = build_request(&self.model, prompt, system_prompt);

        // SECURITY: Only expose the credential here, at the point of use
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(CallError::Transport(format!(
                "API error: {} - {}",
                status.as_u16(),
                message
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| classify(e, timeout))?;
        extract_content(body)
    }

    #[cfg(not(feature = "remote"))]
    async fn invoke(
        &self,
        _prompt: &str,
        _system_prompt: &str,
        _timeout: Duration,
    ) -> Result<String, CallError> {
        Err(CallError::Transport(
            "remote caller requires the 'remote' feature".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(feature = "remote")]
fn classify(error: reqwest::Error, timeout: Duration) -> CallError {
    if error.is_timeout() {
        CallError::Timeout(timeout)
    } else if error.is_decode() {
        CallError::Transport(format!("JSON parse error: {}", error))
    } else {
        CallError::Transport(format!("HTTP request failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CredentialSource;

    fn caller(key: &str) -> RemoteCaller {
        RemoteCaller::new(
            Arc::new(ApiCredential::new(
                key,
                CredentialSource::Programmatic,
                "LLM API key",
            )),
            DEFAULT_ENDPOINT,
            DEFAULT_MODEL,
        )
    }

    #[test]
    fn test_request_shape() {
        let request = build_request("gpt-4o-mini", "ticket prompt", "system rules");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "system rules");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "ticket prompt");
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_extract_first_choice() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"category\":\"Bug\"}"}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_content(body).unwrap(), "{\"category\":\"Bug\"}");
    }

    #[test]
    fn test_empty_choices_is_transport_error() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        let err = extract_content(body).unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret = "sk-super-secret-key-12345";
        let debug = format!("{:?}", caller(secret));

        assert!(!debug.contains(secret), "API key was exposed in Debug output!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_caller_name() {
        let caller = caller("sk-test");
        assert_eq!(caller.name(), "remote");
        assert_eq!(caller.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(caller.model(), DEFAULT_MODEL);
    }
}
