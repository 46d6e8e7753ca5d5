// Groq chat-completions client and upstream schema

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::error::ProxyError;
use super::gemini::GenerationInput;

const FALLBACK_UPSTREAM_MESSAGE: &str = "Upstream request failed";

#[derive(Debug, Clone, Serialize)]
pub struct GroqMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroqChatRequest {
    pub model: String,
    pub messages: Vec<GroqMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GroqChatRequest {
    /// Deterministic assembly from the extracted input plus the fixed
    /// model identifier.
    pub fn from_input(input: &GenerationInput, model: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: input.prompt.clone(),
            }],
            max_tokens: input.max_output_tokens,
            temperature: input.temperature,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroqClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// One attempt against the chat-completions endpoint. A semantic
    /// rejection (non-2xx) becomes `ProxyError::Upstream` with the
    /// upstream's own status code; transport failures become timeout or
    /// internal errors.
    pub async fn chat_completion(
        &self,
        api_key: &str,
        request: &GroqChatRequest,
    ) -> Result<Value, ProxyError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(upstream_error(status.as_u16(), &body));
        }

        response.json().await.map_err(transport_error)
    }
}

fn transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::UpstreamTimeout
    } else {
        ProxyError::Internal(err.to_string())
    }
}

/// Upstream failure mapping: status code verbatim, upstream message when
/// present, generic fallback otherwise.
pub fn upstream_error(code: u16, body: &Value) -> ProxyError {
    let message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or(FALLBACK_UPSTREAM_MESSAGE)
        .to_string();
    ProxyError::Upstream { code, message }
}

/// First completion's text; absent at any level degrades to "".
pub fn completion_text(body: &Value) -> &str {
    body.get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_is_a_single_user_message() {
        let input = GenerationInput {
            prompt: "Translate bonjour".to_string(),
            max_output_tokens: 1024,
            temperature: 0.2,
        };
        let request = GroqChatRequest::from_input(&input, "llama-3.3-70b-versatile");
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "Translate bonjour");
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, 0.2);
    }

    #[test]
    fn completion_text_reads_first_choice() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Bonjour" } }]
        });
        assert_eq!(completion_text(&body), "Bonjour");
        assert_eq!(completion_text(&json!({})), "");
        assert_eq!(completion_text(&json!({ "choices": [] })), "");
    }

    #[test]
    fn upstream_error_prefers_the_upstream_message() {
        let err = upstream_error(429, &json!({ "error": { "message": "Rate limit reached" } }));
        match err {
            ProxyError::Upstream { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn upstream_error_falls_back_to_a_generic_message() {
        let err = upstream_error(500, &Value::Null);
        match err {
            ProxyError::Upstream { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, FALLBACK_UPSTREAM_MESSAGE);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
