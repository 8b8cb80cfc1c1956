//! OpenAI-compatible HTTP transport.

use super::client::CompletionTransport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use squadforge_application::ports::completion::{
    CompletionError, CompletionRequest, CompletionResponse,
};
use squadforge_domain::TokenUsage;
use std::time::Duration;
use tracing::debug;

/// POSTs chat requests to `{endpoint}/chat/completions`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Other(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReply,
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn classify(error: reqwest::Error) -> CompletionError {
    if error.is_timeout() || error.is_connect() {
        CompletionError::ConnectionFailed(error.to_string())
    } else {
        CompletionError::Other(error.to_string())
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = WireRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(self.url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        debug!("POST {} -> {}", self.url(), status);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::RateLimited(format!("HTTP 429 {detail}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::Other(format!("HTTP {status}: {detail}")));
        }

        let parsed: WireResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::ConnectionFailed(e.to_string())
            } else {
                CompletionError::Other(format!("Malformed response body: {e}"))
            }
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Other("Response has no choices".to_string()))?;
        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse::new(text, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadforge_domain::{Message, Role};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(
            format!("{}/v1", server.uri()),
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("gpt-test", vec![Message::user("hi")])
    }

    async fn respond_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let transport =
            HttpTransport::new("http://localhost:8080/v1/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(transport.url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_wire_request_shape() {
        let messages = [Message::new(Role::System, "be brief"), Message::user("hi")];
        let body = WireRequest {
            model: "m",
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: 0.5,
            max_tokens: 64,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 64);
    }

    #[test]
    fn test_parse_response() {
        let parsed: WireResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}],
                "usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 2);
    }

    #[tokio::test]
    async fn test_send_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "done"}}],
                "usage": {"prompt_tokens": 7, "completion_tokens": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server).send(&request()).await.unwrap();

        assert_eq!(response.text, "done");
        assert_eq!(response.usage, TokenUsage::new(7, 3));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let server =
            respond_with(ResponseTemplate::new(429).set_body_string("slow down")).await;

        let err = transport(&server).send(&request()).await.unwrap_err();

        assert!(matches!(&err, CompletionError::RateLimited(m) if m.contains("slow down")));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = respond_with(ResponseTemplate::new(500).set_body_string("boom")).await;

        let err = transport(&server).send(&request()).await.unwrap_err();

        assert!(matches!(&err, CompletionError::Other(m) if m.contains("500")));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
        )
        .await;

        let err = transport(&server).send(&request()).await.unwrap_err();

        assert_eq!(err, CompletionError::Other("Response has no choices".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server =
            respond_with(ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = transport(&server).send(&request()).await.unwrap_err();

        assert!(matches!(&err, CompletionError::Other(m) if m.starts_with("Malformed")));
    }

    #[tokio::test]
    async fn test_missing_usage_counts_zero_tokens() {
        let server = respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .await;

        let response = transport(&server).send(&request()).await.unwrap();

        assert_eq!(response.text, "ok");
        assert_eq!(response.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        // The port is free again once the listener drops.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let transport =
            HttpTransport::new(format!("http://{addr}"), None, Duration::from_secs(5)).unwrap();

        let err = transport.send(&request()).await.unwrap_err();

        assert!(matches!(err, CompletionError::ConnectionFailed(_)));
    }
}
