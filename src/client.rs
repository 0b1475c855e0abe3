use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::types::ChatTurn;

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.8;

/// A chat-completion collaborator. One call, one reply, no retries.
#[async_trait]
pub(crate) trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: Vec<ChatTurn>) -> Result<String, RemoteError>;
}

#[derive(Debug, Serialize)]
struct ChatBody {
    model: String,
    messages: Vec<ChatTurn>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-style `/chat/completions` client.
pub(crate) struct HttpChatClient {
    url: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(config: &RemoteConfig, api_key: String) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            http,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn complete(&self, messages: Vec<ChatTurn>) -> Result<String, RemoteError> {
        let body = ChatBody {
            model: self.model.clone(),
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let mut request = self.http.post(&self.url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized(status.as_u16()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        let completion: Completion =
            serde_json::from_str(&raw).map_err(RemoteError::MalformedBody)?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(RemoteError::MissingContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: &str) -> HttpChatClient {
        let config = RemoteConfig {
            endpoint: format!("{}/v1/", server.uri()),
            api_key: None,
            model: "test-model".to_string(),
            timeout_secs: 5,
        };
        HttpChatClient::new(&config, api_key.to_string()).unwrap()
    }

    fn user_turn(content: &str) -> Vec<ChatTurn> {
        vec![ChatTurn {
            role: Role::User,
            content: content.to_string(),
        }]
    }

    #[tokio::test]
    async fn sends_expected_body_and_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 500,
                "temperature": 0.8,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server, "sk-test")
            .complete(user_turn("hello"))
            .await
            .unwrap();
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn classifies_auth_and_rate_limit_statuses() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server, "sk-test");
        assert!(matches!(
            client.complete(user_turn("a")).await,
            Err(RemoteError::Unauthorized(401))
        ));
        assert!(matches!(
            client.complete(user_turn("b")).await,
            Err(RemoteError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn forbidden_counts_as_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(403).set_body_string("no access"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server, "sk-test").complete(user_turn("a")).await,
            Err(RemoteError::Unauthorized(403))
        ));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        match client_for(&server, "").complete(user_turn("a")).await {
            Err(RemoteError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server, "").complete(user_turn("a")).await,
            Err(RemoteError::MissingContent)
        ));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server, "").complete(user_turn("a")).await,
            Err(RemoteError::MalformedBody(_))
        ));
    }
}
