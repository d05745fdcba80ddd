// Azure OpenAI adapter.
//
// Azure's chat-completions dialect differs from the public OpenAI API:
// the deployment name is part of the path, the API version is a query
// parameter, and authentication uses an `api-key` header.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmAdapter, TokenUsage};
use crate::types::{AppError, AppResult};

pub struct AzureOpenAiAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
}

#[derive(Serialize)]
struct AzureChatRequest<'a> {
    messages: &'a [crate::llm::provider::ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AzureChatResponse {
    choices: Vec<AzureChoice>,
    #[serde(default)]
    usage: Option<AzureUsage>,
}

#[derive(Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct AzureResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct AzureUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct AzureErrorResponse {
    error: AzureError,
}

#[derive(Deserialize)]
struct AzureError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl AzureOpenAiAdapter {
    pub fn new(config: &LlmConfig) -> Self {
        Self::with_endpoint(
            &config.azure_endpoint,
            &config.azure_api_key,
            &config.azure_api_version,
            &config.azure_deployment,
        )
    }

    pub fn with_endpoint(endpoint: &str, api_key: &str, api_version: &str, deployment: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_version: api_version.to_string(),
            deployment: deployment.to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl LlmAdapter for AzureOpenAiAdapter {
    async fn create_chat_completion(
        &self,
        request: &CompletionRequest,
    ) -> AppResult<CompletionResponse> {
        let azure_request = AzureChatRequest {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&azure_request)
            .send()
            .await
            .map_err(|e| AppError::LlmApi(format!("Azure OpenAI request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<AzureErrorResponse>(&error_text) {
                return Err(AppError::LlmApi(format!(
                    "Azure OpenAI error ({}): {} (code: {:?})",
                    status, error_response.error.message, error_response.error.code
                )));
            }

            return Err(AppError::LlmApi(format!(
                "Azure OpenAI error ({}): {}",
                status, error_text
            )));
        }

        let azure_response: AzureChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::LlmApi(format!("Failed to parse Azure OpenAI response: {}", e)))?;

        let choice = azure_response
            .choices
            .first()
            .ok_or_else(|| AppError::LlmApi("Azure OpenAI returned no choices".to_string()))?;

        let usage = azure_response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.clone().unwrap_or_default(),
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system("You are a medical conversation analysis AI."),
                ChatMessage::user("Please analyze this transcript."),
            ],
            max_tokens: Some(1500),
            temperature: Some(0.3),
        }
    }

    #[test]
    fn test_completions_url_layout() {
        let adapter = AzureOpenAiAdapter::with_endpoint(
            "https://example.openai.azure.com/",
            "key",
            "2024-02-15-preview",
            "gpt-4o",
        );
        assert_eq!(
            adapter.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[tokio::test]
    async fn test_parses_successful_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                "2024-02-15-preview".into(),
            ))
            .match_header("api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "choices": [{
                        "message": { "role": "assistant", "content": "{\"summary\": \"ok\"}" },
                        "finish_reason": "stop"
                    }],
                    "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
                }"#,
            )
            .create_async()
            .await;

        let adapter = AzureOpenAiAdapter::with_endpoint(
            &server.url(),
            "test-key",
            "2024-02-15-preview",
            "gpt-4o",
        );
        let response = adapter.create_chat_completion(&request()).await.unwrap();
        assert_eq!(response.content, "{\"summary\": \"ok\"}");
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 15);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid api key", "code": "401"}}"#)
            .create_async()
            .await;

        let adapter =
            AzureOpenAiAdapter::with_endpoint(&server.url(), "bad-key", "2024-02-15-preview", "gpt-4o");
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        match err {
            AppError::LlmApi(message) => assert!(message.contains("invalid api key")),
            other => panic!("expected LlmApi error, got {:?}", other),
        }
    }
}
