// Diarization HTTP client.
//
// The upstream endpoint accepts either a JSON body `{"url": ...}` pointing
// at hosted audio, or the raw audio bytes with their content type. Its JSON
// response is passed through unchanged; a non-2xx status is a hard failure
// for the job, never silently swallowed.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::queue::job::DiarizationInput;
use crate::types::{AppError, AppResult};

#[derive(Clone)]
pub struct DiarizationClient {
    client: Client,
    api_url: String,
}

impl DiarizationClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }

    pub async fn diarize(&self, input: &DiarizationInput) -> AppResult<serde_json::Value> {
        let request = match input {
            DiarizationInput::Url { url } => self
                .client
                .post(&self.api_url)
                .json(&serde_json::json!({ "url": url })),
            DiarizationInput::Bytes { content_type, data } => self
                .client
                .post(&self.api_url)
                .header(CONTENT_TYPE, content_type)
                .body(data.clone()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Diarization(format!("request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Diarization(format!(
                "Diarization API error: {} - {}",
                status.as_u16(),
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Diarization(format!("invalid JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_job_passes_response_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/diarize")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "url": "https://x/audio.wav" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"transcript": "Doctor: Hello\n\nPatient: Hi", "speakers": 2}"#)
            .create_async()
            .await;

        let client = DiarizationClient::new(format!("{}/diarize", server.url()));
        let result = client
            .diarize(&DiarizationInput::Url {
                url: "https://x/audio.wav".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result["transcript"], "Doctor: Hello\n\nPatient: Hi");
        assert_eq!(result["speakers"], 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_raw_bytes_are_posted_with_content_type() {
        let mut server = mockito::Server::new_async().await;
        let audio = vec![0x52, 0x49, 0x46, 0x46];
        let mock = server
            .mock("POST", "/diarize")
            .match_header("content-type", "audio/wav")
            .match_body(audio.clone())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"transcript": "Doctor: Hello"}"#)
            .create_async()
            .await;

        let client = DiarizationClient::new(format!("{}/diarize", server.url()));
        let result = client
            .diarize(&DiarizationInput::Bytes {
                content_type: "audio/wav".to_string(),
                data: audio,
            })
            .await
            .unwrap();

        assert_eq!(result["transcript"], "Doctor: Hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upstream_503_is_a_hard_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/diarize")
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let client = DiarizationClient::new(format!("{}/diarize", server.url()));
        let err = client
            .diarize(&DiarizationInput::Url {
                url: "https://x/audio.wav".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            AppError::Diarization(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("service unavailable"));
            }
            other => panic!("expected Diarization error, got {:?}", other),
        }
    }
}
