use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AiClient, AiError, AiRequest};
use crate::config::AiConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_body(request: AiRequest) -> GenerateRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = request.image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: Base64::encode_string(&image.data),
                },
            });
        }
        parts.push(Part::Text {
            text: request.instruction,
        });
        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: request.json_response.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        }
    }

    fn collect_text(response: GenerateResponse) -> Option<String> {
        let text: String = response
            .candidates?
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text),
                Part::Inline { .. } => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl AiClient for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.model, has_image = request.image.is_some()))]
    async fn generate(&self, request: AiRequest) -> Result<String, AiError> {
        let body = Self::build_body(request);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, "generateContent failed");
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        if let Some(err) = parsed.error {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: err.message,
            });
        }
        let text = Self::collect_text(parsed).ok_or(AiError::EmptyResponse)?;
        debug!(chars = text.len(), "generateContent ok");
        Ok(text)
    }
}
