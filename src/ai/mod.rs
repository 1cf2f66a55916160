//! Boundary to the generative-AI service.
//!
//! [`AiClient`] is the raw transport (instruction + optional image in, text
//! out). [`AiGateway`] builds the three coaching requests on top of it and
//! normalizes every reply into an [`AiOutcome`] that always carries a usable
//! value.

#[cfg(test)]
pub mod fake;
mod gateway;
mod gemini;
pub mod json;
mod prompts;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use thiserror::Error;

pub use gateway::{AiGateway, BodyCompositionDraft, DailyScore, NutritionEstimate};
#[cfg(test)]
pub use gateway::MEAL_FALLBACK_ADVICE;
pub use gemini::GeminiClient;

#[derive(Debug, Clone)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: Bytes,
}

impl ImagePart {
    #[cfg(test)]
    pub fn jpeg(data: Bytes) -> Self {
        Self {
            mime_type: "image/jpeg".into(),
            data,
        }
    }

    /// Decodes a base64 upload. A `data:<mime>;base64,` prefix, if present,
    /// overrides `content_type`.
    pub fn from_base64(encoded: &str, content_type: Option<&str>) -> Result<Self, base64ct::Error> {
        let encoded = encoded.trim();
        let (mime, payload) = match encoded.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
            Some((mime, payload)) => (Some(mime), payload),
            None => (content_type, encoded),
        };
        let data = Base64::decode_vec(payload)?;
        if data.is_empty() {
            return Err(base64ct::Error::InvalidLength);
        }
        Ok(Self {
            mime_type: mime.filter(|m| !m.is_empty()).unwrap_or("image/jpeg").to_string(),
            data: Bytes::from(data),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, Base64::encode_string(&self.data))
    }
}

#[derive(Debug, Clone)]
pub struct AiRequest {
    pub instruction: String,
    pub image: Option<ImagePart>,
    /// Ask the service for a JSON-only reply.
    pub json_response: bool,
}

impl AiRequest {
    pub fn text(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            image: None,
            json_response: false,
        }
    }

    pub fn json(instruction: impl Into<String>) -> Self {
        Self {
            json_response: true,
            ..Self::text(instruction)
        }
    }

    pub fn with_image(mut self, image: Option<ImagePart>) -> Self {
        self.image = image;
        self
    }
}

#[derive(Error, Debug)]
pub enum AiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response carried no text")]
    EmptyResponse,
}

#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(&self, request: AiRequest) -> Result<String, AiError>;
}

/// Result of one gateway call. Failure variants carry the value callers
/// should fall back to.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome<T> {
    Parsed(T),
    ParseFailure { fallback: T, raw: String },
    RequestFailure { fallback: T, error: String },
}

impl<T> AiOutcome<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, AiOutcome::Parsed(_))
    }

    #[cfg(test)]
    pub fn value(&self) -> &T {
        match self {
            AiOutcome::Parsed(v) => v,
            AiOutcome::ParseFailure { fallback, .. } | AiOutcome::RequestFailure { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            AiOutcome::Parsed(v) => v,
            AiOutcome::ParseFailure { fallback, .. } | AiOutcome::RequestFailure { fallback, .. } => fallback,
        }
    }

    /// `Some` only for a successfully parsed reply.
    pub fn parsed(self) -> Option<T> {
        match self {
            AiOutcome::Parsed(v) => Some(v),
            _ => None,
        }
    }
}
