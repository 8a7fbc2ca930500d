#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EvaluationRequest, Transport};
use crate::{
    config::GraderConfig,
    error::{GraderError, TransportError},
    types::Submission,
};

/// Content categories that the service is asked to filter.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Blocking threshold applied to every safety category.
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Request body for `models/{model}:generateContent`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    /// A single user turn
    contents:          Vec<Content<'a>>,
    /// Sampling parameters
    generation_config: GenerationConfig,
    /// Content filters
    safety_settings:   Vec<SafetySetting>,
}

/// One conversation turn.
#[derive(Serialize, Debug)]
struct Content<'a> {
    /// Prompt text and attachments
    parts: Vec<Part<'a>>,
}

/// A prompt or attachment within a turn.
#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part<'a> {
    /// Plain text
    Text {
        /// Text contents
        text: &'a str,
    },
    /// Base64-encoded file
    InlineData {
        /// Attachment payload
        inline_data: InlineData<'a>,
    },
}

/// Attachment payload.
#[derive(Serialize, Debug)]
struct InlineData<'a> {
    /// MIME type of the file
    mime_type: &'a str,
    /// Base64 file contents
    data:      String,
}

impl<'a> Part<'a> {
    /// Encodes a submission as an inline attachment.
    fn attachment(file: &'a Submission) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: file.mime_type(),
                data:      general_purpose::STANDARD.encode(file.bytes()),
            },
        }
    }
}

/// Sampling parameters sent with every call.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    /// Sampling temperature
    temperature:       f32,
    /// Response length limit
    max_output_tokens: u32,
    /// Nucleus sampling cutoff
    top_p:             f32,
    /// Top-k sampling cutoff
    top_k:             u32,
}

/// Filter threshold for one content category.
#[derive(Serialize, Debug)]
struct SafetySetting {
    /// Harm category name
    category:  &'static str,
    /// Blocking threshold
    threshold: &'static str,
}

/// The parts of a `generateContent` response that carry text.
#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    /// Candidate completions
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Deserialize, Debug)]
struct Candidate {
    /// Generated content, absent when the candidate was blocked
    content: Option<CandidateContent>,
}

/// Content of a candidate.
#[derive(Deserialize, Debug)]
struct CandidateContent {
    /// Generated parts
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// A generated part.
#[derive(Deserialize, Debug)]
struct CandidatePart {
    /// Text, for text parts
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Transport that calls a `generateContent` HTTP endpoint with inline
/// attachments.
#[derive(Debug, Clone)]
pub struct GenerateContentTransport {
    /// Shared HTTP client
    http:     Client,
    /// Fully qualified `generateContent` URL
    endpoint: String,
    /// API key sent with every request
    api_key:  String,
    /// Source of sampling parameters
    config:   GraderConfig,
}

impl GenerateContentTransport {
    /// Builds the transport from configuration.
    ///
    /// Fails with [`GraderError::Configuration`] when no API key is set or the
    /// HTTP client cannot be constructed.
    pub fn connect(config: &GraderConfig) -> Result<Self, GraderError> {
        let api_key = config.api_key().map(str::to_owned).ok_or_else(|| {
            GraderError::Configuration(
                "GRADER_API_KEY is missing. Set it in the environment or a .env file.".to_string(),
            )
        })?;

        let http = Client::builder()
            // Avoid macOS dynamic store lookups that fail in sandboxed environments.
            .no_proxy()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                GraderError::Configuration(format!("Failed to construct HTTP client: {e}"))
            })?;

        let endpoint = format!("{}/models/{}:generateContent", config.api_base(), config.model());

        Ok(Self {
            http,
            endpoint,
            api_key,
            config: config.clone(),
        })
    }

    /// URL that requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Assembles the request body for one evaluation.
    fn body<'a>(&self, request: EvaluationRequest<'a>) -> GenerateContentRequest<'a> {
        let mut parts = vec![
            Part::Text {
                text: request.prompt,
            },
            Part::attachment(request.submission),
        ];
        if let Some(reference) = request.reference {
            parts.push(Part::attachment(reference));
        }

        GenerateContentRequest {
            contents:          vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature:       self.config.temperature(),
                max_output_tokens: self.config.max_output_tokens(),
                top_p:             self.config.top_p(),
                top_k:             self.config.top_k(),
            },
            safety_settings:   SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        }
    }
}

impl Transport for GenerateContentTransport {
    async fn evaluate(&self, request: EvaluationRequest<'_>) -> Result<String, TransportError> {
        let body = self.body(request);
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            tracing::error!(status = status.as_u16(), body = %text, "Evaluation service error");
            return Err(TransportError::from_status(status.as_u16(), text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        parsed.into_text().ok_or_else(|| {
            TransportError::InvalidResponse("response did not contain any text".to_string())
        })
    }
}
