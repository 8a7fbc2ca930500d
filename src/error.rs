#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Markers in an error body that indicate the service's quota was hit.
const RATE_LIMIT_MARKERS: [&str; 3] = ["429", "RESOURCE_EXHAUSTED", "quota"];

/// Errors that can come out of a grading run.
///
/// Only [`GraderError::Configuration`] and [`GraderError::Aggregation`] ever
/// abort a run; the other two are absorbed per criterion by
/// [`crate::grader::CriterionGrader`].
#[derive(thiserror::Error, Debug)]
pub enum GraderError {
    /// The evaluation transport could not be constructed, usually because the
    /// API key is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The rubric did not yield anything to grade against.
    #[error("Cannot grade submissions: {0}")]
    Aggregation(String),
    /// The external service could not produce a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The external service responded, but not in the expected shape.
    #[error(transparent)]
    ResponseFormat(#[from] ResponseFormatError),
}

impl GraderError {
    /// Whether this error must abort the whole run instead of a single
    /// criterion.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Aggregation(_))
    }
}

/// Failures of a single evaluation call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service rejected the call because of rate limits or quota.
    #[error("rate limited by evaluation service: {message}")]
    RateLimited {
        /// HTTP status, when the failure came with one
        status:  Option<u16>,
        /// Error text returned by the service
        message: String,
    },
    /// The service answered with a non-success status.
    #[error("evaluation request failed with HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body:   String,
    },
    /// The request never reached the service, or the connection broke.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered successfully but without usable text.
    #[error("invalid evaluation response: {0}")]
    InvalidResponse(String),
    /// Every retry was spent on rate-limit failures.
    #[error("evaluation service still rate limited after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total number of attempts made
        attempts: u32,
        /// The last rate-limit error seen
        last:     Box<TransportError>,
    },
}

impl TransportError {
    /// Classifies a failed HTTP exchange as a rate limit or a plain status
    /// error.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 || contains_rate_limit_marker(&body) {
            Self::RateLimited {
                status:  Some(status),
                message: body,
            }
        } else {
            Self::Status { status, body }
        }
    }

    /// Whether the call may succeed if retried after a delay.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Status { status, body } => *status == 429 || contains_rate_limit_marker(body),
            Self::Network(message) | Self::InvalidResponse(message) => {
                contains_rate_limit_marker(message)
            }
            Self::RetriesExhausted { .. } => false,
        }
    }
}

/// Returns true if `text` carries one of the service's quota signatures.
fn contains_rate_limit_marker(text: &str) -> bool {
    RATE_LIMIT_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Ways a free-text evaluation response can fail validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormatError {
    /// No `SCORE:` line followed by an integer.
    #[error("AI response did not contain a valid score")]
    MissingScore,
    /// The score was present but outside `[0, max_score]`.
    #[error("AI response contained an invalid score ({score} is not between 0 and {max_score})")]
    ScoreOutOfRange {
        /// Score as written by the service
        score:     String,
        /// Largest score allowed for the criterion
        max_score: u32,
    },
}
