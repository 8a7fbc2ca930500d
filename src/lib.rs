//! # rubric-grader
//!
//! Grades student submission files against a free-text rubric by asking an
//! external multimodal evaluation service to score each rubric criterion,
//! then aggregates the criteria into a per-student result.
//!
//! ```no_run
//! # async fn run() -> Result<(), rubric_grader::GraderError> {
//! use rubric_grader::{
//!     GraderConfig, GradingClient, Submission, SubmissionProcessor,
//!     client::gemini::GenerateContentTransport,
//! };
//!
//! let config = GraderConfig::from_env();
//! let subject = config.subject().to_string();
//! let client = GradingClient::new(move || GenerateContentTransport::connect(&config));
//! let processor = SubmissionProcessor::new(client).with_subject(subject);
//!
//! let files = vec![Submission::new("alice.png", "image/png", vec![])];
//! let _results = processor.process(&files, "Formula (40%)\nReasoning (60%)", None).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Evaluation transport and retrying client
pub mod client;
/// Environment-driven configuration
pub mod config;
/// Error taxonomy
pub mod error;
/// Per-criterion grading
pub mod grader;
/// Orchestration across submissions and criteria
pub mod processor;
/// Terminal rendering of results
pub mod report;
/// Rubric text parsing
pub mod rubric;
/// Submissions, criteria and results
pub mod types;

pub use client::{EvaluationRequest, GradingClient, RetryPolicy, Transport};
pub use config::GraderConfig;
pub use error::{GraderError, ResponseFormatError, TransportError};
pub use grader::CriterionGrader;
pub use processor::{Pacing, SubmissionProcessor};
pub use rubric::parse_rubric;
pub use types::{Criterion, CriterionResult, GradingResult, Remark, StudentResult, Submission};
