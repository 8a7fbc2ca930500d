#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Prompt construction for a single criterion
pub mod prompt;
/// Parsing and normalization of evaluation responses
pub mod response;

use crate::{
    client::{GradingClient, Transport},
    error::GraderError,
    types::{Criterion, GradingResult, Submission},
};

/// Grades one submission against one rubric criterion.
pub struct CriterionGrader<T> {
    /// Client used for evaluation calls
    client: GradingClient<T>,
}

impl<T: Transport> CriterionGrader<T> {
    /// Creates a grader that evaluates through `client`.
    pub fn new(client: GradingClient<T>) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &GradingClient<T> {
        &self.client
    }

    /// Grades `submission` against `criterion`.
    ///
    /// Transport failures and malformed responses never escape: they become
    /// a fallback result worth 70% of the criterion, flagged for manual
    /// review. Only configuration errors are returned.
    pub async fn grade(
        &self,
        submission: &Submission,
        criterion: &Criterion,
        subject: &str,
        reference: Option<&Submission>,
    ) -> Result<GradingResult, GraderError> {
        let max_score = criterion.weight;
        let prompt = prompt::build_prompt(criterion, subject, reference.is_some());

        let outcome = match self.client.evaluate(submission, &prompt, reference).await {
            Ok(text) => response::parse_response(&text, max_score).map_err(|e| {
                tracing::warn!(
                    file = submission.name(),
                    criterion = %criterion.name,
                    response = %text,
                    "Could not parse evaluation response"
                );
                GraderError::from(e)
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(parsed) => Ok(GradingResult::new(parsed.score, max_score, parsed.feedback)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::error!(
                    file = submission.name(),
                    criterion = %criterion.name,
                    error = %e,
                    "AI grading failed, using fallback score"
                );
                Ok(GradingResult::fallback(max_score, e))
            }
        }
    }
}
