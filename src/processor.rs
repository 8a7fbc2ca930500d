#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::{
    client::{GradingClient, Transport},
    error::GraderError,
    grader::CriterionGrader,
    rubric::parse_rubric,
    types::{Criterion, CriterionResult, Remark, StudentResult, Submission},
};

/// Fixed delays that keep the run under the evaluation service's throughput
/// limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after each criterion call
    pub between_criteria: Duration,
    /// Pause after each submission, on top of the criterion pause
    pub between_files:    Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_criteria: Duration::from_millis(500),
            between_files:    Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    /// Pause between the last call of one submission and the first call of
    /// the next: the criterion pause followed by the file pause.
    pub fn file_boundary(&self) -> Duration {
        self.between_criteria + self.between_files
    }
}

/// Grades every submission against every rubric criterion, one evaluation
/// call at a time.
pub struct SubmissionProcessor<T> {
    /// Per-criterion grader
    grader:  CriterionGrader<T>,
    /// Subject passed to the grading prompt
    subject: String,
    /// Delays between calls
    pacing:  Pacing,
}

impl<T: Transport> SubmissionProcessor<T> {
    /// Creates a processor that evaluates through `client`.
    pub fn new(client: GradingClient<T>) -> Self {
        Self {
            grader:  CriterionGrader::new(client),
            subject: String::new(),
            pacing:  Pacing::default(),
        }
    }

    /// Sets the subject the grader is told it is an expert in.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Overrides the pacing delays.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Grades `files` against the criteria in `rubric_text`, optionally
    /// comparing each one with `reference`.
    ///
    /// Results come back in the same order as `files`. The run aborts only
    /// when the rubric has no weighted criteria or the evaluation transport
    /// cannot be configured; both are detected before the first call.
    pub async fn process(
        &self,
        files: &[Submission],
        rubric_text: &str,
        reference: Option<&Submission>,
    ) -> Result<Vec<StudentResult>, GraderError> {
        let criteria = parse_rubric(rubric_text);
        if criteria.is_empty() {
            return Err(GraderError::Aggregation(
                "the rubric has no weighted criteria; expected lines such as `Formula (40%)`"
                    .to_string(),
            ));
        }
        self.grader.client().connect().await?;

        tracing::info!(
            files = files.len(),
            criteria = criteria.len(),
            reference = reference.map(Submission::name),
            "Grading submissions"
        );

        let mut results = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing.file_boundary()).await;
            }

            let span = tracing::info_span!("submission", file = file.name());
            let result = self
                .process_file(file, &criteria, reference)
                .instrument(span)
                .await?;
            results.push(result);
        }

        Ok(results)
    }

    /// Grades a single file against every criterion, in rubric order.
    async fn process_file(
        &self,
        file: &Submission,
        criteria: &[Criterion],
        reference: Option<&Submission>,
    ) -> Result<StudentResult, GraderError> {
        let mut graded = Vec::with_capacity(criteria.len());
        for (i, criterion) in criteria.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing.between_criteria).await;
            }

            let result = self
                .grader
                .grade(file, criterion, &self.subject, reference)
                .await?;
            tracing::debug!(
                criterion = %criterion.name,
                score = result.score(),
                max_score = result.max_score(),
                "Graded criterion"
            );
            graded.push(CriterionResult {
                name: criterion.name.clone(),
                result,
            });
        }

        let aggregate_score = aggregate_score(&graded);
        let remark = Remark::for_score(aggregate_score);
        tracing::info!(aggregate_score, remark = %remark, "Graded submission");

        Ok(StudentResult {
            id: format!("student-{}-{}", file.stem(), Uuid::new_v4().simple()),
            name: file.stem().to_string(),
            aggregate_score,
            overall_remark: remark.to_string(),
            criteria: graded,
        })
    }
}

/// Weighted percentage across criteria, `round(100 * Σscore / Σmax)`.
///
/// A rubric whose weights are all zero scores 0.
pub fn aggregate_score(criteria: &[CriterionResult]) -> u32 {
    let (score, max) = criteria.iter().fold((0u64, 0u64), |(score, max), c| {
        (score + u64::from(c.result.score()), max + u64::from(c.result.max_score()))
    });
    if max == 0 {
        return 0;
    }

    ((200 * score + max) / (2 * max)) as u32
}
