#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A file handed to the evaluation service, either a student's answer or the
/// reference answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// File name as uploaded, including extension
    name:      String,
    /// MIME type sent alongside the bytes
    mime_type: String,
    /// Raw file contents
    bytes:     Vec<u8>,
}

impl Submission {
    /// Creates a submission from an in-memory blob.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a submission from disk, guessing its MIME type from the
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Could not read submission file: {}", path.display()))?;
        let name = path
            .file_name()
            .with_context(|| format!("Not a file path: {}", path.display()))?
            .to_string_lossy()
            .into_owned();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();

        Ok(Self::new(name, mime_type, bytes))
    }

    /// File name, including extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name with its final extension removed.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }

    /// MIME type of the contents.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One weighted rubric entry. The weight is also the highest score the
/// criterion can award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion name as written in the rubric
    pub name:   String,
    /// Percentage weight, 0 to 100
    pub weight: u32,
}

impl Criterion {
    /// Creates a criterion.
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Score and feedback for one criterion of one submission.
///
/// Always satisfies `score <= max_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Awarded score
    score:     u32,
    /// Highest possible score
    max_score: u32,
    /// Normalized feedback text
    feedback:  String,
}

impl GradingResult {
    /// Builds a result from an already validated score.
    pub(crate) fn new(score: u32, max_score: u32, feedback: String) -> Self {
        Self {
            score: score.min(max_score),
            max_score,
            feedback,
        }
    }

    /// Result used when the service could not grade a criterion: 70% of the
    /// maximum, rounded down, and a request for manual review.
    pub(crate) fn fallback(max_score: u32, reason: impl Display) -> Self {
        Self {
            score: max_score * 7 / 10,
            max_score,
            feedback: format!("Unable to perform AI grading: {reason}. Please review manually."),
        }
    }

    /// Awarded score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Highest possible score.
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Normalized feedback text.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

/// A graded criterion inside a [`StudentResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionResult {
    /// Name of the rubric criterion
    pub name:   String,
    /// Grade awarded for it
    #[serde(flatten)]
    pub result: GradingResult,
}

/// Overall remark bands for an aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Remark {
    /// 80 and above
    Excellent,
    /// 60 to 79
    Good,
    /// 40 to 59
    NeedsImprovement,
    /// Below 40
    RequiresRevision,
}

impl Remark {
    /// Picks the band for an aggregate score.
    pub fn for_score(score: u32) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::NeedsImprovement,
            _ => Self::RequiresRevision,
        }
    }

    /// The remark shown to the student.
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent work overall!",
            Self::Good => "Good work with room for improvement.",
            Self::NeedsImprovement => "Needs significant improvement.",
            Self::RequiresRevision => "Requires extensive revision.",
        }
    }
}

impl Display for Remark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Final grade for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    /// Unique identifier for this result
    pub id:              String,
    /// Submission file name without extension
    pub name:            String,
    /// Weighted score out of 100
    pub aggregate_score: u32,
    /// Remark for the aggregate score band
    pub overall_remark:  String,
    /// Per-criterion results, in rubric order
    pub criteria:        Vec<CriterionResult>,
}
