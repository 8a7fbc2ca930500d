#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use colored::Colorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};

use crate::types::{Criterion, Remark, StudentResult};

/// A table row for one graded criterion.
#[derive(Tabled)]
struct GradedRow {
    /// Criterion name
    #[tabled(rename = "Criterion")]
    name:     String,
    /// `score/max`
    #[tabled(rename = "Score")]
    score:    String,
    /// Normalized feedback
    #[tabled(rename = "Feedback")]
    feedback: String,
}

/// A table row for one parsed rubric criterion.
#[derive(Tabled)]
struct RubricRow {
    /// Criterion name
    #[tabled(rename = "Criterion")]
    name:   String,
    /// Weight as a percentage
    #[tabled(rename = "Weight")]
    weight: String,
}

/// Renders the per-criterion breakdown for one student.
pub fn student_table(result: &StudentResult) -> String {
    let rows: Vec<GradedRow> = result
        .criteria
        .iter()
        .map(|c| GradedRow {
            name:     c.name.clone(),
            score:    format!("{}/{}", c.result.score(), c.result.max_score()),
            feedback: c.result.feedback().to_string(),
        })
        .collect();

    Table::new(&rows)
        .with(Panel::header(format!("Grading Overview: {}", result.name)))
        .with(Panel::footer(format!(
            "Total: {}/100 - {}",
            result.aggregate_score, result.overall_remark
        )))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(60).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

/// One-line colored summary of a student's result.
pub fn summary_line(result: &StudentResult) -> String {
    let remark = match Remark::for_score(result.aggregate_score) {
        Remark::Excellent => result.overall_remark.green(),
        Remark::Good => result.overall_remark.cyan(),
        Remark::NeedsImprovement => result.overall_remark.yellow(),
        Remark::RequiresRevision => result.overall_remark.red(),
    };

    format!("{}: {}/100 {}", result.name.bold(), result.aggregate_score, remark)
}

/// Renders parsed rubric criteria, or a note when nothing matched.
pub fn rubric_table(criteria: &[Criterion]) -> String {
    if criteria.is_empty() {
        return "No weighted criteria found. Write one per line, like `Formula (40%)`."
            .to_string();
    }

    let total: u32 = criteria.iter().map(|c| c.weight).sum();
    let rows: Vec<RubricRow> = criteria
        .iter()
        .map(|c| RubricRow {
            name:   c.name.clone(),
            weight: format!("{}%", c.weight),
        })
        .collect();

    Table::new(&rows)
        .with(Panel::header("Rubric"))
        .with(Panel::footer(format!("Total weight: {total}%")))
        .with(Style::modern())
        .to_string()
}

/// Serializes results as pretty-printed JSON.
pub fn to_json(results: &[StudentResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
