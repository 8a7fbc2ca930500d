#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::types::Criterion;

/// Builds the instructions sent to the evaluation service for one criterion.
///
/// * `criterion`: the rubric entry being graded; its weight caps the score.
/// * `subject`: subject area the grader is an expert in. May be empty.
/// * `with_reference`: whether an answer key is attached after the
///   submission.
pub fn build_prompt(criterion: &Criterion, subject: &str, with_reference: bool) -> String {
    let grader = match subject.trim() {
        "" => "grader".to_string(),
        subject => format!("{subject} grader"),
    };
    let max_score = criterion.weight;
    let name = &criterion.name;

    let (task, analysis) = if with_reference {
        (
            format!(
                "Compare the student's answer in the first file with the answer key in the \
                 second file and evaluate it based on: {name}."
            ),
            "compare the student's answer with the answer key, highlighting similarities and \
             differences",
        )
    } else {
        (
            format!("Evaluate this exam answer based on: {name}."),
            "summary point",
        )
    };

    format!(
        "You are a kind and helpful expert {grader}. {task}\nAnswer in plain prose and short \
         bullet points. Do not use markdown, bold text, or asterisks for emphasis. If the file \
         does not look like an exam answer, do not return a score.\nRespond using exactly these \
         five sections, in this order:\nSCORE: [whole number between 0 and {max_score}]\n\
         STRENGTHS: [summary point]\nWEAKNESSES: [summary point]\nANALYSIS: [{analysis}]\n\
         SUGGESTIONS: [summary point]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_subject_criterion_and_bound() {
        let prompt = build_prompt(&Criterion::new("Formula", 40), "physics", false);
        assert!(prompt.contains("expert physics grader"));
        assert!(prompt.contains("based on: Formula."));
        assert!(prompt.contains("SCORE: [whole number between 0 and 40]"));
        for marker in ["STRENGTHS:", "WEAKNESSES:", "ANALYSIS:", "SUGGESTIONS:"] {
            assert!(prompt.contains(marker), "missing {marker}");
        }
        assert!(!prompt.contains("answer key"));
    }

    #[test]
    fn reference_prompt_asks_for_comparison() {
        let prompt = build_prompt(&Criterion::new("Reasoning", 60), "", true);
        assert!(prompt.contains("expert grader."));
        assert!(prompt.contains("answer key in the second file"));
        assert!(prompt.contains("ANALYSIS: [compare the student's answer with the answer key"));
    }
}
