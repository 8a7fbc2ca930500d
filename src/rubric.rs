#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Criterion;

/// Matches `<name>(<weight>%)` anywhere in a line; the name is everything
/// before the first weight group.
static CRITERION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*\((\d+)%\)").expect("criterion pattern is valid")
});

/// Largest weight a single criterion may carry.
const MAX_WEIGHT: u32 = 100;

/// Parses rubric text into weighted criteria, one per matching line.
///
/// Lines without a `(NN%)` weight are free-form rubric prose (headings,
/// numbering, blank lines) and are skipped. The result may be empty.
pub fn parse_rubric(rubric_text: &str) -> Vec<Criterion> {
    rubric_text
        .lines()
        .filter_map(|line| {
            let criterion = parse_line(line);
            if criterion.is_none() && !line.trim().is_empty() {
                tracing::debug!(line, "Skipping rubric line without a weight");
            }
            criterion
        })
        .collect()
}

/// Parses a single rubric line, if it carries a weight.
fn parse_line(line: &str) -> Option<Criterion> {
    let captures = CRITERION_LINE.captures(line)?;
    let weight = captures[2].parse::<u32>().ok()?;
    if weight > MAX_WEIGHT {
        return None;
    }

    Some(Criterion::new(captures[1].trim(), weight))
}
