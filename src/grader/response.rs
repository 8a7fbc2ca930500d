#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::error::ResponseFormatError;

/// `SCORE:` followed by a whole number.
static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSCORE:\s*(\d+)").expect("score pattern is valid"));

/// Any of the five section markers.
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(SCORE|STRENGTHS|WEAKNESSES|ANALYSIS|SUGGESTIONS)\s*:")
        .expect("marker pattern is valid")
});

/// Runs of three or more newlines.
static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// Sections of an evaluation response, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// The awarded score
    Score,
    /// What the submission did well
    Strengths,
    /// What it did poorly
    Weaknesses,
    /// Free-form analysis paragraph
    Analysis,
    /// How to improve
    Suggestions,
}

impl Section {
    /// All sections in rendering order.
    const ALL: [Section; 5] = [
        Section::Score,
        Section::Strengths,
        Section::Weaknesses,
        Section::Analysis,
        Section::Suggestions,
    ];

    /// Maps a marker, in any case, to its section.
    fn from_marker(marker: &str) -> Option<Self> {
        match marker.to_ascii_uppercase().as_str() {
            "SCORE" => Some(Section::Score),
            "STRENGTHS" => Some(Section::Strengths),
            "WEAKNESSES" => Some(Section::Weaknesses),
            "ANALYSIS" => Some(Section::Analysis),
            "SUGGESTIONS" => Some(Section::Suggestions),
            _ => None,
        }
    }

    /// Header line for the section.
    fn header(self) -> &'static str {
        match self {
            Section::Score => "SCORE:",
            Section::Strengths => "STRENGTHS:",
            Section::Weaknesses => "WEAKNESSES:",
            Section::Analysis => "ANALYSIS:",
            Section::Suggestions => "SUGGESTIONS:",
        }
    }

    /// Position in [`Section::ALL`].
    fn index(self) -> usize {
        self as usize
    }
}

/// A validated evaluation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Score within `[0, max_score]`
    pub score:    u32,
    /// Normalized feedback text
    pub feedback: String,
}

/// Validates the score in an evaluation response and normalizes its
/// sections into feedback text.
///
/// Returns [`ResponseFormatError`] when no score is present or the score
/// exceeds `max_score`; the caller decides how to degrade.
pub fn parse_response(text: &str, max_score: u32) -> Result<ParsedResponse, ResponseFormatError> {
    let raw_score = SCORE
        .captures(text)
        .ok_or(ResponseFormatError::MissingScore)?[1]
        .to_string();
    let score = match raw_score.parse::<u32>() {
        Ok(score) if score <= max_score => score,
        _ => {
            return Err(ResponseFormatError::ScoreOutOfRange {
                score: raw_score,
                max_score,
            });
        }
    };

    Ok(ParsedResponse {
        score,
        feedback: format_feedback(text, score),
    })
}

/// Splits `text` at section markers and renders the sections in fixed order.
fn format_feedback(text: &str, score: u32) -> String {
    let mut bodies: [Option<String>; 5] = Default::default();

    let markers: Vec<_> = MARKER.captures_iter(text).collect();
    for (i, caps) in markers.iter().enumerate() {
        let Some(section) = Section::from_marker(&caps[1]) else {
            continue;
        };
        let start = caps.get(0).map_or(0, |m| m.end());
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = &text[start..end];

        let slot = &mut bodies[section.index()];
        if let Some(existing) = slot.as_mut() {
            existing.push('\n');
            existing.push_str(body);
        } else {
            *slot = Some(body.to_string());
        }
    }

    let rendered = Section::ALL
        .iter()
        .filter_map(|&section| {
            let body = bodies[section.index()].as_deref()?;
            Some(match section {
                Section::Score => format!("{} {score}", section.header()),
                Section::Analysis => render_paragraph(section.header(), body),
                _ => render_bullets(section.header(), body),
            })
        })
        .join("\n\n");

    EXTRA_BLANK_LINES
        .replace_all(&rendered, "\n\n")
        .trim()
        .to_string()
}

/// Renders a section body as one bullet per `•` or `*` separated fragment.
fn render_bullets(header: &str, body: &str) -> String {
    let points = body
        .split(['•', '*'])
        .map(|point| point.split_whitespace().join(" "))
        .filter(|point| !point.is_empty())
        .map(|point| format!("  • {point}"))
        .join("\n");

    if points.is_empty() {
        header.to_string()
    } else {
        format!("{header}\n{points}")
    }
}

/// Renders a section body as a single indented paragraph.
fn render_paragraph(header: &str, body: &str) -> String {
    let paragraph = body.split_whitespace().join(" ");
    if paragraph.is_empty() {
        header.to_string()
    } else {
        format!("{header}\n  {paragraph}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_sections_in_fixed_order() {
        let text = "Here is my evaluation.\nSUGGESTIONS: * practice more\nSCORE: 7\nstrengths: • \
                    clear setup • correct units\n*\nANALYSIS: The student\n   derived it\n\n\n \
                    well.\nWEAKNESSES:\n* sloppy algebra";
        let parsed = parse_response(text, 10).expect("valid response");

        assert_eq!(parsed.score, 7);
        assert_eq!(
            parsed.feedback,
            "SCORE: 7\n\nSTRENGTHS:\n  • clear setup\n  • correct units\n\nWEAKNESSES:\n  • \
             sloppy algebra\n\nANALYSIS:\n  The student derived it well.\n\nSUGGESTIONS:\n  • \
             practice more"
        );
    }

    #[test]
    fn plain_text_body_becomes_single_bullet() {
        let parsed = parse_response("SCORE: 30\nSTRENGTHS: ok", 40).expect("valid response");
        assert_eq!(parsed.feedback, "SCORE: 30\n\nSTRENGTHS:\n  • ok");
    }

    #[test]
    fn missing_score_is_an_error() {
        assert_eq!(
            parse_response("STRENGTHS: nice", 10),
            Err(ResponseFormatError::MissingScore)
        );
        assert_eq!(parse_response("SCORE: -3", 10), Err(ResponseFormatError::MissingScore));
        assert_eq!(parse_response("SCORE: N/A", 10), Err(ResponseFormatError::MissingScore));
    }

    #[test]
    fn score_above_max_is_an_error() {
        assert_eq!(
            parse_response("SCORE: 41", 40),
            Err(ResponseFormatError::ScoreOutOfRange {
                score:     "41".to_string(),
                max_score: 40,
            })
        );
        assert!(parse_response("SCORE: 99999999999999999999", 40).is_err());
        assert_eq!(parse_response("SCORE: 40", 40).map(|p| p.score), Ok(40));
        assert_eq!(parse_response("SCORE: 0", 0).map(|p| p.score), Ok(0));
    }

    #[test]
    fn empty_sections_keep_their_header() {
        let parsed = parse_response("SCORE: 5 ANALYSIS: WEAKNESSES: *", 5).expect("valid");
        assert_eq!(parsed.feedback, "SCORE: 5\n\nWEAKNESSES:\n\nANALYSIS:");
    }
}
