//! Heading classification and section grouping.
//!
//! Every non-blank line is tested against an ordered rule list; the first rule that matches
//! decides the line's kind. Lines that match no rule are body text for the most recent
//! heading. Anything before the first heading is discarded.

use crate::config::PipelineSettings;
use regex::Regex;
use std::sync::LazyLock;

use super::types::{Line, Section};

static NUMBERED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)*(?:\.\s*|\s+)\p{Lu}").expect("numbered heading pattern is valid")
});

/// Lowercase connectives allowed inside a Title Case heading.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "of", "on", "or",
    "per", "the", "to", "vs", "via", "with",
];

const MIN_ALL_CAPS_LETTERS: usize = 4;

/// Classification of a single extracted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Leading section number, e.g. `1.` or `2.1`.
    NumberedHeading,
    /// Every significant word capitalized.
    TitleCaseHeading,
    /// All letters uppercase.
    AllCapsHeading,
    /// Anything else.
    BodyLine,
}

impl LineKind {
    /// Whether the line opens a new section.
    pub const fn is_heading(self) -> bool {
        !matches!(self, Self::BodyLine)
    }
}

/// Heading rules in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRule {
    /// See [`LineKind::NumberedHeading`].
    Numbered,
    /// See [`LineKind::TitleCaseHeading`].
    TitleCase,
    /// See [`LineKind::AllCapsHeading`].
    AllCaps,
}

/// Rules are evaluated top to bottom; the first match wins.
pub const HEADING_RULES: [HeadingRule; 3] = [
    HeadingRule::Numbered,
    HeadingRule::TitleCase,
    HeadingRule::AllCaps,
];

impl HeadingRule {
    /// Test a trimmed, non-empty line against this rule.
    pub fn matches(self, line: &str) -> bool {
        match self {
            Self::Numbered => NUMBERED_HEADING.is_match(line),
            Self::TitleCase => is_title_case(line),
            Self::AllCaps => is_all_caps(line),
        }
    }

    /// Line kind produced when this rule matches.
    pub const fn kind(self) -> LineKind {
        match self {
            Self::Numbered => LineKind::NumberedHeading,
            Self::TitleCase => LineKind::TitleCaseHeading,
            Self::AllCaps => LineKind::AllCapsHeading,
        }
    }
}

/// Classify one line. Lines longer than `max_heading_words` words are always body text.
pub fn classify_line(text: &str, max_heading_words: usize) -> LineKind {
    let line = text.trim();
    if line.is_empty() || line.split_whitespace().count() > max_heading_words {
        return LineKind::BodyLine;
    }

    HEADING_RULES
        .iter()
        .find(|rule| rule.matches(line))
        .map_or(LineKind::BodyLine, |rule| rule.kind())
}

fn is_title_case(line: &str) -> bool {
    if line.ends_with(['.', '!', '?', ',', ';']) {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 {
        return false;
    }

    let mut capitalized = 0;
    for (index, word) in words.iter().enumerate() {
        let Some(first_letter) = word.chars().find(|c| c.is_alphabetic()) else {
            continue;
        };
        if first_letter.is_uppercase() {
            capitalized += 1;
            continue;
        }
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
        if index == 0 || !MINOR_WORDS.contains(&bare) {
            return false;
        }
    }

    capitalized >= 2
}

fn is_all_caps(line: &str) -> bool {
    let mut letters = 0;
    for c in line.chars().filter(|c| c.is_alphabetic()) {
        if !c.is_uppercase() {
            return false;
        }
        letters += 1;
    }
    letters >= MIN_ALL_CAPS_LETTERS
}

/// Group a document's lines into sections keyed by the nearest preceding heading.
///
/// Body lines shorter than `min_line_chars` are noise and dropped. Sections whose remaining
/// body is shorter than `min_section_chars` are discarded. A document without headings
/// yields no sections.
pub fn detect_sections(
    document: &str,
    lines: &[Line],
    settings: &PipelineSettings,
) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in lines {
        let text = line.text.trim();

        if text.is_empty() {
            if let Some(section) = current.as_mut() {
                let after_content = section.body.last().is_some_and(|last| !last.is_empty());
                if after_content {
                    section.body.push(String::new());
                }
            }
            continue;
        }

        if classify_line(text, settings.max_heading_words).is_heading() {
            if let Some(finished) = current.take() {
                push_if_substantial(&mut sections, finished, settings);
            }
            current = Some(Section {
                title: text.to_string(),
                document: document.to_string(),
                page: line.page,
                body: Vec::new(),
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        if visible >= settings.min_line_chars {
            section.body.push(text.to_string());
        }
    }

    if let Some(finished) = current {
        push_if_substantial(&mut sections, finished, settings);
    }

    tracing::debug!(document, sections = sections.len(), "Detected sections");
    sections
}

fn push_if_substantial(
    sections: &mut Vec<Section>,
    mut section: Section,
    settings: &PipelineSettings,
) {
    while section.body.last().is_some_and(String::is_empty) {
        section.body.pop();
    }

    let body_chars = section.body_text().chars().count();
    if section.body.is_empty() || body_chars < settings.min_section_chars {
        tracing::trace!(title = %section.title, body_chars, "Dropping section without enough body");
        return;
    }

    sections.push(section);
}
