//! crates/beyond_bark_core/src/sections.rs
//!
//! Splits a free-text model completion into a fixed, ordered schema of named
//! sections. Models decorate headings unpredictably (ordinals, bullets, bold
//! markers, odd casing), so each heading is matched loosely, and a section's
//! text runs until the next recognized heading or the end of the document.
//!
//! Parsing never fails: a heading that cannot be found yields an empty string,
//! and every label of the schema is always present in the result.

use regex::Regex;

pub const CARE_SUGGESTION_LABELS: &[&str] = &[
    "Mood Explanation",
    "What to Do",
    "What to Feed",
    "Any Additional Care Tips",
];

pub const SPECIES_REPORT_LABELS: &[&str] = &[
    "Species Name",
    "Breed Name",
    "Ideal Climate",
    "What It Eats",
    "Habitat & Behavior",
    "Care or Observation Tips",
];

pub const SYMPTOM_REPORT_LABELS: &[&str] = &[
    "Suspected Disease(s)",
    "Reasoning",
    "Immediate Actions",
    "Veterinary Advice",
    "Home Care Suggestions",
];

/// The sections extracted from one completion, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSections {
    sections: Vec<(String, String)>,
}

impl ParsedSections {
    /// The text for `label`, or `None` if the label is not part of the schema.
    /// Labels that are in the schema but were not found map to `""`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections
            .iter()
            .map(|(label, text)| (label.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when no section has any text, i.e. the completion was unusable.
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|(_, text)| text.is_empty())
    }
}

/// Splits `raw` into the sections named by `labels`.
pub fn split_sections(raw: &str, labels: &[&str]) -> ParsedSections {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = normalized.trim();

    // (label index, heading start, heading end) for every heading found.
    let mut headings: Vec<(usize, usize, usize)> = labels
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let found = heading_pattern(label)?.find(text)?;
            Some((index, found.start(), found.end()))
        })
        .collect();
    headings.sort_by_key(|&(_, start, _)| start);

    let mut texts = vec![String::new(); labels.len()];
    for (position, &(index, _, body_start)) in headings.iter().enumerate() {
        let body_end = headings
            .get(position + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(text.len())
            .max(body_start);
        texts[index] = text[body_start..body_end].trim().to_string();
    }

    ParsedSections {
        sections: labels
            .iter()
            .map(|label| label.to_string())
            .zip(texts)
            .collect(),
    }
}

/// Care-suggestion reports: mood explanation, what to do, what to feed, extra tips.
pub fn parse_care_suggestions(raw: &str) -> ParsedSections {
    split_sections(raw, CARE_SUGGESTION_LABELS)
}

/// A heading is a line holding the label, optionally preceded by markdown
/// heading marks, an ordinal or a bullet, with bold markers allowed around
/// either. It ends in a colon, a space-separated dash, or the end of the line.
fn heading_pattern(label: &str) -> Option<Regex> {
    let words: Vec<String> = label.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }

    let pattern = format!(
        r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*|__)?[ \t]*(?:(?:\d+[.)]|[*\-•+])[ \t]*)?(?:\*\*|__)?[ \t]*{}[ \t]*(?:\*\*|__)?(?::|[ \t]+[-–—]|[ \t]*$)[ \t]*(?:\*\*|__)?",
        words.join(r"[ \t]+")
    );
    Regex::new(&pattern).ok()
}
