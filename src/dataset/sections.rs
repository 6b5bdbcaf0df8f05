use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::SolutionSection;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([^<>\n/][^<>\n]*)>").expect("tag pattern is a valid regex")
});

/// Splits a tag-delimited solution blob into ordered sections.
///
/// Every `<TAG>` opens a section that runs until the next opening tag.
/// Closing tags are skipped; text after one still belongs to the open section.
/// Content is trimmed and whitespace-only sections are dropped. Text before
/// the first opening tag is ignored, so untagged input yields nothing.
pub fn parse_sections(text: &str) -> Vec<SolutionSection> {
    let mut sections = Vec::new();
    let mut open: Option<(&str, String)> = None;
    let mut cursor = 0;

    for captures in TAG_PATTERN.captures_iter(text) {
        let Some(tag) = captures.get(0) else {
            continue;
        };

        if let Some((_, content)) = open.as_mut() {
            content.push_str(&text[cursor..tag.start()]);
        }
        cursor = tag.end();

        let is_closing = captures.get(1).is_some_and(|slash| !slash.is_empty());
        if is_closing {
            continue;
        }

        if let Some((title, content)) = open.take() {
            push_section(&mut sections, title, &content);
        }
        if let Some(title) = captures.get(2) {
            open = Some((title.as_str(), String::new()));
        }
    }

    if let Some((title, mut content)) = open {
        content.push_str(&text[cursor..]);
        push_section(&mut sections, title, &content);
    }

    sections
}

fn push_section(sections: &mut Vec<SolutionSection>, title: &str, content: &str) {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return;
    }

    sections.push(SolutionSection {
        title: title.to_string(),
        content: content.to_string(),
    });
}

pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_uppercase()
}

pub fn find_section<'a>(sections: &'a [SolutionSection], title: &str) -> Option<&'a str> {
    let wanted = normalize_title(title);
    sections
        .iter()
        .find(|section| normalize_title(&section.title) == wanted)
        .map(|section| section.content.as_str())
}

/// Pulls one labelled answer (culprit, accomplices, ...) out of a solution.
///
/// Lookup order, each in title order: an explicit `<TITLE>...</TITLE>` pair,
/// then a parsed section, then the bare-heading form `TITLE\n...`, which ends
/// at a blank line followed by a capitalised line, at the next `...(S)`
/// heading, or at end of text.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    titles: Vec<String>,
    pair_patterns: Vec<Regex>,
    heading_patterns: Vec<Regex>,
}

impl SectionExtractor {
    pub fn new(titles: &[&str]) -> Result<Self> {
        let mut pair_patterns = Vec::with_capacity(titles.len());
        let mut heading_patterns = Vec::with_capacity(titles.len());
        for title in titles {
            let words = title
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<String>>()
                .join(r"\s+");
            let pair = format!(r"(?is)<\s*{words}\s*>(.*?)<\s*/\s*{words}\s*>");
            pair_patterns.push(
                Regex::new(&pair)
                    .with_context(|| format!("failed to compile tag pattern for {title}"))?,
            );
            let pattern = format!(r"(?s){words}\s*\n(.*?)(?:\n\n[A-Z]|\n[A-Z][A-Z\s]*\(S\)|\z)");
            heading_patterns.push(
                Regex::new(&pattern)
                    .with_context(|| format!("failed to compile heading pattern for {title}"))?,
            );
        }

        Ok(Self {
            titles: titles.iter().map(|title| (*title).to_string()).collect(),
            pair_patterns,
            heading_patterns,
        })
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        if let Some(content) = first_capture(&self.pair_patterns, text) {
            return Some(content);
        }

        let sections = parse_sections(text);
        for title in &self.titles {
            if let Some(content) = find_section(&sections, title) {
                return Some(content.to_string());
            }
        }

        first_capture(&self.heading_patterns, text)
    }

    /// Like [`Self::extract`], with `""` standing in for "not found".
    pub fn extract_or_empty(&self, text: Option<&str>) -> String {
        text.and_then(|text| self.extract(text)).unwrap_or_default()
    }
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|content| content.as_str().trim().to_string())
            .filter(|content| !content.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(sections: &[SolutionSection]) -> Vec<(&str, &str)> {
        sections
            .iter()
            .map(|section| (section.title.as_str(), section.content.as_str()))
            .collect()
    }

    #[test]
    fn parses_closed_tags_in_source_order() {
        let sections = parse_sections("<A>x</A><B>y</B>");
        assert_eq!(pairs(&sections), vec![("A", "x"), ("B", "y")]);
    }

    #[test]
    fn empty_or_untagged_text_yields_nothing() {
        assert!(parse_sections("").is_empty());
        assert!(parse_sections("no tags here").is_empty());
        assert!(parse_sections("</A> only a closing tag").is_empty());
    }

    #[test]
    fn reparsing_serialized_sections_is_stable() {
        let source = "intro\n<MAIN CULPRIT(S)>\nMrs. Hale\n</MAIN CULPRIT(S)>\n\n<ACCOMPLICE(S)>None</ACCOMPLICE(S)>\n<REASONING>  The clock was wrong.  ";
        let first = parse_sections(source);
        let serialized = first
            .iter()
            .map(|section| format!("<{}>{}", section.title, section.content))
            .collect::<String>();
        let second = parse_sections(&serialized);

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].content, "The clock was wrong.");
    }

    #[test]
    fn text_after_closing_tag_stays_in_open_section() {
        let sections = parse_sections("<A>x</A> more detail <B>y</B>");
        assert_eq!(pairs(&sections), vec![("A", "x more detail"), ("B", "y")]);

        let sections = parse_sections("<CULPRIT>Bob</CULPRIT>\n\nBecause of the boots.");
        assert_eq!(sections[0].content, "Bob\n\nBecause of the boots.");
    }

    #[test]
    fn whitespace_only_sections_are_dropped() {
        let sections = parse_sections("<A>   </A>  \n <B>\n kept \n</B>");
        assert_eq!(pairs(&sections), vec![("B", "kept")]);
    }

    #[test]
    fn unclosed_tag_runs_to_next_opening_tag() {
        let sections = parse_sections("<A>first <B>second");
        assert_eq!(pairs(&sections), vec![("A", "first"), ("B", "second")]);
    }

    #[test]
    fn find_section_ignores_case_and_spacing() {
        let sections = parse_sections("<Main  Culprit(s)>Jones</Main  Culprit(s)>");
        assert_eq!(find_section(&sections, "MAIN CULPRIT(S)"), Some("Jones"));
        assert_eq!(find_section(&sections, "ACCOMPLICE(S)"), None);
    }

    #[test]
    fn extractor_prefers_tagged_section() {
        let extractor = SectionExtractor::new(&["CULPRIT", "MAIN CULPRIT(S)"]).unwrap();
        let text = "<MAIN CULPRIT(S)>Butler</MAIN CULPRIT(S)><CULPRIT>Cook</CULPRIT>";
        assert_eq!(extractor.extract(text).as_deref(), Some("Cook"));
    }

    #[test]
    fn extractor_takes_closed_pair_without_trailing_text() {
        let extractor = SectionExtractor::new(&["MAIN CULPRIT(S)"]).unwrap();
        let text = "<Main Culprit(s)>\nMark\n</MAIN CULPRIT(S)>\nExplanation follows.";
        assert_eq!(extractor.extract(text).as_deref(), Some("Mark"));

        let unclosed = "<MAIN CULPRIT(S)>Cayley\n<REASONING>Keys.";
        assert_eq!(extractor.extract(unclosed).as_deref(), Some("Cayley"));
    }

    #[test]
    fn extractor_falls_back_to_bare_heading() {
        let extractor = SectionExtractor::new(&["MAIN CULPRIT(S)"]).unwrap();

        let text = "Some reasoning.\nMAIN CULPRIT(S)\nColonel Mustard\n\nREASONING\nHe lied.";
        assert_eq!(extractor.extract(text).as_deref(), Some("Colonel Mustard"));

        let text = "MAIN  CULPRIT(S)\nMiss Scarlet\nACCOMPLICE(S)\nNobody";
        assert_eq!(extractor.extract(text).as_deref(), Some("Miss Scarlet"));

        let text = "MAIN CULPRIT(S)\nProfessor Plum";
        assert_eq!(extractor.extract(text).as_deref(), Some("Professor Plum"));
    }

    #[test]
    fn extractor_reports_absence_as_empty() {
        let extractor = SectionExtractor::new(&["ACCOMPLICE(S)"]).unwrap();
        assert_eq!(extractor.extract_or_empty(None), "");
        assert_eq!(
            extractor.extract_or_empty(Some("<MAIN CULPRIT(S)>X</MAIN CULPRIT(S)>")),
            ""
        );
    }
}
