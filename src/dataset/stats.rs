use anyhow::Result;
use serde_json::Value;
use tracing::info;

use crate::annotations::{AnnotationDocument, StoryAnnotations, annotation_text};
use crate::model::{StatsRow, StoryArtifact};
use crate::util::word_count;

use super::aggregate::{load_solution, story_title};
use super::artifact::{SkippedStory, StoryFile, load_story_dir};
use super::registry::{DatasetDescriptor, Registry, SolutionVariant};
use super::sections::SectionExtractor;
use super::DatasetError;

#[derive(Debug, Default)]
pub struct StatsReport {
    pub rows: Vec<StatsRow>,
    pub skipped: Vec<SkippedStory>,
}

struct Extractors {
    culprit: SectionExtractor,
    accomplice: SectionExtractor,
}

impl Extractors {
    fn for_dataset(descriptor: &DatasetDescriptor) -> Result<Self> {
        Ok(Self {
            culprit: SectionExtractor::new(descriptor.schema.culprit_titles())?,
            accomplice: SectionExtractor::new(descriptor.schema.accomplice_titles())?,
        })
    }

    /// (culprit, accomplices) guessed by one solution variant.
    fn guess(
        &self,
        descriptor: &DatasetDescriptor,
        variant: SolutionVariant,
        story_code: &str,
    ) -> (String, String) {
        let solution = load_solution(descriptor, variant, story_code);
        let solution = solution.as_deref();
        (
            self.culprit.extract_or_empty(solution),
            self.accomplice.extract_or_empty(solution),
        )
    }
}

/// One row per readable story file of `dataset`; unreadable files land in
/// `skipped` so `rows.len() + skipped.len()` equals the number of story files.
pub fn build_stats(
    registry: &Registry,
    dataset: &str,
    annotations: &AnnotationDocument,
) -> Result<StatsReport, DatasetError> {
    let descriptor = registry.resolve(dataset)?;
    let extractors = Extractors::for_dataset(descriptor)?;
    let loaded = load_story_dir(&descriptor.stories_dir)?;

    let rows = loaded
        .stories
        .iter()
        .map(|(file, artifact)| {
            build_row(
                descriptor,
                &extractors,
                file,
                artifact,
                annotations.get(&file.story_code),
            )
        })
        .collect::<Vec<StatsRow>>();

    info!(
        dataset = %descriptor.key,
        rows = rows.len(),
        skipped = loaded.skipped.len(),
        "stats table built"
    );

    Ok(StatsReport {
        rows,
        skipped: loaded.skipped,
    })
}

fn build_row(
    descriptor: &DatasetDescriptor,
    extractors: &Extractors,
    file: &StoryFile,
    artifact: &StoryArtifact,
    annotations: Option<&StoryAnnotations>,
) -> StatsRow {
    let code = file.story_code.as_str();
    let full_text = artifact.full_text();
    let pre_reveal = pre_reveal_words(full_text, artifact.metadata.border_sentence.as_deref());

    let (gold_culprits, gold_accomplices) =
        extractors.guess(descriptor, SolutionVariant::WithReveal, code);
    let (oracle_culprit, oracle_accomplice) =
        extractors.guess(descriptor, SolutionVariant::WithoutReveal, code);
    let (concat_culprit, concat_accomplice) =
        extractors.guess(descriptor, SolutionVariant::Concat, code);

    let mut row = StatsRow {
        story_id: code.to_string(),
        story_title: story_title(descriptor.schema, artifact, code),
        story_length_words: word_count(full_text),
        pre_reveal_words: pre_reveal,
        o3_gold_culprits: gold_culprits,
        o3_gold_accomplices: gold_accomplices,
        oracle_culprit_guess: oracle_culprit,
        oracle_accomplice_guess: oracle_accomplice,
        culprit_correct: annotation_text(annotations, "culpritCorrect"),
        accomplice_correct: annotation_text(annotations, "accompliceCorrect"),
        concat_culprit_guess: concat_culprit,
        concat_accomplice_guess: concat_accomplice,
        concat_culprit_correct: annotation_text(annotations, "concatCulpritCorrect"),
        concat_accomplice_correct: annotation_text(annotations, "concatAccompliceCorrect"),
        concat_pre_reveal_words: stored_word_count(annotations, "concatPreRevealWords")
            .unwrap_or(pre_reveal),
        correct_annotator_guess: artifact
            .story_annotation("Correct annotator guess")
            .or_else(|| artifact.story_annotation("Correct annotator guess?"))
            .unwrap_or_default()
            .to_string(),
        oracle_culprit_gpt_correct: artifact
            .detection
            .as_ref()
            .and_then(|detection| detection.correct.as_ref())
            .map(value_text)
            .unwrap_or_default(),
        ..StatsRow::default()
    };

    if descriptor.schema.has_puzzle_metadata() {
        row.solve_rate = solve_rate(
            artifact.original_field("solve_rate"),
            artifact.original_field("attempts"),
        );
        row.suspects = artifact
            .original_field("answer_options")
            .map(value_text)
            .unwrap_or_default();
        row.culprit = artifact
            .original_field("correct_answer")
            .map(value_text)
            .unwrap_or_default();
    }

    row
}

/// Words before the first verbatim occurrence of `border_sentence`. Without a
/// usable border sentence the whole text counts as pre-reveal.
pub fn pre_reveal_words(full_text: &str, border_sentence: Option<&str>) -> usize {
    match border_sentence
        .filter(|border| !border.trim().is_empty())
        .and_then(|border| full_text.find(border))
    {
        Some(offset) => word_count(&full_text[..offset]),
        None => word_count(full_text),
    }
}

fn stored_word_count(annotations: Option<&StoryAnnotations>, field: &str) -> Option<usize> {
    match annotations?.get(field)? {
        Value::Number(number) => number.as_u64().and_then(|count| usize::try_from(count).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// `"{rate}% ({attempts})"` with thousands separators, or `Unknown`.
fn solve_rate(rate: Option<&Value>, attempts: Option<&Value>) -> String {
    match (rate.filter(|v| !v.is_null()), attempts.filter(|v| !v.is_null())) {
        (Some(rate), Some(attempts)) => {
            let attempts = match attempts.as_u64() {
                Some(count) => group_thousands(count),
                None => value_text(attempts),
            };
            format!("{}% ({attempts})", value_text(rate))
        }
        _ => "Unknown".to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<String>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pre_reveal_counts_words_before_border_sentence() {
        assert_eq!(pre_reveal_words("A B C D E", Some("C D E")), 2);
        assert_eq!(pre_reveal_words("A B C D E", Some("X Y")), 5);
        assert_eq!(pre_reveal_words("A B C D E", None), 5);
        assert_eq!(pre_reveal_words("A B C D E", Some("  ")), 5);
        assert_eq!(pre_reveal_words("", Some("C")), 0);
    }

    #[test]
    fn solve_rate_formats_rate_and_grouped_attempts() {
        assert_eq!(
            solve_rate(Some(&json!(47.5)), Some(&json!(1234567))),
            "47.5% (1,234,567)"
        );
        assert_eq!(solve_rate(Some(&json!(12)), Some(&json!(999))), "12% (999)");
        assert_eq!(solve_rate(Some(&json!(12)), None), "Unknown");
        assert_eq!(solve_rate(None, Some(&json!(10))), "Unknown");
    }

    #[test]
    fn group_thousands_inserts_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(123456), "123,456");
    }

    #[test]
    fn stored_word_count_accepts_numbers_and_numeric_strings() {
        let mut fields = StoryAnnotations::new();
        fields.insert("n".into(), json!(310));
        fields.insert("s".into(), json!(" 42 "));
        fields.insert("bad".into(), json!("many"));

        assert_eq!(stored_word_count(Some(&fields), "n"), Some(310));
        assert_eq!(stored_word_count(Some(&fields), "s"), Some(42));
        assert_eq!(stored_word_count(Some(&fields), "bad"), None);
        assert_eq!(stored_word_count(None, "n"), None);
    }

    #[test]
    fn value_text_joins_answer_options() {
        assert_eq!(value_text(&json!(["Ann", "Bob"])), "Ann, Bob");
        assert_eq!(value_text(&json!("Ann; Bob")), "Ann; Bob");
    }
}
