use anyhow::{Context, Result};
use serde_json::Value;

use crate::model::StatsRow;

/// Export order and header label of every stats column.
pub const STATS_COLUMNS: &[(&str, &str)] = &[
    ("storyId", "ID"),
    ("storyTitle", "Story Title"),
    ("storyLengthWords", "Words"),
    ("o3GoldCulprits", "o3 Gold Culprits"),
    ("o3GoldAccomplices", "o3 Gold Accomplices"),
    ("oracleCulpritGuess", "Oracle Culprit Guess"),
    ("oracleAccompliceGuess", "Oracle Accomplice Guess"),
    ("culpritCorrect", "Culprit Correct?"),
    ("accompliceCorrect", "Accomplice Correct?"),
    ("preRevealWords", "Words Pre-Reveal"),
    ("concatCulpritGuess", "Concat Culprit Guess"),
    ("concatAccompliceGuess", "Concat Accomplice Guess"),
    ("concatCulpritCorrect", "Concat Culprit Correct?"),
    ("concatAccompliceCorrect", "Concat Accomplice Correct?"),
    ("concatPreRevealWords", "Summ Length"),
    ("correctAnnotatorGuess", "Correct Annotator Guess"),
    ("oracleCulpritGptCorrect", "Oracle Culprit GPT Correct?"),
    ("solveRate", "Solve Rate"),
    ("suspects", "Suspects"),
    ("culprit", "Culprit"),
];

pub fn stats_to_csv(rows: &[StatsRow]) -> Result<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        STATS_COLUMNS
            .iter()
            .map(|(_, label)| escape_cell(label))
            .collect::<Vec<String>>()
            .join(","),
    );

    for row in rows {
        let value = serde_json::to_value(row)
            .with_context(|| format!("failed to serialize stats row {}", row.story_id))?;
        lines.push(
            STATS_COLUMNS
                .iter()
                .map(|(key, _)| escape_cell(&cell_text(value.get(*key))))
                .collect::<Vec<String>>()
                .join(","),
        );
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    Ok(csv)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Line breaks collapse to one space; cells with `,` or `"` are quoted.
fn escape_cell(raw: &str) -> String {
    let flattened = raw
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");
    let cell = flattened.trim();

    if cell.contains([',', '"']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_cell_quotes_and_flattens() {
        assert_eq!(escape_cell("plain"), "plain");
        assert_eq!(escape_cell("Smith, John"), "\"Smith, John\"");
        assert_eq!(escape_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_cell("line one\r\n\nline two\n"), "line one line two");
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = vec![
            StatsRow {
                story_id: "story007".into(),
                story_title: "The Locked Room".into(),
                story_length_words: 1200,
                o3_gold_culprits: "Dr. Roylott,\nthe stepfather".into(),
                ..StatsRow::default()
            },
            StatsRow {
                story_id: "story008".into(),
                ..StatsRow::default()
            },
        ];

        let csv = stats_to_csv(&rows).unwrap();
        let lines = csv.lines().collect::<Vec<&str>>();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID,Story Title,Words,o3 Gold Culprits,"));
        assert_eq!(lines[0].split(',').count(), STATS_COLUMNS.len());
        assert!(
            lines[1].starts_with("story007,The Locked Room,1200,\"Dr. Roylott, the stepfather\",")
        );
        assert!(lines[2].starts_with("story008,,0,"));
    }

    #[test]
    fn every_column_key_exists_on_the_row() {
        let value = serde_json::to_value(StatsRow::default()).unwrap();
        for (key, _) in STATS_COLUMNS {
            assert!(value.get(*key).is_some(), "missing column {key}");
        }
        assert_eq!(value.as_object().unwrap().len(), STATS_COLUMNS.len());
    }
}
