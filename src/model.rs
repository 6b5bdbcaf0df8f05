use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// On-disk detective-solution artifact. The base story file and every solution
/// variant share this layout; variants usually only carry `detection`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryArtifact {
    #[serde(default)]
    pub metadata: StoryMetadata,
    #[serde(default)]
    pub original_metadata: Value,
    #[serde(default)]
    pub story: StoryText,
    #[serde(default)]
    pub detection: Option<Detection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryMetadata {
    pub event_name: Option<String>,
    pub event_description: Option<String>,
    pub story_length: Option<Number>,
    pub model: Option<String>,
    pub border_sentence: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryText {
    pub full_text: Option<String>,
    pub reveal_segment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    pub solution: Option<Value>,
    #[serde(rename = "correct?")]
    pub correct: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoryArtifact {
    /// Solution text, only when it is actually a string.
    pub fn solution_text(&self) -> Option<&str> {
        self.detection
            .as_ref()
            .and_then(|detection| detection.solution.as_ref())
            .and_then(Value::as_str)
    }

    pub fn full_text(&self) -> &str {
        self.story.full_text.as_deref().unwrap_or("")
    }

    pub fn original_field(&self, key: &str) -> Option<&Value> {
        self.original_metadata.get(key)
    }

    pub fn story_annotation(&self, key: &str) -> Option<&str> {
        self.original_metadata
            .get("story_annotations")
            .and_then(|annotations| annotations.get(key))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SolutionSection {
    pub title: String,
    pub content: String,
}

/// One story joined with all of its optional side artifacts. Every optional
/// field serializes as `null` when the artifact is missing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStory {
    pub id: String,
    pub dataset: String,
    pub story_title: String,
    pub author: String,
    pub publication_date: String,
    pub is_solvable: Option<bool>,
    pub metadata: StoryMetadata,
    #[serde(rename = "original_metadata")]
    pub original_metadata: Value,
    pub story: StoryText,
    pub detection: Option<Detection>,
    pub solution_v1: Option<String>,
    pub solution_v1_sections: Vec<SolutionSection>,
    pub solution_v2: Option<String>,
    pub solution_v2_sections: Vec<SolutionSection>,
    pub oracle_solution: Option<String>,
    pub oracle_solution_sections: Vec<SolutionSection>,
    pub concat_solution: Option<String>,
    pub concat_solution_sections: Vec<SolutionSection>,
    pub summary: Option<Value>,
    pub story_summary: Option<String>,
    pub iterative_summary: Option<String>,
    pub annotations: BTreeMap<String, Value>,
    /// Top-level base artifact keys with no dedicated field above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: String,
    pub story_title: String,
    pub author: String,
    pub story_code: String,
    pub text_length: Number,
    pub plot_summary: String,
    pub is_solvable: Option<bool>,
    pub model: String,
    pub publication_date: String,
    pub summary: Option<Value>,
    pub story_summary: Option<String>,
    pub solution_v2: Option<String>,
}

/// Flattened per-story row of the stats table. The shape is the union of every
/// dataset's columns; columns a dataset does not produce hold `""`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsRow {
    pub story_id: String,
    pub story_title: String,
    pub story_length_words: usize,
    pub pre_reveal_words: usize,
    pub o3_gold_culprits: String,
    pub o3_gold_accomplices: String,
    pub oracle_culprit_guess: String,
    pub oracle_accomplice_guess: String,
    pub culprit_correct: String,
    pub accomplice_correct: String,
    pub concat_culprit_guess: String,
    pub concat_accomplice_guess: String,
    pub concat_culprit_correct: String,
    pub concat_accomplice_correct: String,
    pub concat_pre_reveal_words: usize,
    pub correct_annotator_guess: String,
    pub oracle_culprit_gpt_correct: String,
    pub solve_rate: String,
    pub suspects: String,
    pub culprit: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryInventoryEntry {
    pub story_code: String,
    pub filename: String,
    pub bytes: u64,
    pub sha256: String,
    pub side_artifacts: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInventory {
    pub key: String,
    pub story_dir: String,
    pub story_count: usize,
    pub stories: Vec<StoryInventoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub data_root: String,
    pub dataset_count: usize,
    pub datasets: Vec<DatasetInventory>,
}
