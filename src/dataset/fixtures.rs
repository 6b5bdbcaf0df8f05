use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

use super::registry::{ArtifactKind, Registry, SolutionVariant, SummaryKind};

/// Data root in a temp dir, populated through the registry's own naming
/// convention.
pub(crate) struct DataRoot {
    dir: TempDir,
    pub registry: Registry,
}

impl DataRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(dir.path());
        Self { dir, registry }
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.dir.path().join("user_annotations.json")
    }

    pub fn write(&self, dataset: &str, kind: ArtifactKind, code: &str, value: &Value) -> PathBuf {
        let path = self.path_of(dataset, kind, code);
        self.write_raw_at(&path, &serde_json::to_string_pretty(value).unwrap());
        path
    }

    pub fn write_raw(&self, dataset: &str, kind: ArtifactKind, code: &str, raw: &str) -> PathBuf {
        let path = self.path_of(dataset, kind, code);
        self.write_raw_at(&path, raw);
        path
    }

    fn write_raw_at(&self, path: &Path, raw: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, raw).unwrap();
    }

    fn path_of(&self, dataset: &str, kind: ArtifactKind, code: &str) -> PathBuf {
        self.registry
            .resolve(dataset)
            .unwrap()
            .artifact_path(kind, code)
            .unwrap()
    }

    pub fn bmds_story(&self, code: &str, title: &str, full_text: &str, border: &str) {
        self.write(
            "bmds",
            ArtifactKind::Story,
            code,
            &json!({
                "metadata": {
                    "event_name": code,
                    "event_description": format!("{title} detective solution"),
                    "story_length": full_text.len(),
                    "model": "o3",
                    "border_sentence": border,
                },
                "original_metadata": {
                    "story_code": code,
                    "plot_summary": format!("A puzzle called {title}."),
                    "author_metadata": {"Given Name(s)": "Agatha", "Surname(s)": "Christie"},
                    "story_annotations": {
                        "Story Title": title,
                        "Date of First Publication (YYYY-MM-DD)": "1923-03-01",
                        "Solvable?": "Yes",
                        "Correct annotator guess": "No",
                    },
                },
                "story": {"full_text": full_text, "reveal_segment": border},
                "detection": {"solution": "<MAIN CULPRIT(S)>The gardener</MAIN CULPRIT(S)>"},
            }),
        );
    }

    pub fn solution(&self, dataset: &str, variant: SolutionVariant, code: &str, solution: &str) {
        self.write(
            dataset,
            ArtifactKind::Solution(variant),
            code,
            &json!({"detection": {"solution": solution}}),
        );
    }

    pub fn summary(&self, dataset: &str, kind: SummaryKind, code: &str, text: &str) {
        self.write(
            dataset,
            ArtifactKind::Summary(kind),
            code,
            &json!({"final_summary": text, "chunks": 3}),
        );
    }

    pub fn true_detective_puzzle(&self, code: &str, name: &str, full_text: &str) {
        self.write(
            "true-detective",
            ArtifactKind::Story,
            code,
            &json!({
                "metadata": {"event_name": name, "story_length": full_text.len(), "model": "o3"},
                "original_metadata": {
                    "author_name": "Tom Fowler",
                    "solve_rate": 41.2,
                    "attempts": 15234,
                    "answer_options": "(a) Ann; (b) Bob; (c) Cy",
                    "correct_answer": "(b) Bob",
                },
                "story": {"full_text": full_text},
                "detection": {
                    "solution": "MAIN CULPRIT(S)\n(b) Bob\n\nREASONING\nMuddy boots.",
                    "correct?": "Yes",
                },
            }),
        );
    }
}
