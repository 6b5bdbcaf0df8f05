//! Human annotations, kept as one JSON document keyed by story id, then field.
//!
//! Writes are read-modify-write of the whole document. Writers inside this
//! process are serialised and the file is replaced atomically, but two
//! separate processes sharing the file still race (last write wins).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{info, warn};

use crate::util::write_json_pretty;

pub type StoryAnnotations = BTreeMap<String, Value>;
pub type AnnotationDocument = BTreeMap<String, StoryAnnotations>;

#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AnnotationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document. A missing file is an empty document; an unreadable
    /// or malformed one is logged and also read as empty.
    pub fn get(&self) -> AnnotationDocument {
        match self.load() {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "ignoring unreadable annotations"
                );
                AnnotationDocument::new()
            }
        }
    }

    /// Upserts one field for one story and persists the whole document.
    /// Refuses to overwrite a document it cannot parse.
    pub fn set(&self, story_id: &str, field: &str, value: Value) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("annotation write lock poisoned"))?;

        let mut document = self.load()?;
        document
            .entry(story_id.to_string())
            .or_default()
            .insert(field.to_string(), value);

        write_json_pretty(&self.path, &document)
            .with_context(|| format!("failed to save annotations to {}", self.path.display()))?;

        info!(story_id = %story_id, field = %field, "annotation saved");
        Ok(())
    }

    fn load(&self) -> Result<AnnotationDocument> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AnnotationDocument::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()));
            }
        };

        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }
}

/// Display form of a stored value: strings verbatim, `null` as `""`, anything
/// else as compact JSON.
pub fn annotation_text(annotations: Option<&StoryAnnotations>, field: &str) -> String {
    match annotations.and_then(|fields| fields.get(field)) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_reads_as_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("user_annotations.json"));
        assert!(store.get().is_empty());
    }

    #[test]
    fn set_then_get_round_trips_and_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("user_annotations.json"));

        store.set("story007", "culpritCorrect", json!("Yes")).unwrap();
        store.set("story007", "accompliceCorrect", json!("No")).unwrap();
        store.set("story008", "culpritCorrect", json!("Wrong Alias")).unwrap();
        store.set("story007", "culpritCorrect", json!("Missing First Name")).unwrap();

        let document = store.get();
        assert_eq!(document["story007"]["culpritCorrect"], json!("Missing First Name"));
        assert_eq!(document["story007"]["accompliceCorrect"], json!("No"));
        assert_eq!(document["story008"]["culpritCorrect"], json!("Wrong Alias"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  \"story007\": {"));
    }

    #[test]
    fn concurrent_writers_on_different_fields_all_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("user_annotations.json"));

        std::thread::scope(|scope| {
            for index in 0..16 {
                let store = &store;
                scope.spawn(move || {
                    store
                        .set("story007", &format!("field{index}"), json!(index))
                        .unwrap();
                });
            }
        });

        let document = store.get();
        let fields = &document["story007"];
        assert_eq!(fields.len(), 16);
        for index in 0..16 {
            assert_eq!(fields[&format!("field{index}")], json!(index));
        }
    }

    #[test]
    fn malformed_document_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_annotations.json");
        fs::write(&path, "{ truncated").unwrap();
        let store = AnnotationStore::new(&path);

        assert!(store.get().is_empty());
        assert!(store.set("story007", "culpritCorrect", json!("Yes")).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ truncated");
    }

    #[test]
    fn annotation_text_flattens_values() {
        let mut fields = StoryAnnotations::new();
        fields.insert("a".into(), json!("Yes"));
        fields.insert("b".into(), json!(412));
        fields.insert("c".into(), Value::Null);

        assert_eq!(annotation_text(Some(&fields), "a"), "Yes");
        assert_eq!(annotation_text(Some(&fields), "b"), "412");
        assert_eq!(annotation_text(Some(&fields), "c"), "");
        assert_eq!(annotation_text(Some(&fields), "d"), "");
        assert_eq!(annotation_text(None, "a"), "");
    }
}
