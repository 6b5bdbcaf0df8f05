use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::model::StoryArtifact;

use super::registry::SOLUTION_SUFFIX;

/// Outcome of reading one optional JSON artifact.
#[derive(Debug)]
pub enum Artifact<T> {
    Loaded(T),
    Missing,
    /// The file exists but could not be read or parsed. The cause is logged
    /// where it is detected.
    Malformed,
}

impl<T> Artifact<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Missing | Self::Malformed => None,
        }
    }
}

pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Artifact<T> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "artifact not present");
            return Artifact::Missing;
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "artifact unreadable; treating as absent");
            return Artifact::Malformed;
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(value) => Artifact::Loaded(value),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "malformed artifact; treating as absent");
            Artifact::Malformed
        }
    }
}

/// Reads an artifact whose location may not exist for this dataset.
pub fn load_optional<T: DeserializeOwned>(path: Option<PathBuf>) -> Option<T> {
    path.and_then(|path| read_artifact(&path).into_option())
}

pub fn read_story(path: &Path) -> Result<StoryArtifact> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryFile {
    pub story_code: String,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SkippedStory {
    pub filename: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedStories {
    pub stories: Vec<(StoryFile, StoryArtifact)>,
    pub skipped: Vec<SkippedStory>,
}

/// `story007_detective_solution.json` -> `story007`; other `.json` files lose
/// only their extension.
pub fn story_code_from_filename(filename: &str) -> Option<&str> {
    let code = filename
        .strip_suffix(SOLUTION_SUFFIX)
        .or_else(|| filename.strip_suffix(".json"))?;
    if code.is_empty() { None } else { Some(code) }
}

pub fn list_story_files(dir: &Path) -> Result<Vec<StoryFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %dir.display(), "story directory missing");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", dir.display()));
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(story_code) = story_code_from_filename(filename) else {
            continue;
        };

        files.push(StoryFile {
            story_code: story_code.to_string(),
            filename: filename.to_string(),
            path: path.clone(),
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(dedupe_story_codes(files))
}

/// One file per story code. `story007_detective_solution.json` wins over a
/// bare `story007.json`; the loser is logged.
fn dedupe_story_codes(files: Vec<StoryFile>) -> Vec<StoryFile> {
    let is_conventional = |file: &StoryFile| file.filename.ends_with(SOLUTION_SUFFIX);
    let mut by_code: BTreeMap<String, StoryFile> = BTreeMap::new();

    for file in files {
        match by_code.entry(file.story_code.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(file);
            }
            Entry::Occupied(mut slot) => {
                let ignored = if is_conventional(&file) && !is_conventional(slot.get()) {
                    slot.insert(file)
                } else {
                    file
                };
                warn!(
                    story_code = %ignored.story_code,
                    kept = %slot.get().filename,
                    ignored = %ignored.filename,
                    "duplicate story code; ignoring file"
                );
            }
        }
    }

    let mut files = by_code.into_values().collect::<Vec<StoryFile>>();
    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    files
}

/// Finds the base artifact whose derived story code equals `story_code`
/// exactly, so `story1` never resolves to `story12`.
pub fn locate_story_file(dir: &Path, story_code: &str) -> Result<Option<StoryFile>> {
    if story_code.is_empty()
        || story_code.contains(['/', '\\'])
        || story_code == "."
        || story_code == ".."
    {
        return Ok(None);
    }

    let conventional = format!("{story_code}{SOLUTION_SUFFIX}");
    let conventional_path = dir.join(&conventional);
    if conventional_path.is_file() {
        return Ok(Some(StoryFile {
            story_code: story_code.to_string(),
            filename: conventional,
            path: conventional_path,
        }));
    }

    Ok(list_story_files(dir)?
        .into_iter()
        .find(|file| file.story_code == story_code))
}

/// Loads every story file in `dir`; unreadable or malformed files are logged
/// and reported in `skipped` instead of failing the whole scan.
pub fn load_story_dir(dir: &Path) -> Result<LoadedStories> {
    let mut loaded = LoadedStories::default();

    for file in list_story_files(dir)? {
        match read_story(&file.path) {
            Ok(artifact) => loaded.stories.push((file, artifact)),
            Err(err) => {
                warn!(file = %file.filename, error = %format!("{err:#}"), "skipping story file");
                loaded.skipped.push(SkippedStory {
                    filename: file.filename,
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_code_strips_conventional_suffix_first() {
        assert_eq!(
            story_code_from_filename("story007_detective_solution.json"),
            Some("story007")
        );
        assert_eq!(story_code_from_filename("puzzle-12.json"), Some("puzzle-12"));
        assert_eq!(story_code_from_filename("notes.txt"), None);
        assert_eq!(story_code_from_filename(".json"), None);
    }

    #[test]
    fn read_artifact_distinguishes_missing_from_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, r#"{"final_summary": "ok"}"#).unwrap();
        fs::write(&bad, "{not json").unwrap();

        let loaded: Artifact<serde_json::Value> = read_artifact(&good);
        assert!(matches!(loaded, Artifact::Loaded(_)));

        let missing: Artifact<serde_json::Value> = read_artifact(&dir.path().join("nope.json"));
        assert!(matches!(missing, Artifact::Missing));

        let malformed: Artifact<serde_json::Value> = read_artifact(&bad);
        assert!(matches!(malformed, Artifact::Malformed));
        assert!(malformed.into_option().is_none());
    }

    #[test]
    fn locate_story_file_requires_exact_code() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("story12_detective_solution.json"), "{}").unwrap();
        fs::write(dir.path().join("bare1.json"), "{}").unwrap();

        assert!(locate_story_file(dir.path(), "story1").unwrap().is_none());
        assert_eq!(
            locate_story_file(dir.path(), "story12")
                .unwrap()
                .unwrap()
                .filename,
            "story12_detective_solution.json"
        );
        assert_eq!(
            locate_story_file(dir.path(), "bare1").unwrap().unwrap().filename,
            "bare1.json"
        );
        assert!(locate_story_file(dir.path(), "Story12").unwrap().is_none());
        assert!(locate_story_file(dir.path(), "../story12").unwrap().is_none());
    }

    #[test]
    fn load_story_dir_reports_skipped_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_detective_solution.json"), "{}").unwrap();
        fs::write(dir.path().join("b_detective_solution.json"), "[1, 2").unwrap();
        fs::write(dir.path().join("readme.md"), "ignored").unwrap();

        let loaded = load_story_dir(dir.path()).unwrap();
        assert_eq!(loaded.stories.len(), 1);
        assert_eq!(loaded.stories[0].0.story_code, "a");
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].filename, "b_detective_solution.json");
    }

    #[test]
    fn duplicate_story_code_keeps_conventional_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("story007.json"), "{}").unwrap();
        fs::write(dir.path().join("story007_detective_solution.json"), "{}").unwrap();
        fs::write(dir.path().join("story008.json"), "{}").unwrap();

        let files = list_story_files(dir.path()).unwrap();
        let names = files
            .iter()
            .map(|file| file.filename.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(names, vec!["story007_detective_solution.json", "story008.json"]);

        let loaded = load_story_dir(dir.path()).unwrap();
        assert_eq!(loaded.stories.len(), 2);
    }

    #[test]
    fn missing_story_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = list_story_files(&dir.path().join("absent")).unwrap();
        assert!(files.is_empty());
    }
}
