use std::collections::BTreeSet;

use serde_json::Number;

use crate::model::{StoryArtifact, StorySummary};

use super::aggregate::{
    author, is_solvable, load_concat_summary, load_solution, final_summary, plot_summary,
    publication_date, story_title,
};
use super::artifact::{StoryFile, load_story_dir};
use super::registry::{DatasetDescriptor, Registry, SolutionVariant};
use super::DatasetError;

/// Filters for story listings. An unset filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    /// Case-insensitive substring over title, author, plot summary and code.
    pub text: Option<String>,
    /// Case-insensitive exact author match.
    pub author: Option<String>,
    pub solvable: Option<bool>,
}

impl StoryFilter {
    pub fn text(query: &str) -> Self {
        Self {
            text: Some(query.to_string()),
            ..Self::default()
        }
    }

    fn matches(&self, fields: &ListingFields) -> bool {
        if let Some(query) = self.text.as_deref().map(str::to_lowercase) {
            let hit = [
                fields.title.as_str(),
                fields.author.as_str(),
                fields.plot_summary.as_str(),
                fields.code.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }

        if let Some(author) = self.author.as_deref() {
            if fields.author.to_lowercase() != author.to_lowercase() {
                return false;
            }
        }

        if let Some(solvable) = self.solvable {
            if fields.solvable != Some(solvable) {
                return false;
            }
        }

        true
    }
}

struct ListingFields {
    code: String,
    title: String,
    author: String,
    plot_summary: String,
    solvable: Option<bool>,
}

impl ListingFields {
    fn new(descriptor: &DatasetDescriptor, file: &StoryFile, artifact: &StoryArtifact) -> Self {
        Self {
            code: file.story_code.clone(),
            title: story_title(descriptor.schema, artifact, &file.story_code),
            author: author(descriptor.schema, artifact),
            plot_summary: plot_summary(artifact),
            solvable: is_solvable(artifact),
        }
    }
}

pub fn list_stories(registry: &Registry, dataset: &str) -> Result<Vec<StorySummary>, DatasetError> {
    search_stories(registry, dataset, &StoryFilter::default())
}

/// Free-text search as exposed per dataset: a blank query matches nothing.
pub fn search_text(
    registry: &Registry,
    dataset: &str,
    query: &str,
) -> Result<Vec<StorySummary>, DatasetError> {
    let descriptor = registry.resolve(dataset)?;
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    search_descriptor(descriptor, &StoryFilter::text(query.trim()))
}

pub fn search_stories(
    registry: &Registry,
    dataset: &str,
    filter: &StoryFilter,
) -> Result<Vec<StorySummary>, DatasetError> {
    let descriptor = registry.resolve(dataset)?;
    search_descriptor(descriptor, filter)
}

fn search_descriptor(
    descriptor: &DatasetDescriptor,
    filter: &StoryFilter,
) -> Result<Vec<StorySummary>, DatasetError> {
    let loaded = load_story_dir(&descriptor.stories_dir)?;

    let summaries = loaded
        .stories
        .iter()
        .filter_map(|(file, artifact)| {
            let fields = ListingFields::new(descriptor, file, artifact);
            filter
                .matches(&fields)
                .then(|| summarize(descriptor, fields, artifact))
        })
        .collect();

    Ok(summaries)
}

fn summarize(
    descriptor: &DatasetDescriptor,
    fields: ListingFields,
    artifact: &StoryArtifact,
) -> StorySummary {
    let summary = load_concat_summary(descriptor, &fields.code);
    let story_summary = summary.as_ref().and_then(final_summary);
    let solution_v2 = load_solution(descriptor, SolutionVariant::WithReveal, &fields.code);

    StorySummary {
        id: fields.code.clone(),
        story_code: fields.code,
        story_title: fields.title,
        author: fields.author,
        text_length: artifact
            .metadata
            .story_length
            .clone()
            .unwrap_or_else(|| Number::from(0)),
        plot_summary: fields.plot_summary,
        is_solvable: fields.solvable,
        model: artifact
            .metadata
            .model
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        publication_date: publication_date(artifact),
        summary,
        story_summary,
        solution_v2,
    }
}

pub fn list_authors(registry: &Registry, dataset: &str) -> Result<Vec<String>, DatasetError> {
    let descriptor = registry.resolve(dataset)?;
    let loaded = load_story_dir(&descriptor.stories_dir)?;

    let authors = loaded
        .stories
        .iter()
        .map(|(_, artifact)| author(descriptor.schema, artifact))
        .collect::<BTreeSet<String>>();

    Ok(authors.into_iter().collect())
}
