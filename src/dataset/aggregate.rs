use std::collections::BTreeMap;

use serde_json::Value;

use crate::annotations::AnnotationDocument;
use crate::model::{AggregatedStory, SolutionSection, StoryArtifact};

use super::artifact::{load_optional, locate_story_file, read_story};
use super::registry::{
    ArtifactKind, DatasetDescriptor, DatasetSchema, Registry, SolutionVariant, SummaryKind,
};
use super::sections::parse_sections;
use super::DatasetError;

const UNKNOWN_AUTHOR: &str = "Unknown Author";
const PUBLICATION_DATE_KEY: &str = "Date of First Publication (YYYY-MM-DD)";

/// Fields `AggregatedStory` computes itself. Base artifact keys with these
/// names are shadowed by the computed value.
const COMPUTED_KEYS: &[&str] = &[
    "id",
    "dataset",
    "storyTitle",
    "author",
    "publicationDate",
    "isSolvable",
    "solutionV1",
    "solutionV1Sections",
    "solutionV2",
    "solutionV2Sections",
    "oracleSolution",
    "oracleSolutionSections",
    "concatSolution",
    "concatSolutionSections",
    "summary",
    "storySummary",
    "iterativeSummary",
    "annotations",
];

/// Optional artifacts stored beside a story. Absent ones stay `None`.
#[derive(Debug, Default)]
pub(crate) struct SideArtifacts {
    pub summary: Option<Value>,
    pub story_summary: Option<String>,
    pub iterative_summary: Option<String>,
    pub solutions: BTreeMap<SolutionVariant, String>,
}

impl SideArtifacts {
    pub fn load(descriptor: &DatasetDescriptor, story_code: &str) -> Self {
        let summary: Option<Value> = load_optional(
            descriptor.artifact_path(ArtifactKind::Summary(SummaryKind::Concat), story_code),
        );
        let story_summary = summary.as_ref().and_then(final_summary);
        let iterative_summary = load_optional::<Value>(
            descriptor.artifact_path(ArtifactKind::Summary(SummaryKind::Iterative), story_code),
        )
        .as_ref()
        .and_then(final_summary);

        let solutions = SolutionVariant::ALL
            .into_iter()
            .filter_map(|variant| {
                load_solution(descriptor, variant, story_code).map(|text| (variant, text))
            })
            .collect();

        Self {
            summary,
            story_summary,
            iterative_summary,
            solutions,
        }
    }

    pub fn solution(&self, variant: SolutionVariant) -> Option<&str> {
        self.solutions.get(&variant).map(String::as_str)
    }
}

pub(crate) fn load_solution(
    descriptor: &DatasetDescriptor,
    variant: SolutionVariant,
    story_code: &str,
) -> Option<String> {
    load_optional::<StoryArtifact>(
        descriptor.artifact_path(ArtifactKind::Solution(variant), story_code),
    )
    .and_then(|artifact| artifact.solution_text().map(str::to_owned))
}

pub(crate) fn load_concat_summary(
    descriptor: &DatasetDescriptor,
    story_code: &str,
) -> Option<Value> {
    load_optional(descriptor.artifact_path(ArtifactKind::Summary(SummaryKind::Concat), story_code))
}

pub(crate) fn final_summary(summary: &Value) -> Option<String> {
    summary
        .get("final_summary")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

pub(crate) fn story_title(
    schema: DatasetSchema,
    artifact: &StoryArtifact,
    story_code: &str,
) -> String {
    let title = match schema {
        DatasetSchema::TrueDetective => artifact.metadata.event_name.as_deref(),
        DatasetSchema::Bmds => artifact.story_annotation("Story Title"),
    };

    title
        .filter(|title| !title.is_empty())
        .unwrap_or(story_code)
        .to_string()
}

pub(crate) fn author(schema: DatasetSchema, artifact: &StoryArtifact) -> String {
    let author = match schema {
        DatasetSchema::TrueDetective => artifact
            .original_field("author_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        DatasetSchema::Bmds => {
            let names = artifact.original_field("author_metadata");
            ["Given Name(s)", "Surname(s)"]
                .into_iter()
                .filter_map(|key| names.and_then(|names| names.get(key)).and_then(Value::as_str))
                .filter(|name| !name.is_empty())
                .collect::<Vec<&str>>()
                .join(" ")
        }
    };

    if author.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        author
    }
}

pub(crate) fn publication_date(artifact: &StoryArtifact) -> String {
    artifact
        .story_annotation(PUBLICATION_DATE_KEY)
        .unwrap_or_default()
        .to_string()
}

/// `Some` only when the story carries a "Solvable?" annotation.
pub(crate) fn is_solvable(artifact: &StoryArtifact) -> Option<bool> {
    artifact
        .story_annotation("Solvable?")
        .map(|answer| answer.trim() == "Yes")
}

pub(crate) fn plot_summary(artifact: &StoryArtifact) -> String {
    artifact
        .original_field("plot_summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Joins the base artifact of `story_code` with every side artifact of its
/// dataset and the story's stored annotations.
pub fn get_story(
    registry: &Registry,
    dataset: &str,
    story_code: &str,
    annotations: &AnnotationDocument,
) -> Result<AggregatedStory, DatasetError> {
    let descriptor = registry.resolve(dataset)?;
    let file = locate_story_file(&descriptor.stories_dir, story_code)?
        .ok_or_else(|| DatasetError::StoryNotFound(story_code.to_string()))?;
    let mut artifact = read_story(&file.path)?;
    let side = SideArtifacts::load(descriptor, &file.story_code);

    let mut extra = std::mem::take(&mut artifact.extra);
    extra.retain(|key, _| !COMPUTED_KEYS.contains(&key.as_str()));

    let solution_v1 = artifact.solution_text().map(str::to_owned);
    let solution_v2 = side.solution(SolutionVariant::WithReveal).map(str::to_owned);
    let oracle_solution = side
        .solution(SolutionVariant::WithoutReveal)
        .map(str::to_owned);
    let concat_solution = side.solution(SolutionVariant::Concat).map(str::to_owned);

    Ok(AggregatedStory {
        id: file.story_code.clone(),
        dataset: descriptor.key.to_string(),
        story_title: story_title(descriptor.schema, &artifact, &file.story_code),
        author: author(descriptor.schema, &artifact),
        publication_date: publication_date(&artifact),
        is_solvable: is_solvable(&artifact),
        solution_v1_sections: sections_of(solution_v1.as_deref()),
        solution_v2_sections: sections_of(solution_v2.as_deref()),
        oracle_solution_sections: sections_of(oracle_solution.as_deref()),
        concat_solution_sections: sections_of(concat_solution.as_deref()),
        solution_v1,
        solution_v2,
        oracle_solution,
        concat_solution,
        summary: side.summary,
        story_summary: side.story_summary,
        iterative_summary: side.iterative_summary,
        annotations: annotations.get(&file.story_code).cloned().unwrap_or_default(),
        metadata: artifact.metadata,
        original_metadata: artifact.original_metadata,
        story: artifact.story,
        detection: artifact.detection,
        extra,
    })
}

fn sections_of(text: Option<&str>) -> Vec<SolutionSection> {
    text.map(parse_sections).unwrap_or_default()
}
