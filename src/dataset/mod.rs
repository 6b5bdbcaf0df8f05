//! Read side of the dashboard: where each dataset keeps its artifacts, how a
//! story is assembled from them, and the tables derived from whole datasets.

mod aggregate;
mod artifact;
mod csv_export;
mod listing;
mod registry;
mod sections;
mod stats;
#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregate::get_story;
pub use artifact::list_story_files;
pub use csv_export::stats_to_csv;
pub use listing::{StoryFilter, list_authors, list_stories, search_stories, search_text};
pub use registry::{ArtifactKind, DatasetDescriptor, Registry, SolutionVariant, SummaryKind};
pub use stats::build_stats;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset '{0}' not found")]
    UnknownDataset(String),
    #[error("Story '{0}' not found")]
    StoryNotFound(String),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}
