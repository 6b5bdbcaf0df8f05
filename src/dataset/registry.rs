use std::path::{Path, PathBuf};

use crate::model::DatasetInfo;

use super::DatasetError;

pub const SOLUTION_SUFFIX: &str = "_detective_solution.json";
pub const SUMMARY_SUFFIX: &str = "_latest_full_document_response.json";

/// Per-dataset shape of the annotation payloads. Every "which dataset is this?"
/// decision goes through here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DatasetSchema {
    Bmds,
    TrueDetective,
}

impl DatasetSchema {
    /// Section titles naming the culprit, in lookup order.
    pub fn culprit_titles(self) -> &'static [&'static str] {
        match self {
            Self::Bmds => &["MAIN CULPRIT(S)"],
            Self::TrueDetective => &["CULPRIT", "MAIN CULPRIT(S)"],
        }
    }

    pub fn accomplice_titles(self) -> &'static [&'static str] {
        match self {
            Self::Bmds => &["ACCOMPLICE(S)"],
            Self::TrueDetective => &[],
        }
    }

    pub fn has_puzzle_metadata(self) -> bool {
        matches!(self, Self::TrueDetective)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum SolutionVariant {
    /// Solved with the reveal in view; used as the gold answer.
    WithReveal,
    /// Solved from the pre-reveal text only (oracle guess).
    WithoutReveal,
    /// Solved from the concatenated summary with a custom prompt.
    Concat,
}

impl SolutionVariant {
    pub const ALL: [Self; 3] = [Self::WithReveal, Self::WithoutReveal, Self::Concat];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WithReveal => "with_reveal",
            Self::WithoutReveal => "without_reveal",
            Self::Concat => "concat",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum SummaryKind {
    Concat,
    Iterative,
}

impl SummaryKind {
    pub const ALL: [Self; 2] = [Self::Concat, Self::Iterative];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concat => "concat_summary",
            Self::Iterative => "iterative_summary",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArtifactKind {
    Story,
    Solution(SolutionVariant),
    Summary(SummaryKind),
}

struct DatasetLayout {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    schema: DatasetSchema,
    stories: &'static str,
    summaries: &'static [(SummaryKind, &'static str)],
    solutions: &'static [(SolutionVariant, &'static str)],
}

const BUILTIN_DATASETS: &[DatasetLayout] = &[
    DatasetLayout {
        key: "bmds",
        name: "BMDS Dataset",
        description: "Benchmark for Mystery & Detective Stories",
        schema: DatasetSchema::Bmds,
        stories: "bmds/stories",
        summaries: &[
            (SummaryKind::Concat, "bmds/summaries/summaries-concat-1k-v0"),
            (
                SummaryKind::Iterative,
                "bmds/summaries/summaries-iterative-1k-v0",
            ),
        ],
        solutions: &[
            (
                SolutionVariant::WithReveal,
                "bmds/solutions/detective_solutions-o3-given-reveal",
            ),
            (
                SolutionVariant::WithoutReveal,
                "bmds/solutions/detective_solutions-o3-without-reveal",
            ),
            (
                SolutionVariant::Concat,
                "bmds/solutions/detective_solutions-custom-bmds-600-900-words-v2",
            ),
        ],
    },
    DatasetLayout {
        key: "true-detective",
        name: "True Detective Dataset",
        description: "Short mystery puzzles from the True Detective dataset (https://github.com/TartuNLP/true-detective)",
        schema: DatasetSchema::TrueDetective,
        stories: "true-detective/solutions/detective_solutions-true-detective-without-reveal",
        summaries: &[(SummaryKind::Concat, "true-detective/summaries")],
        solutions: &[
            (
                SolutionVariant::WithReveal,
                "true-detective/solutions/detective_solutions-true-detective-with-reveal",
            ),
            (
                SolutionVariant::WithoutReveal,
                "true-detective/solutions/detective_solutions-true-detective-without-reveal",
            ),
        ],
    },
];

#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub schema: DatasetSchema,
    pub stories_dir: PathBuf,
    pub summary_dirs: Vec<(SummaryKind, PathBuf)>,
    pub solution_dirs: Vec<(SolutionVariant, PathBuf)>,
}

impl DatasetDescriptor {
    pub fn summary_dir(&self, kind: SummaryKind) -> Option<&Path> {
        self.summary_dirs
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, dir)| dir.as_path())
    }

    pub fn solution_dir(&self, variant: SolutionVariant) -> Option<&Path> {
        self.solution_dirs
            .iter()
            .find(|(candidate, _)| *candidate == variant)
            .map(|(_, dir)| dir.as_path())
    }

    /// Conventional location of one artifact for `story_code`. `None` means the
    /// dataset has no directory for that kind of artifact at all.
    pub fn artifact_path(&self, kind: ArtifactKind, story_code: &str) -> Option<PathBuf> {
        match kind {
            ArtifactKind::Story => Some(
                self.stories_dir
                    .join(format!("{story_code}{SOLUTION_SUFFIX}")),
            ),
            ArtifactKind::Solution(variant) => self
                .solution_dir(variant)
                .map(|dir| dir.join(format!("{story_code}{SOLUTION_SUFFIX}"))),
            ArtifactKind::Summary(kind) => self
                .summary_dir(kind)
                .map(|dir| dir.join(format!("{story_code}{SUMMARY_SUFFIX}"))),
        }
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            key: self.key.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    data_root: PathBuf,
    datasets: Vec<DatasetDescriptor>,
}

impl Registry {
    pub fn new(data_root: &Path) -> Self {
        let datasets = BUILTIN_DATASETS
            .iter()
            .map(|layout| DatasetDescriptor {
                key: layout.key,
                name: layout.name,
                description: layout.description,
                schema: layout.schema,
                stories_dir: data_root.join(layout.stories),
                summary_dirs: layout
                    .summaries
                    .iter()
                    .map(|(kind, dir)| (*kind, data_root.join(dir)))
                    .collect(),
                solution_dirs: layout
                    .solutions
                    .iter()
                    .map(|(variant, dir)| (*variant, data_root.join(dir)))
                    .collect(),
            })
            .collect();

        Self {
            data_root: data_root.to_path_buf(),
            datasets,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn datasets(&self) -> &[DatasetDescriptor] {
        &self.datasets
    }

    pub fn resolve(&self, key: &str) -> Result<&DatasetDescriptor, DatasetError> {
        self.datasets
            .iter()
            .find(|descriptor| descriptor.key == key)
            .ok_or_else(|| DatasetError::UnknownDataset(key.to_string()))
    }
}
