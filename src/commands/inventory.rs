use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::dataset::{
    ArtifactKind, DatasetDescriptor, Registry, SolutionVariant, SummaryKind, list_story_files,
};
use crate::model::{DatasetInventory, DatasetInventoryManifest, StoryInventoryEntry};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let registry = Registry::new(&args.data_root);
    let manifest = build_manifest(&registry, &args.datasets)?;

    for dataset in &manifest.datasets {
        info!(
            dataset = %dataset.key,
            story_count = dataset.story_count,
            story_dir = %dataset.story_dir,
            "dataset scanned"
        );
    }

    if args.dry_run {
        info!(
            dataset_count = manifest.dataset_count,
            data_root = %manifest.data_root,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.data_root
            .join("manifests")
            .join("dataset_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(dataset_count = manifest.dataset_count, "inventory completed");

    Ok(())
}

/// Inventory of `selected` datasets, or of every registered one when empty.
pub fn build_manifest(
    registry: &Registry,
    selected: &[String],
) -> Result<DatasetInventoryManifest> {
    let mut descriptors = Vec::new();
    if selected.is_empty() {
        descriptors.extend(registry.datasets());
    } else {
        for key in selected {
            descriptors.push(registry.resolve(key)?);
        }
    }

    if descriptors.is_empty() {
        bail!("no datasets registered under {}", registry.data_root().display());
    }

    let mut datasets = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        datasets.push(scan_dataset(descriptor)?);
    }

    Ok(DatasetInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        data_root: registry.data_root().display().to_string(),
        dataset_count: datasets.len(),
        datasets,
    })
}

fn scan_dataset(descriptor: &DatasetDescriptor) -> Result<DatasetInventory> {
    let files = list_story_files(&descriptor.stories_dir)?;

    let mut stories = Vec::with_capacity(files.len());
    for file in files {
        let bytes = fs::metadata(&file.path)
            .with_context(|| format!("failed to stat {}", file.path.display()))?
            .len();
        let sha256 = sha256_file(&file.path)?;

        stories.push(StoryInventoryEntry {
            side_artifacts: side_artifact_presence(descriptor, &file.story_code),
            story_code: file.story_code,
            filename: file.filename,
            bytes,
            sha256,
        });
    }

    if stories.is_empty() {
        warn!(
            dataset = %descriptor.key,
            path = %descriptor.stories_dir.display(),
            "no story files found"
        );
    }

    Ok(DatasetInventory {
        key: descriptor.key.to_string(),
        story_dir: descriptor.stories_dir.display().to_string(),
        story_count: stories.len(),
        stories,
    })
}

/// Which side artifacts exist for one story, keyed by artifact name. Kinds the
/// dataset has no directory for are left out.
fn side_artifact_presence(
    descriptor: &DatasetDescriptor,
    story_code: &str,
) -> BTreeMap<String, bool> {
    let kinds = SummaryKind::ALL
        .into_iter()
        .map(|kind| (kind.as_str(), ArtifactKind::Summary(kind)))
        .chain(
            SolutionVariant::ALL
                .into_iter()
                .map(|variant| (variant.as_str(), ArtifactKind::Solution(variant))),
        );

    kinds
        .filter_map(|(name, kind)| {
            descriptor
                .artifact_path(kind, story_code)
                .map(|path| (name.to_string(), is_file(&path)))
        })
        .collect()
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}
