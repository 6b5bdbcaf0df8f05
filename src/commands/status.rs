use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::annotations::AnnotationStore;
use crate::cli::StatusArgs;
use crate::dataset::{Registry, list_story_files};

pub fn run(args: StatusArgs) -> Result<()> {
    let registry = Registry::new(&args.data_root);
    info!(data_root = %args.data_root.display(), "status requested");

    for descriptor in registry.datasets() {
        if descriptor.stories_dir.is_dir() {
            let story_count = list_story_files(&descriptor.stories_dir)?.len();
            info!(
                dataset = %descriptor.key,
                path = %descriptor.stories_dir.display(),
                story_count,
                "story directory"
            );
        } else {
            warn!(
                dataset = %descriptor.key,
                path = %descriptor.stories_dir.display(),
                "story directory missing"
            );
        }

        let side_dirs = descriptor
            .summary_dirs
            .iter()
            .map(|(kind, dir)| (kind.as_str(), dir))
            .chain(
                descriptor
                    .solution_dirs
                    .iter()
                    .map(|(variant, dir)| (variant.as_str(), dir)),
            );
        for (name, dir) in side_dirs {
            report_dir(descriptor.key, name, dir);
        }
    }

    let store = AnnotationStore::new(&args.annotations_path);
    if store.path().exists() {
        let document = store.get();
        let field_count: usize = document.values().map(|fields| fields.len()).sum();
        info!(
            path = %store.path().display(),
            annotated_stories = document.len(),
            fields = field_count,
            "annotation store"
        );
    } else {
        warn!(path = %store.path().display(), "annotation file missing");
    }

    Ok(())
}

fn report_dir(dataset: &str, name: &str, dir: &Path) {
    if dir.is_dir() {
        info!(
            dataset = %dataset,
            artifact = %name,
            path = %dir.display(),
            "artifact directory present"
        );
    } else {
        warn!(
            dataset = %dataset,
            artifact = %name,
            path = %dir.display(),
            "artifact directory missing"
        );
    }
}
