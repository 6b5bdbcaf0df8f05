use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::annotations::AnnotationStore;
use crate::cli::{StatsArgs, StatsFormat};
use crate::dataset::{Registry, build_stats, stats_to_csv};
use crate::util::ensure_directory;

pub fn run(args: StatsArgs) -> Result<()> {
    let registry = Registry::new(&args.data_root);
    let annotations = AnnotationStore::new(&args.annotations_path);

    let report = build_stats(&registry, &args.dataset, &annotations.get())?;
    for skipped in &report.skipped {
        warn!(filename = %skipped.filename, reason = %skipped.reason, "story left out of stats");
    }

    let mut rendered = match args.format {
        StatsFormat::Json => serde_json::to_string_pretty(&report.rows)
            .context("failed to serialize stats rows")?,
        StatsFormat::Csv => stats_to_csv(&report.rows)?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                ensure_directory(parent)?;
            }
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = report.rows.len(), "wrote stats");
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            output
                .write_all(rendered.as_bytes())
                .context("failed to write stats to stdout")?;
            output.flush().context("failed to flush stdout")?;
        }
    }

    Ok(())
}
