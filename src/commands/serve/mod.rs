//! HTTP API over the dataset registry and the annotation store.

mod error;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::annotations::AnnotationStore;
use crate::cli::ServeArgs;
use crate::dataset::Registry;

pub use error::ApiError;
pub use handlers::router;

/// Shared by every request. Dataset reads go straight to disk, so nothing
/// here is a cache.
#[derive(Debug)]
pub struct AppState {
    pub registry: Registry,
    pub annotations: AnnotationStore,
    /// Dataset behind the non-namespaced `/api/...` routes.
    pub legacy_dataset: String,
}

impl AppState {
    pub fn new(args: &ServeArgs) -> Result<Self> {
        let registry = Registry::new(&args.data_root);
        registry
            .resolve(&args.legacy_dataset)
            .with_context(|| format!("invalid --legacy-dataset {}", args.legacy_dataset))?;

        Ok(Self {
            registry,
            annotations: AnnotationStore::new(&args.annotations_path),
            legacy_dataset: args.legacy_dataset.clone(),
        })
    }
}

pub fn run(args: ServeArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(args))
}

async fn serve(args: ServeArgs) -> Result<()> {
    let state = Arc::new(AppState::new(&args)?);

    for descriptor in state.registry.datasets() {
        if !descriptor.stories_dir.is_dir() {
            warn!(
                dataset = %descriptor.key,
                path = %descriptor.stories_dir.display(),
                "story directory missing; dataset will list as empty"
            );
        }
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %listener.local_addr().context("failed to read bound address")?,
        data_root = %args.data_root.display(),
        annotations = %args.annotations_path.display(),
        legacy_dataset = %args.legacy_dataset,
        "dashboard API listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("dashboard API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => warn!(error = %err, "failed to listen for ctrl-c"),
    }
}
