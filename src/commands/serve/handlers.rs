use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::annotations::AnnotationDocument;
use crate::dataset::{self, StoryFilter};
use crate::model::{AggregatedStory, DatasetInfo, StatsRow, StorySummary};

use super::{ApiError, AppState};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/datasets", get(list_datasets))
        .route("/api/{dataset}/stories", get(list_stories))
        .route("/api/{dataset}/stories/{story_id}", get(get_story))
        .route("/api/{dataset}/search", get(search))
        .route("/api/{dataset}/authors", get(list_authors))
        .route("/api/{dataset}/stats", get(stats))
        .route("/api/{dataset}/stats/csv", get(stats_csv))
        .route("/api/{dataset}/annotations", get(get_annotations))
        .route("/api/{dataset}/annotations/{story_id}", post(set_annotation))
        .route("/api/stories", get(legacy_list_stories))
        .route("/api/stories/{story_id}", get(legacy_get_story))
        .route("/api/search", get(legacy_search))
        .route("/api/authors", get(legacy_list_authors))
        .route("/api/stats", get(legacy_stats))
        .route("/api/annotations", get(legacy_get_annotations))
        .route("/api/annotations/{story_id}", post(legacy_set_annotation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs filesystem-bound work off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
}

// -- datasets --

async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetInfo>> {
    Json(
        state
            .registry
            .datasets()
            .iter()
            .map(|descriptor| descriptor.info())
            .collect(),
    )
}

// -- stories --

async fn list_stories(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> ApiResult<Vec<StorySummary>> {
    load_summaries(state, dataset, None).await
}

async fn legacy_list_stories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<StorySummary>> {
    let dataset = state.legacy_dataset.clone();
    load_summaries(state, dataset, None).await
}

async fn get_story(
    State(state): State<Arc<AppState>>,
    Path((dataset, story_id)): Path<(String, String)>,
) -> ApiResult<AggregatedStory> {
    load_story(state, dataset, story_id).await
}

async fn legacy_get_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<String>,
) -> ApiResult<AggregatedStory> {
    let dataset = state.legacy_dataset.clone();
    load_story(state, dataset, story_id).await
}

async fn load_summaries(
    state: Arc<AppState>,
    dataset: String,
    filter: Option<StoryFilter>,
) -> ApiResult<Vec<StorySummary>> {
    run_blocking(move || {
        let summaries = match filter {
            Some(filter) => dataset::search_stories(&state.registry, &dataset, &filter)?,
            None => dataset::list_stories(&state.registry, &dataset)?,
        };
        Ok(summaries)
    })
    .await
    .map(Json)
}

async fn load_story(
    state: Arc<AppState>,
    dataset: String,
    story_id: String,
) -> ApiResult<AggregatedStory> {
    run_blocking(move || {
        let annotations = state.annotations.get();
        Ok(dataset::get_story(
            &state.registry,
            &dataset,
            &story_id,
            &annotations,
        )?)
    })
    .await
    .map(Json)
}

// -- search --

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<StorySummary>> {
    run_blocking(move || {
        let query = params.q.unwrap_or_default();
        Ok(dataset::search_text(&state.registry, &dataset, &query)?)
    })
    .await
    .map(Json)
}

#[derive(Debug, Deserialize)]
struct LegacySearchParams {
    q: Option<String>,
    author: Option<String>,
    solvable: Option<String>,
}

impl LegacySearchParams {
    /// Blank parameters are treated as absent; `solvable` is `true` or not.
    fn into_filter(self) -> StoryFilter {
        let present = |value: Option<String>| {
            value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        StoryFilter {
            text: present(self.q),
            author: present(self.author),
            solvable: present(self.solvable).map(|value| value.eq_ignore_ascii_case("true")),
        }
    }
}

async fn legacy_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LegacySearchParams>,
) -> ApiResult<Vec<StorySummary>> {
    let dataset = state.legacy_dataset.clone();
    load_summaries(state, dataset, Some(params.into_filter())).await
}

// -- authors --

async fn list_authors(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> ApiResult<Vec<String>> {
    load_authors(state, dataset).await
}

async fn legacy_list_authors(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let dataset = state.legacy_dataset.clone();
    load_authors(state, dataset).await
}

async fn load_authors(state: Arc<AppState>, dataset: String) -> ApiResult<Vec<String>> {
    run_blocking(move || Ok(dataset::list_authors(&state.registry, &dataset)?))
        .await
        .map(Json)
}

// -- stats --

async fn stats(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> ApiResult<Vec<StatsRow>> {
    load_stats(state, dataset).await.map(Json)
}

async fn legacy_stats(State(state): State<Arc<AppState>>) -> ApiResult<Vec<StatsRow>> {
    let dataset = state.legacy_dataset.clone();
    load_stats(state, dataset).await.map(Json)
}

async fn stats_csv(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let filename = format!("attachment; filename=\"{dataset}_story_stats.csv\"");
    let rows = load_stats(state, dataset).await?;
    let csv = dataset::stats_to_csv(&rows).map_err(ApiError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    ))
}

async fn load_stats(state: Arc<AppState>, dataset: String) -> Result<Vec<StatsRow>, ApiError> {
    run_blocking(move || {
        let annotations = state.annotations.get();
        let report = dataset::build_stats(&state.registry, &dataset, &annotations)?;
        Ok(report.rows)
    })
    .await
}

// -- annotations --

#[derive(Debug, Deserialize)]
struct AnnotationBody {
    field: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    success: bool,
}

async fn get_annotations(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
) -> ApiResult<AnnotationDocument> {
    state.registry.resolve(&dataset)?;
    run_blocking(move || Ok(state.annotations.get()))
        .await
        .map(Json)
}

async fn legacy_get_annotations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<AnnotationDocument> {
    run_blocking(move || Ok(state.annotations.get()))
        .await
        .map(Json)
}

async fn set_annotation(
    State(state): State<Arc<AppState>>,
    Path((dataset, story_id)): Path<(String, String)>,
    Json(body): Json<AnnotationBody>,
) -> ApiResult<SaveResponse> {
    state.registry.resolve(&dataset)?;
    save_annotation(state, story_id, body).await
}

async fn legacy_set_annotation(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<String>,
    Json(body): Json<AnnotationBody>,
) -> ApiResult<SaveResponse> {
    save_annotation(state, story_id, body).await
}

async fn save_annotation(
    state: Arc<AppState>,
    story_id: String,
    body: AnnotationBody,
) -> ApiResult<SaveResponse> {
    run_blocking(move || {
        state
            .annotations
            .set(&story_id, &body.field, body.value)
            .map_err(ApiError::Persistence)
    })
    .await?;

    Ok(Json(SaveResponse { success: true }))
}
