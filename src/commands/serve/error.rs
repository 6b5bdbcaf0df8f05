use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

use crate::dataset::DatasetError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Dataset '{0}' not found")]
    UnknownDataset(String),
    #[error("Story not found")]
    StoryNotFound(String),
    #[error("Failed to save annotation")]
    Persistence(anyhow::Error),
    #[error("{0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownDataset(_) | Self::StoryNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::UnknownDataset(key) => Self::UnknownDataset(key),
            DatasetError::StoryNotFound(code) => Self::StoryNotFound(code),
            DatasetError::Io(err) => Self::Internal(err),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Persistence(err) => {
                error!(error = %format!("{err:#}"), "annotation write failed");
            }
            Self::Internal(err) => error!(error = %format!("{err:#}"), "request failed"),
            Self::UnknownDataset(key) => debug!(dataset = %key, "unknown dataset requested"),
            Self::StoryNotFound(code) => debug!(story_id = %code, "story not found"),
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
