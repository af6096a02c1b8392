use agrisure::error::ResolutionError;
use agrisure::AgriSureError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Everything a handler can fail with, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// An extractor rejection that carries its own status, e.g. 413
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error(transparent)]
    Service(#[from] AgriSureError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Service(e) => match e {
                AgriSureError::InvalidInput(_) | AgriSureError::UnknownCrop(_) => {
                    StatusCode::BAD_REQUEST
                }
                AgriSureError::Resolution(ResolutionError::GeocodeUnavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AgriSureError::Resolution(ResolutionError::DistrictNotFound)
                | AgriSureError::DistrictDataMissing(_) => StatusCode::NOT_FOUND,
                AgriSureError::DataSourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, message);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, message);
        }

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
