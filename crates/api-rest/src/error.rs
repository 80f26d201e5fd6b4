use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mdr_core::MdrError;

/// An [`MdrError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub MdrError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<MdrError> for ApiError {
    fn from(err: MdrError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MdrError::BusinessLogic(_) | MdrError::Versioning { .. } => StatusCode::BAD_REQUEST,
            MdrError::NotFound(_) => StatusCode::NOT_FOUND,
            MdrError::AlreadyExists(_) => StatusCode::CONFLICT,
            MdrError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_internal() {
            tracing::error!("request failed: {:?}", self.0);
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {}", self.0);
        }
        (status, Json(ErrorRes::from_error(&self.0))).into_response()
    }
}
