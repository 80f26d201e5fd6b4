//! Request extractors that report failures in the MDR error format.

use crate::error::ApiError;
use crate::AppState;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::Json;
use mdr_core::{Author, MdrError};
use serde::de::DeserializeOwned;

pub const AUTHOR_NAME_HEADER: &str = "x-author-name";
pub const AUTHOR_EMAIL_HEADER: &str = "x-author-email";

/// The acting author: from the `x-author-name` and `x-author-email` headers, else the
/// configured default author.
pub struct RequestAuthor(pub Author);

#[async_trait]
impl FromRequestParts<AppState> for RequestAuthor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        match header(AUTHOR_NAME_HEADER) {
            Some(name) => Ok(Self(Author::new(name, header(AUTHOR_EMAIL_HEADER))?)),
            None => Ok(Self(state.services.cfg.default_author().clone())),
        }
    }
}

/// `Json` whose rejections become validation errors.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(MdrError::Validation(rejection.body_text()))),
        }
    }
}

/// Optional JSON body. An empty body is `None`; anything else must be valid JSON sent as
/// `application/json`.
pub struct OptionalJson<T>(pub Option<T>);

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_content = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json_content_type);
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError(MdrError::Validation(rejection.body_text())))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        if !json_content {
            return Err(ApiError(MdrError::Validation(
                "Expected request with `Content-Type: application/json`".into(),
            )));
        }
        serde_json::from_slice(&bytes)
            .map(|value| Self(Some(value)))
            .map_err(|e| ApiError(MdrError::Validation(format!("Invalid JSON body: {e}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/merge-patch+json"));
        assert!(!is_json_content_type("text/plain"));
    }
}
