use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobscrape_core::error::{AppError, ErrorCode};

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Malformed bodies share the 400 `INVALID_URL` shape instead of axum's plain-text rejection.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::InvalidUrl(format!(
            "request body rejected: {}",
            rejection.body_text()
        )))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::InvalidUrl => StatusCode::BAD_REQUEST,
            ErrorCode::UnsupportedPlatform => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        if status.is_server_error() {
            tracing::error!(code = %code, error = %self.0, "Request failed");
        } else {
            tracing::info!(code = %code, error = %self.0, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            details: self.0.technical_details(),
            suggestion: Some(self.0.suggestion().to_string()),
            error_type: Some(code.as_str().to_string()),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: AppError| ApiError(e).status();
        assert_eq!(status(AppError::InvalidUrl("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::UnsupportedPlatform {
                domain: "glassdoor.com".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(AppError::ExtractionFailed {
                url: "u".into(),
                missing: vec!["title"],
                valid_html: true,
                html_preview: String::new(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
