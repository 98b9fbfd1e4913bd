use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// All errors the letter renderer can produce. Missing optional assets (the
/// logo, an officer's signature scan) are not errors; they are skipped during
/// layout.
#[derive(Error, Debug)]
pub enum LetterError {
    #[error(transparent)]
    /// An I/O error occurred, e.g. the PDF output stream could not be finalized
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse an embedded font
    FaceParsing(#[from] owned_ttf_parser::FaceParsingError),

    #[error(transparent)]
    /// [image] failed to decode a logo or signature asset
    Image(#[from] image::ImageError),

    /// The requested officer is not in the static directory. Unreachable
    /// through the form's own selector, but any other caller can trip it.
    #[error("no loan officer named {0:?} in the directory")]
    UnknownOfficer(String),
}

/// Service-level error: everything the binary can fail with, mapped onto an
/// HTTP response for the form shell.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] crate::telemetry::TelemetryError),

    #[error("letter error: {0}")]
    Letter(#[from] LetterError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Letter(LetterError::UnknownOfficer(_)) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Letter(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_officer_maps_to_bad_request() {
        let err = AppError::from(LetterError::UnknownOfficer("Nobody".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn io_failure_maps_to_internal_error() {
        let err = AppError::from(std::io::Error::other("stream closed"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
