use crate::config::ConfigError;
use crate::integrations::CollaboratorError;
use crate::telemetry::TelemetryError;
use crate::workflows::assessment::{ReportError, ValidationError};
use crate::workflows::batch::BatchError;
use crate::workflows::location::{CoordinateError, FavoritesError, LocationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Input(serde_json::Error),
    Validation(ValidationError),
    Batch(BatchError),
    Location(LocationError),
    Coordinates(CoordinateError),
    Favorites(FavoritesError),
    Upstream(CollaboratorError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Input(err) => write!(f, "invalid input: {}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::Batch(err) => write!(f, "batch error: {}", err),
            AppError::Location(err) => write!(f, "{}", err),
            AppError::Coordinates(err) => write!(f, "{}", err),
            AppError::Favorites(err) => write!(f, "{}", err),
            AppError::Upstream(err) => write!(f, "upstream error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Input(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Batch(err) => Some(err),
            AppError::Location(err) => Some(err),
            AppError::Coordinates(err) => Some(err),
            AppError::Favorites(err) => Some(err),
            AppError::Upstream(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Input(_) | AppError::Batch(_) | AppError::Coordinates(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Location(LocationError::InvalidAddress(_)) => StatusCode::BAD_REQUEST,
            AppError::Location(LocationError::NoResults(_))
            | AppError::Location(LocationError::OutsidePhilippines(_))
            | AppError::Favorites(FavoritesError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Favorites(FavoritesError::DuplicateName(_))
            | AppError::Favorites(FavoritesError::DuplicateCoordinates { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Location(LocationError::Geocoder(_)) | AppError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Favorites(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(err) => json!({
                "error": self.to_string(),
                "missing_fields": err.missing_fields(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BatchError> for AppError {
    fn from(value: BatchError) -> Self {
        Self::Batch(value)
    }
}

impl From<LocationError> for AppError {
    fn from(value: LocationError) -> Self {
        Self::Location(value)
    }
}

impl From<CoordinateError> for AppError {
    fn from(value: CoordinateError) -> Self {
        Self::Coordinates(value)
    }
}

impl From<FavoritesError> for AppError {
    fn from(value: FavoritesError) -> Self {
        Self::Favorites(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        match value {
            ReportError::Coordinates(err) => Self::Coordinates(err),
            ReportError::Upstream(err) => Self::Upstream(err),
            ReportError::Io(err) => Self::Io(err),
        }
    }
}

impl From<CollaboratorError> for AppError {
    fn from(value: CollaboratorError) -> Self {
        Self::Upstream(value)
    }
}
