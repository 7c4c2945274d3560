use std::borrow::Cow;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{ErrorReport, ServiceError};
use crate::domain::validation::FieldViolation;

const SOURCE: &str = "infra::http::api";

/// JSON error body: `{ "message": ..., "data": [...] }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub message: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<FieldViolation>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
    data: Option<Vec<FieldViolation>>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(SOURCE, status, message.to_string());
        Self {
            status,
            message,
            data: None,
            report,
        }
    }

    pub fn bad_request(message: &'static str, detail: impl Into<String>) -> Self {
        Self::rejected(StatusCode::BAD_REQUEST, message, detail)
    }

    /// Public `message` for the client, `detail` for the log only.
    fn rejected(status: StatusCode, message: &'static str, detail: impl Into<String>) -> Self {
        let mut error = Self::new(status, message);
        error.report = ErrorReport::from_message(SOURCE, status, detail);
        error
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), "Invalid request body.", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), "Invalid path parameter.", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), "Invalid query string.", rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection.status(), "Invalid multipart payload.", rejection.body_text())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let (status, message): (StatusCode, Cow<'static, str>) = match &err {
            ServiceError::ValidationFailed(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Invalid input.".into())
            }
            ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated.".into()),
            ServiceError::AccountMissing => (StatusCode::UNAUTHORIZED, "Invalid user.".into()),
            ServiceError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password.".into())
            }
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, "Not authorized!".into()),
            ServiceError::NotFound { entity } => {
                (StatusCode::NOT_FOUND, format!("No {entity} found.").into())
            }
            ServiceError::AlreadyExists => (StatusCode::CONFLICT, "User exists already.".into()),
            ServiceError::Repo(_)
            | ServiceError::Credential(_)
            | ServiceError::Password(_)
            | ServiceError::Unexpected(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred.".into())
            }
        };

        let report = ErrorReport::from_error(SOURCE, status, &err);
        let data = match err {
            ServiceError::ValidationFailed(violations) => Some(violations),
            _ => None,
        };

        Self {
            status,
            message,
            data,
            report,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            message: self.message,
            data: self.data,
        };
        let mut response = (self.status, Json(body)).into_response();
        // The logging middleware reads the report back out of the extensions.
        self.report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::ValidationFailed(Vec::new()), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ServiceError::AccountMissing, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::not_found("post"), StatusCode::NOT_FOUND),
            (ServiceError::AlreadyExists, StatusCode::CONFLICT),
            (
                ServiceError::Repo(RepoError::Timeout),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn unexpected_errors_hide_detail_from_clients() {
        let err = ApiError::from(ServiceError::Repo(RepoError::Persistence(
            "connection reset by peer".into(),
        )));
        assert_eq!(err.message, "An error occurred.");
        assert_eq!(err.report.messages[0], "persistence error: connection reset by peer");
    }

    #[test]
    fn rejections_keep_status_and_log_the_extractor_text() {
        let err = ApiError::rejected(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Invalid request body.",
            "Expected request with `Content-Type: application/json`",
        );
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.message, "Invalid request body.");
        assert!(err.data.is_none());
        assert_eq!(
            err.report.messages[0],
            "Expected request with `Content-Type: application/json`"
        );
    }
}
