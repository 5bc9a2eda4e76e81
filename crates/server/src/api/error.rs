use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sitequote_core::errors::{ApplicationError, InterfaceError};
use sitequote_db::RepositoryError;
use tracing::{error, warn};

/// JSON body of every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub correlation_id: String,
    pub retryable: bool,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }

    /// Database failures are retryable; a row that cannot be decoded is not.
    pub fn persistence(error: RepositoryError, correlation_id: &str) -> Self {
        match error {
            RepositoryError::Database(_) => Self::from_application(
                ApplicationError::Persistence(error.to_string()),
                correlation_id,
            ),
            RepositoryError::Decode(_) => Self(InterfaceError::Internal {
                message: error.to_string(),
                correlation_id: correlation_id.to_owned(),
            }),
        }
    }

    pub fn not_found(entity: &'static str, id: &str, correlation_id: &str) -> Self {
        Self::from_application(
            ApplicationError::NotFound { entity, id: id.to_owned() },
            correlation_id,
        )
    }

    pub fn bad_request(code: &str, message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::BadRequest {
            code: code.to_owned(),
            message: message.into(),
            correlation_id: correlation_id.to_owned(),
        })
    }

    pub fn malformed_body(rejection: JsonRejection, correlation_id: &str) -> Self {
        Self::bad_request("malformed_request", rejection.body_text(), correlation_id)
    }

    pub fn unavailable(message: impl Into<String>, correlation_id: &str) -> Self {
        Self(InterfaceError::ServiceUnavailable {
            message: message.into(),
            correlation_id: correlation_id.to_owned(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let interface = self.0;
        let correlation_id = interface.correlation_id().to_owned();
        let retryable = interface.is_retryable();

        let (status, code, message) = match &interface {
            InterfaceError::BadRequest { code, message, .. } => {
                warn!(
                    event_name = "api.request.rejected",
                    correlation_id = %correlation_id,
                    code = %code,
                    error = %message,
                    "request rejected"
                );
                (StatusCode::UNPROCESSABLE_ENTITY, code.clone(), message.clone())
            }
            InterfaceError::NotFound { message, .. } => {
                (StatusCode::NOT_FOUND, "not_found".to_owned(), message.clone())
            }
            InterfaceError::ServiceUnavailable { message, .. } => {
                error!(
                    event_name = "api.request.unavailable",
                    correlation_id = %correlation_id,
                    error = %message,
                    "infrastructure failure while handling request"
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable".to_owned(),
                    interface.user_message().to_owned(),
                )
            }
            InterfaceError::Internal { message, .. } => {
                error!(
                    event_name = "api.request.internal_error",
                    correlation_id = %correlation_id,
                    error = %message,
                    "internal error while handling request"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal".to_owned(),
                    interface.user_message().to_owned(),
                )
            }
        };

        (status, Json(ErrorBody { code, message, correlation_id, retryable })).into_response()
    }
}
