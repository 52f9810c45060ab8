use thiserror::Error;

use crate::envelope::HandlerResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Database(e) if is_unavailable(e) => 503,
            AppError::Database(_) => 500,
            AppError::Http(_) | AppError::Upstream(_) => 502,
            AppError::NotFound(_) => 404,
            AppError::InvalidInput(_) => 400,
            AppError::MethodNotAllowed => 405,
            AppError::Config(_) | AppError::Internal(_) => 500,
        }
    }

    /// Message safe to hand back to the caller. Store and upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(e) if is_unavailable(e) => "Database unavailable".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Http(_) | AppError::Upstream(_) => "Upstream API error".to_string(),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::Config(msg) => {
                msg.clone()
            }
            AppError::MethodNotAllowed => "Method not allowed".to_string(),
        }
    }
}

fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

impl From<AppError> for HandlerResponse {
    fn from(err: AppError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!(error = %err, status, "request failed");
        } else {
            tracing::debug!(error = %err, status, "request rejected");
        }
        HandlerResponse::error(status, &err.public_message())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::MethodNotAllowed.status_code(), 405);
        assert_eq!(AppError::Config("x".into()).status_code(), 500);
        assert_eq!(AppError::Upstream("x".into()).status_code(), 502);
        assert_eq!(AppError::Database(sqlx::Error::PoolTimedOut).status_code(), 503);
        assert_eq!(AppError::Database(sqlx::Error::RowNotFound).status_code(), 500);
    }

    #[test]
    fn test_details_are_not_leaked() {
        let err = AppError::Upstream("401 invalid api key sk-123".into());
        assert_eq!(err.public_message(), "Upstream API error");

        let err = AppError::Internal("stack trace".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_into_response_envelope() {
        let response: HandlerResponse = AppError::InvalidInput("Email is required".into()).into();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"error":"Email is required"}"#);
        assert_eq!(
            response.headers.get("Access-Control-Allow-Origin").map(String::as_str),
            Some("*")
        );
    }
}
