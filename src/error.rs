use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::task::JoinError;

use crate::orchestrator::OrchestratorError;

// Taken from https://github.com/tokio-rs/axum/blob/main/examples/anyhow-error-response/src/main.rs
#[derive(Debug)]
pub struct ServiceError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HttpErrorResponse {
    pub error: String,
}

impl From<String> for HttpErrorResponse {
    fn from(message: String) -> Self {
        HttpErrorResponse { error: message }
    }
}

impl From<&str> for HttpErrorResponse {
    fn from(message: &str) -> Self {
        HttpErrorResponse {
            error: message.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut res = Json(self.message).into_response();
        *res.status_mut() = self.status;
        res
    }
}

impl From<OrchestratorError> for ServiceError {
    fn from(err: OrchestratorError) -> Self {
        let status = match err {
            OrchestratorError::UnknownTask(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ServiceError {
            status,
            message: HttpErrorResponse::from(err.to_string()),
        }
    }
}

impl From<JoinError> for ServiceError {
    fn from(err: JoinError) -> Self {
        ServiceError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: HttpErrorResponse::from(format!("inference task failed: {err}")),
        }
    }
}

pub type ServiceResult<T, E = ServiceError> = Result<T, E>;

#[macro_export]
macro_rules! bail_service {
    ($status:expr, $error_message:expr) => {
        return Err($crate::error::ServiceError {
            status: $status,
            message: $crate::error::HttpErrorResponse::from($error_message),
        })
    };
    ($status:expr, $fmt:expr $(, $arg:expr)+) => {
        return Err($crate::error::ServiceError {
            status: $status,
            message: $crate::error::HttpErrorResponse::from(format!($fmt $(, $arg)+)),
        })
    };
}

#[macro_export]
macro_rules! exit_err {
    ($code:expr, $fmt:expr $(, $arg:expr)*) => {
        {
            tracing::error!($fmt $(, $arg)*);
            std::process::exit($code);
        }
    };
}
