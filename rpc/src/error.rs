//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use venue_codes::CodeError;

use crate::handlers::ApiResponse;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Code(CodeError::InvalidFormat(_)) => StatusCode::BAD_REQUEST,
            RpcError::Code(CodeError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            RpcError::Code(CodeError::ConcurrentRegenerationConflict { .. }) => {
                StatusCode::CONFLICT
            }
            RpcError::Code(CodeError::StorageFault(_))
            | RpcError::Code(CodeError::InvalidConfig(_))
            | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Code(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        RpcError::Server(e.to_string())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = ApiResponse::<()>::error(self.to_string(), self.is_retryable());
        (status, Json(body)).into_response()
    }
}
