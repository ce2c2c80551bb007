//! JSON error responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::pipeline::{ErrorClass, PipelineError};

/// Longest diagnostic excerpt returned to clients.
pub const MAX_DETAIL_CHARS: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    pub detail: Option<String>,
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Pipeline(e) => ErrorBody {
                error: e.to_string(),
                kind: e.kind().to_string(),
                detail: e.diagnostics().map(|d| truncate_detail(&d)),
            },
            ApiError::BadRequest(message) => ErrorBody {
                error: self.to_string(),
                kind: "InvalidRequest".to_string(),
                detail: Some(truncate_detail(message)),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) => match e.class() {
                ErrorClass::ClientInput => StatusCode::BAD_REQUEST,
                ErrorClass::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorClass::ServerConfiguration | ErrorClass::ServerProcessing => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        HttpResponse::build(status).json(self.body())
    }
}

pub fn truncate_detail(detail: &str) -> String {
    if detail.chars().count() <= MAX_DETAIL_CHARS {
        return detail.to_string();
    }
    let mut cut: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
    cut.push_str("...");
    cut
}
