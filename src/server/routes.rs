//! Route handlers.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use solsentry_core::AnalysisResult;

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SourceRequest {
    pub source_code: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /analyze`: run the static analyzer only.
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<SourceRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = state.pipeline.analyze(&body.source_code).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// `POST /generate-report`: synthesize a report from supplied issues.
pub async fn generate_report(
    state: web::Data<AppState>,
    body: web::Json<AnalysisResult>,
) -> Result<HttpResponse, ApiError> {
    let report = state.pipeline.synthesize(body.as_slice()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// `POST /pipeline`: analyze then synthesize.
pub async fn pipeline(
    state: web::Data<AppState>,
    body: web::Json<SourceRequest>,
) -> Result<HttpResponse, ApiError> {
    let output = state.pipeline.run(&body.source_code).await?;
    Ok(HttpResponse::Ok().json(output))
}
