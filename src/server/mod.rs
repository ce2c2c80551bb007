//! HTTP front end for the pipeline.

pub mod error;
pub mod routes;

use actix_web::{App, HttpServer, error::InternalError, middleware, web};
use tracing::info;

use crate::config::ServerSection;
use crate::pipeline::Pipeline;

pub use error::{ApiError, ErrorBody};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

/// Register the routes and the JSON extractor settings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| {
            let api_error = ApiError::BadRequest(err.to_string());
            let response = actix_web::ResponseError::error_response(&api_error);
            InternalError::from_response(err, response).into()
        });

    cfg.app_data(json_config)
        .route("/health", web::get().to(routes::health))
        .route("/analyze", web::post().to(routes::analyze))
        .route("/generate-report", web::post().to(routes::generate_report))
        .route("/pipeline", web::post().to(routes::pipeline));
}

pub async fn run_server(settings: &ServerSection, pipeline: Pipeline) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(pipeline));

    info!("Binding to {}:{}", settings.host, settings.port);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    });
    if let Some(workers) = settings.workers {
        server = server.workers(workers);
    }

    server
        .bind((settings.host.as_str(), settings.port))?
        .run()
        .await
}
