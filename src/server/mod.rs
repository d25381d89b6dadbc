//! HTTP surface: the upload form and the upload endpoint.

pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::gateway::UploadGateway;
use crate::judge::SimilarityJudge;
use crate::reference::{FsReference, ReferenceProvider};

pub use error::ApiError;

/// Shared state handed to every handler. Nothing in here is mutated after
/// startup apart from the semaphore's permit count.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<UploadGateway>,
    pub judge: Arc<SimilarityJudge>,
    pub comparison_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, reference: Arc<dyn ReferenceProvider>) -> Self {
        let gateway = UploadGateway::new(&config.upload);
        let judge = SimilarityJudge::new(reference, &config.judge);
        let permits = Semaphore::new(
            config
                .server
                .max_concurrent_comparisons
                .clamp(1, crate::config::MAX_CONCURRENT_COMPARISONS),
        );

        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            judge: Arc::new(judge),
            comparison_permits: Arc::new(permits),
        }
    }

    /// State backed by the reference image in the configured upload directory.
    pub fn from_config(config: Config) -> Self {
        let reference = Arc::new(FsReference::new(config.upload.reference_path()));
        Self::new(config, reference)
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes();
    let cors = if state.config.server.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(handlers::serve_index))
        .route("/upload", post(handlers::upload_file))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(cors),
        )
        .with_state(state)
}

pub struct TamperServer {
    state: AppState,
}

impl TamperServer {
    pub fn new(config: Config) -> Self {
        Self {
            state: AppState::from_config(config),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let server_config = self.state.config.server.clone();
        let reference_path: PathBuf = self.state.config.upload.reference_path();

        self.state.gateway.ensure_upload_dir()?;
        if !reference_path.exists() {
            tracing::warn!(
                path = %reference_path.display(),
                "Reference image is missing; uploads will fail until it is provisioned"
            );
        }

        let app = build_router(self.state);
        let addr = format!("{}:{}", server_config.host, server_config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("PAN card tamper detector listening on http://{}", addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}
