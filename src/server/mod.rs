pub mod handlers;
pub mod types;

use crate::{
    Error, Result,
    analysis::{ColorAnalyzer, ProcessRunner, UploadStore},
    config::{Config, ServerConfig},
    llm::{OpenAiClient, PromptRelay},
};
use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue, routing::post};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

impl AppState {
    /// Wires the real collaborators described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let llm_client = OpenAiClient::new(&config.llm)?;
        if config.llm.api_key().is_none() {
            warn!("No OpenAI API key configured; /api/openai will answer with 500");
        }

        let uploads = UploadStore::new(&config.analysis.upload_dir);
        uploads.ensure_dir().await?;

        let analyzer = ColorAnalyzer::new(ProcessRunner::from_config(&config.analysis));

        Ok(Self {
            relay: PromptRelay::new(
                Arc::new(llm_client),
                config.llm.system_prompt.clone(),
                config.llm.default_max_tokens,
            ),
            uploads: Arc::new(uploads),
            analyzer: Arc::new(analyzer),
        })
    }
}

/// Builds the full application: routes, body limit, CORS and request tracing.
pub fn router(state: AppState, config: &Config) -> Result<Router> {
    let app = Router::new()
        .route("/api/openai", post(handlers::openai))
        .route("/api/detect-colors", post(handlers::detect_colors))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.analysis.max_upload_bytes))
        .layer(cors_layer(&config.server)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| Error::config(format!("Invalid CORS origin '{}': {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(origins))
}

pub async fn run(config: Config) -> Result<()> {
    let app_state = AppState::from_config(&config).await?;
    let app = router(app_state, &config)?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
