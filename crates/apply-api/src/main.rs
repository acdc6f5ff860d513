//! Apply orchestrator HTTP API.
//!
//! Wires the Postgres storage adapters, the Claude-CLI-backed generator, the
//! Markdown document renderer, and an (initially empty) Platform Registry
//! into the Orchestrator and the two tailoring pipelines, then serves the
//! apply/tailor-resume/cover-letter trigger, confirm/cancel, and SSE routes
//! over Axum. Concrete platform adapters (per-site browser/API integrations)
//! are out of scope here (SPEC_FULL.md §1) and are the deployment's to
//! register before traffic arrives.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use apply_adapters::postgres::Db;
use apply_adapters::{
    ClaudeCliGenerator, CoverLetterPipeline, MarkdownDocumentRenderer, Orchestrator,
    PlainTextResumeExtractor, PlatformRegistry, PostgresActivityLog, PostgresJobStore,
    PostgresResumeVersionStore, ResumeTailorPipeline,
};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::ApiConfig;
use state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs/:job_key/apply", post(handlers::apply::trigger_apply))
        .route("/jobs/:job_key/apply/confirm", post(handlers::apply::confirm_apply))
        .route("/jobs/:job_key/apply/cancel", post(handlers::apply::cancel_apply))
        .route("/jobs/:job_key/apply/stream", get(handlers::stream::apply_stream))
        .route(
            "/jobs/:job_key/tailor-resume",
            post(handlers::resume::trigger_tailor_resume),
        )
        .route(
            "/jobs/:job_key/tailor-resume/stream",
            get(handlers::stream::resume_stream),
        )
        .route(
            "/jobs/:job_key/cover-letter",
            post(handlers::resume::trigger_cover_letter),
        )
        .route(
            "/jobs/:job_key/cover-letter/stream",
            get(handlers::stream::cover_letter_stream),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn build_state(config: &ApiConfig) -> AppState {
    let db = Db::connect(&config.engine.database_url, config.engine.max_connections)
        .await
        .expect("failed to connect to database");

    let job_store = Arc::new(PostgresJobStore::new(db.clone()));
    let activity_log = Arc::new(PostgresActivityLog::new(db.clone()));
    let resume_store = Arc::new(PostgresResumeVersionStore::new(db.clone()));

    let claude_binary =
        std::env::var("CLAUDE_CLI_BINARY").unwrap_or_else(|_| "claude".to_string());
    let claude_model = std::env::var("CLAUDE_MODEL")
        .unwrap_or_else(|_| "claude-sonnet-4-5-20250929".to_string());
    let generator = Arc::new(ClaudeCliGenerator::new(claude_binary, claude_model.clone()));
    let extractor = Arc::new(PlainTextResumeExtractor);
    let renderer = Arc::new(MarkdownDocumentRenderer::new(
        config.engine.tailored_artifacts_dir.clone(),
    ));

    // Concrete platform adapters are out of scope (SPEC_FULL.md §1); a real
    // deployment registers them here before `start()` is first called.
    let platforms = Arc::new(PlatformRegistry::new());

    let orchestrator = Arc::new(Orchestrator::new(
        job_store.clone(),
        activity_log.clone(),
        resume_store.clone(),
        platforms,
        config.engine.policy,
        config.engine.default_resume_path.clone(),
    ));

    let resume_pipeline = Arc::new(ResumeTailorPipeline::new(
        job_store.clone(),
        activity_log.clone(),
        resume_store.clone(),
        extractor.clone(),
        generator.clone(),
        renderer.clone(),
        config.engine.policy.session_channel_capacity,
        claude_model.clone(),
    ));

    let cover_pipeline = Arc::new(CoverLetterPipeline::new(
        job_store,
        activity_log,
        resume_store,
        extractor,
        generator,
        renderer,
        config.engine.policy.session_channel_capacity,
        claude_model,
    ));

    AppState {
        orchestrator,
        resume_pipeline,
        cover_pipeline,
        default_resume_path: config.engine.default_resume_path.clone(),
        keepalive_interval: config.engine.policy.keepalive_interval,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apply_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let bind_addr = config.bind_addr();
    let state = build_state(&config).await;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("failed to bind to {bind_addr}"));

    tracing::info!(bind_addr = %bind_addr, "apply orchestrator API listening");

    axum::serve(listener, app).await.expect("server error");
}
