//! Shared application state handed to every handler via `State<AppState>`.
//!
//! The teacher's handlers reference `crate::AppState` throughout, but no
//! `AppState` definition exists anywhere in the retrieved pack; it is
//! authored fresh here, wiring the concrete Postgres/Claude-CLI/Markdown
//! adapters into the Orchestrator and the two tailoring pipelines (SPEC_FULL
//! §4.1/§4.5/§6).

use std::sync::Arc;
use std::time::Duration;

use apply_adapters::{
    ClaudeCliGenerator, CoverLetterPipeline, MarkdownDocumentRenderer, Orchestrator,
    PlainTextResumeExtractor, PostgresActivityLog, PostgresJobStore, PostgresResumeVersionStore,
    ResumeTailorPipeline,
};

pub type AppOrchestrator =
    Orchestrator<PostgresJobStore, PostgresActivityLog, PostgresResumeVersionStore>;

pub type AppResumePipeline = ResumeTailorPipeline<
    PostgresJobStore,
    PostgresActivityLog,
    PostgresResumeVersionStore,
    PlainTextResumeExtractor,
    ClaudeCliGenerator,
    MarkdownDocumentRenderer,
>;

pub type AppCoverPipeline = CoverLetterPipeline<
    PostgresJobStore,
    PostgresActivityLog,
    PostgresResumeVersionStore,
    PlainTextResumeExtractor,
    ClaudeCliGenerator,
    MarkdownDocumentRenderer,
>;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AppOrchestrator>,
    pub resume_pipeline: Arc<AppResumePipeline>,
    pub cover_pipeline: Arc<AppCoverPipeline>,
    pub default_resume_path: String,
    /// Stream Adapter keepalive interval (`EnginePolicy::keepalive_interval`).
    pub keepalive_interval: Duration,
}
