//! Adapter implementations for the apply orchestrator.
//!
//! Each module here grounds one `apply-ports` trait or one in-process
//! collaborator the Orchestrator depends on (SPEC_FULL.md §4/§5).

pub mod claude_cli;
pub mod config;
pub mod confirmation_gate;
pub mod dedup;
pub mod extraction;
pub mod form_filler;
pub mod lease;
pub mod orchestrator;
pub mod pipelines;
pub mod platform_registry;
pub mod postgres;
pub mod rendering;
pub mod resume_resolver;
pub mod session_registry;
pub mod validator;
pub mod worker;

pub use claude_cli::ClaudeCliGenerator;
pub use config::EngineConfig;
pub use confirmation_gate::{ConfirmationGate, ConfirmationOutcome};
pub use dedup::DedupOracle;
pub use extraction::PlainTextResumeExtractor;
pub use form_filler::FormFiller;
pub use lease::ApplySerializationLease;
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use pipelines::{CoverLetterPipeline, PipelineError, ResumeTailorPipeline};
pub use platform_registry::{Platform, PlatformRegistry, PlatformRegistryError};
pub use postgres::{PostgresActivityLog, PostgresJobStore, PostgresResumeVersionStore};
pub use rendering::MarkdownDocumentRenderer;
pub use resume_resolver::ResumeResolver;
pub use session_registry::{Session, SessionRegistry};
pub use validator::{validate_no_fabrication, ValidationResult};
pub use worker::{ApplyWorker, WorkerError};
