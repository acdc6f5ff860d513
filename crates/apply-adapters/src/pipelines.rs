//! Resume Tailor and Cover Letter pipelines: the two isomorphic subordinate
//! cores that share the Orchestrator's Session/Event/double-click-suppression
//! shape but run their stages on the async runtime rather than a dedicated
//! OS thread, since every stage here is a port call (extraction/generation/
//! rendering), not synchronous browser I/O (SPEC_FULL.md §4.5).
//!
//! Grounded on `examples/original_source/webapp/app.py::_run_resume_tailor`
//! and `::_run_cover_letter`: extract -> generate -> (validate, resume only)
//! -> render -> persist -> log activity -> done. Each keeps its own
//! `SessionRegistry`, mirroring the original's separate `_resume_sessions`/
//! `_cover_sessions` dicts distinct from `_sessions`.
//!
//! The original renders a `difflib.HtmlDiff` table and a Jinja partial into
//! the terminal event's `html` field. No HTML-diff or templating crate is
//! present anywhere in the retrieved corpus, and SPEC_FULL.md §9 flags HTML-
//! rendering coupling as a redesign target: "the core must not depend on a
//! specific templating engine... emit a structured event; let the transport
//! layer render a fragment." So `html` is left unset here; the terminal
//! event's `message` carries a human-readable summary (including the
//! validation outcome for the resume pipeline) and downstream consumers
//! render whatever fragment they need from the structured `Event`.

use std::sync::Arc;

use apply_domain::entities::{
    ActivityEntry, ActivityKind, JobSnapshot, ResumeVersion, ResumeVersionId, ResumeVersionKind,
};
use apply_domain::events::Event;
use apply_ports::{
    ActivityLog, ActivityLogError, CoverLetterGenerator, DocumentRenderer, ExtractionError,
    GenerationError, JobStore, JobStoreError, RenderError, ResumeGenerator, ResumeTextExtractor,
    ResumeVersionStore, ResumeVersionStoreError,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::session_registry::{Session, SessionRegistry};
use crate::validator::validate_no_fabrication;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job_key must not be empty")]
    EmptyJobKey,

    #[error("job {job_key} not found")]
    JobNotFound { job_key: String },

    #[error("generation already in progress for job {job_key}")]
    AlreadyInProgress { job_key: String },

    #[error("job store error: {0}")]
    JobStore(#[from] JobStoreError),
}

/// Plain-text rendering of a `TailoredResume`, used only as the validator's
/// "tailored" side of the fabrication diff -- not persisted, not rendered.
/// Grounded on `resume_ai/tailor.py::format_resume_as_text`.
fn format_resume_as_text(tailored: &apply_domain::entities::TailoredResume) -> String {
    let mut text = String::new();
    text.push_str(&tailored.professional_summary);
    text.push('\n');
    for section in &tailored.technical_skills {
        text.push_str(&format!("{}: {}\n", section.category, section.skills.join(", ")));
    }
    for entry in &tailored.work_experience {
        text.push_str(&format!("{} - {} ({})\n", entry.title, entry.company, entry.period));
        for achievement in &entry.achievements {
            text.push_str(achievement);
            text.push('\n');
        }
    }
    for project in &tailored.key_projects {
        text.push_str(project);
        text.push('\n');
    }
    text.push_str(&tailored.education);
    text
}

/// Tailors a resume against a job description, validates the result for
/// fabricated entities, renders it, and records a Resume Version. §4.5.
pub struct ResumeTailorPipeline<J, A, R, X, G, D> {
    job_store: Arc<J>,
    activity_log: Arc<A>,
    resume_store: Arc<R>,
    extractor: Arc<X>,
    generator: Arc<G>,
    renderer: Arc<D>,
    sessions: Arc<SessionRegistry>,
    session_channel_capacity: usize,
    model_name: String,
}

impl<J, A, R, X, G, D> ResumeTailorPipeline<J, A, R, X, G, D>
where
    J: JobStore + 'static,
    A: ActivityLog + 'static,
    R: ResumeVersionStore + 'static,
    X: ResumeTextExtractor + 'static,
    G: ResumeGenerator + 'static,
    D: DocumentRenderer + 'static,
{
    pub fn new(
        job_store: Arc<J>,
        activity_log: Arc<A>,
        resume_store: Arc<R>,
        extractor: Arc<X>,
        generator: Arc<G>,
        renderer: Arc<D>,
        session_channel_capacity: usize,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            job_store,
            activity_log,
            resume_store,
            extractor,
            generator,
            renderer,
            sessions: Arc::new(SessionRegistry::new()),
            session_channel_capacity,
            model_name: model_name.into(),
        }
    }

    /// Start tailoring a resume for `job_key` against `source_resume_path`.
    /// Idempotent: a second call while one is in flight returns the existing
    /// Session (§4.5's double-click suppression).
    #[instrument(skip(self, source_resume_path), fields(job_key = %job_key))]
    pub async fn start(
        &self,
        job_key: &str,
        source_resume_path: String,
    ) -> Result<Arc<Session>, PipelineError> {
        if job_key.is_empty() {
            return Err(PipelineError::EmptyJobKey);
        }

        if let Some(existing) = self.sessions.get(job_key) {
            return Ok(existing);
        }

        let job = self
            .job_store
            .get_job(job_key)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound {
                job_key: job_key.to_string(),
            })?;

        let session = self
            .sessions
            .register(job_key, self.session_channel_capacity)
            .ok_or_else(|| PipelineError::AlreadyInProgress {
                job_key: job_key.to_string(),
            })?;

        let activity_log = self.activity_log.clone();
        let resume_store = self.resume_store.clone();
        let extractor = self.extractor.clone();
        let generator = self.generator.clone();
        let renderer = self.renderer.clone();
        let sessions = self.sessions.clone();
        let model_name = self.model_name.clone();
        let job_key_owned = job_key.to_string();
        let session_for_task = session.clone();

        tokio::spawn(async move {
            run_resume_tailor(
                session_for_task.clone(),
                job,
                source_resume_path,
                activity_log.as_ref(),
                resume_store.as_ref(),
                extractor.as_ref(),
                generator.as_ref(),
                renderer.as_ref(),
                &model_name,
            )
            .await;
            session_for_task.wait_until_done().await;
            sessions.remove(&job_key_owned);
        });

        info!(job_key, "resume tailor session started");
        Ok(session)
    }

    pub fn subscribe(&self, job_key: &str) -> Option<Arc<Session>> {
        self.sessions.get(job_key)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_resume_tailor<A, R, X, G, D>(
    session: Arc<Session>,
    job: JobSnapshot,
    source_resume_path: String,
    activity_log: &A,
    resume_store: &R,
    extractor: &X,
    generator: &G,
    renderer: &D,
    model_name: &str,
) where
    A: ActivityLog,
    R: ResumeVersionStore,
    X: ResumeTextExtractor,
    G: ResumeGenerator,
    D: DocumentRenderer,
{
    let job_key = job.job_key.clone();

    session.publish(Event::progress(&job_key, "Extracting resume text..."));
    let resume_text = match extractor.extract(&source_resume_path).await {
        Ok(text) => text,
        Err(err) => return fail(&session, &job_key, extraction_message(err)),
    };

    session.publish(Event::progress(&job_key, "Generating tailored resume..."));
    let tailored = match generator
        .tailor(&resume_text, &job.description, &job.title, &job.company)
        .await
    {
        Ok(tailored) => tailored,
        Err(err) => return fail(&session, &job_key, generation_message(err)),
    };

    session.publish(Event::progress(&job_key, "Validating for fabrication..."));
    let tailored_text = format_resume_as_text(&tailored);
    let validation = validate_no_fabrication(&resume_text, &tailored_text);

    session.publish(Event::progress(&job_key, "Rendering resume..."));
    let output_path = match renderer.render_resume(&job_key, &tailored).await {
        Ok(path) => path,
        Err(err) => return fail(&session, &job_key, render_message(err)),
    };

    let version = ResumeVersion {
        id: ResumeVersionId::new(),
        job_key: job_key.clone(),
        kind: ResumeVersionKind::Resume,
        file_path: output_path.display().to_string(),
        source_path: source_resume_path,
        model: model_name.to_string(),
        created_at: Utc::now(),
    };
    if let Err(err) = resume_store.save_version(version).await {
        return fail(&session, &job_key, store_message(err));
    }

    let detail = format!("Generated tailored resume: {}", output_path.display());
    if let Err(err) = activity_log
        .record(ActivityEntry::new(&job_key, ActivityKind::ResumeTailored, detail))
        .await
    {
        tracing::warn!(job_key = %job_key, error = %activity_store_message(err), "activity log write failed");
    }

    let summary = if validation.is_valid {
        "Resume tailored successfully".to_string()
    } else {
        format!(
            "Resume tailored successfully ({} fabrication warning(s): {})",
            validation.warnings.len(),
            validation.warnings.join("; ")
        )
    };
    session.publish(Event::done(&job_key, summary));
}

fn fail(session: &Session, job_key: &str, message: String) {
    session.publish(Event::error(job_key, message));
    session.publish(Event::done(job_key, ""));
}

fn extraction_message(err: ExtractionError) -> String {
    format!("Resume tailoring failed: {err}")
}

fn generation_message(err: GenerationError) -> String {
    format!("Resume tailoring failed: {err}")
}

fn render_message(err: RenderError) -> String {
    format!("Resume tailoring failed: {err}")
}

fn store_message(err: ResumeVersionStoreError) -> String {
    format!("Resume tailoring failed: {err}")
}

fn activity_store_message(err: ActivityLogError) -> String {
    format!("{err}")
}

/// Generates a cover letter for a job, renders it, and records a Resume
/// Version of kind `CoverLetter`. §4.5.
pub struct CoverLetterPipeline<J, A, R, X, G, D> {
    job_store: Arc<J>,
    activity_log: Arc<A>,
    resume_store: Arc<R>,
    extractor: Arc<X>,
    generator: Arc<G>,
    renderer: Arc<D>,
    sessions: Arc<SessionRegistry>,
    session_channel_capacity: usize,
    model_name: String,
}

impl<J, A, R, X, G, D> CoverLetterPipeline<J, A, R, X, G, D>
where
    J: JobStore + 'static,
    A: ActivityLog + 'static,
    R: ResumeVersionStore + 'static,
    X: ResumeTextExtractor + 'static,
    G: CoverLetterGenerator + 'static,
    D: DocumentRenderer + 'static,
{
    pub fn new(
        job_store: Arc<J>,
        activity_log: Arc<A>,
        resume_store: Arc<R>,
        extractor: Arc<X>,
        generator: Arc<G>,
        renderer: Arc<D>,
        session_channel_capacity: usize,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            job_store,
            activity_log,
            resume_store,
            extractor,
            generator,
            renderer,
            sessions: Arc::new(SessionRegistry::new()),
            session_channel_capacity,
            model_name: model_name.into(),
        }
    }

    #[instrument(skip(self, source_resume_path), fields(job_key = %job_key))]
    pub async fn start(
        &self,
        job_key: &str,
        source_resume_path: String,
    ) -> Result<Arc<Session>, PipelineError> {
        if job_key.is_empty() {
            return Err(PipelineError::EmptyJobKey);
        }

        if let Some(existing) = self.sessions.get(job_key) {
            return Ok(existing);
        }

        let job = self
            .job_store
            .get_job(job_key)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound {
                job_key: job_key.to_string(),
            })?;

        let session = self
            .sessions
            .register(job_key, self.session_channel_capacity)
            .ok_or_else(|| PipelineError::AlreadyInProgress {
                job_key: job_key.to_string(),
            })?;

        let activity_log = self.activity_log.clone();
        let resume_store = self.resume_store.clone();
        let extractor = self.extractor.clone();
        let generator = self.generator.clone();
        let renderer = self.renderer.clone();
        let sessions = self.sessions.clone();
        let model_name = self.model_name.clone();
        let job_key_owned = job_key.to_string();
        let session_for_task = session.clone();

        tokio::spawn(async move {
            run_cover_letter(
                session_for_task.clone(),
                job,
                source_resume_path,
                activity_log.as_ref(),
                resume_store.as_ref(),
                extractor.as_ref(),
                generator.as_ref(),
                renderer.as_ref(),
                &model_name,
            )
            .await;
            session_for_task.wait_until_done().await;
            sessions.remove(&job_key_owned);
        });

        info!(job_key, "cover letter session started");
        Ok(session)
    }

    pub fn subscribe(&self, job_key: &str) -> Option<Arc<Session>> {
        self.sessions.get(job_key)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_cover_letter<A, R, X, G, D>(
    session: Arc<Session>,
    job: JobSnapshot,
    source_resume_path: String,
    activity_log: &A,
    resume_store: &R,
    extractor: &X,
    generator: &G,
    renderer: &D,
    model_name: &str,
) where
    A: ActivityLog,
    R: ResumeVersionStore,
    X: ResumeTextExtractor,
    G: CoverLetterGenerator,
    D: DocumentRenderer,
{
    let job_key = job.job_key.clone();

    session.publish(Event::progress(&job_key, "Extracting resume text..."));
    let resume_text = match extractor.extract(&source_resume_path).await {
        Ok(text) => text,
        Err(err) => return fail_cover(&session, &job_key, extraction_message(err)),
    };

    session.publish(Event::progress(&job_key, "Generating cover letter..."));
    let letter = match generator
        .generate(&resume_text, &job.description, &job.title, &job.company)
        .await
    {
        Ok(letter) => letter,
        Err(err) => return fail_cover(&session, &job_key, generation_message(err)),
    };

    session.publish(Event::progress(&job_key, "Rendering cover letter..."));
    let output_path = match renderer.render_cover_letter(&job_key, &letter).await {
        Ok(path) => path,
        Err(err) => return fail_cover(&session, &job_key, render_message(err)),
    };

    let version = ResumeVersion {
        id: ResumeVersionId::new(),
        job_key: job_key.clone(),
        kind: ResumeVersionKind::CoverLetter,
        file_path: output_path.display().to_string(),
        source_path: source_resume_path,
        model: model_name.to_string(),
        created_at: Utc::now(),
    };
    if let Err(err) = resume_store.save_version(version).await {
        return fail_cover(&session, &job_key, store_message(err));
    }

    let detail = format!("Generated cover letter: {}", output_path.display());
    if let Err(err) = activity_log
        .record(ActivityEntry::new(&job_key, ActivityKind::CoverLetterGenerated, detail))
        .await
    {
        tracing::warn!(job_key = %job_key, error = %activity_store_message(err), "activity log write failed");
    }

    session.publish(Event::done(&job_key, "Cover letter generated successfully"));
}

fn fail_cover(session: &Session, job_key: &str, message: String) {
    session.publish(Event::error(job_key, message));
    session.publish(Event::done(job_key, ""));
}

#[cfg(test)]
mod tests {
    use super::*;
    use apply_domain::entities::{CoverLetter, ResumeVersionKind as RvKind, TailoredResume};
    use apply_ports::{
        ActivityLogError, ExtractionError, GenerationError, JobStoreError, RenderError,
        ResumeVersionStoreError,
    };
    use std::future::Future;
    use std::sync::Mutex;

    struct FakeJobStore {
        job: Option<JobSnapshot>,
    }
    impl JobStore for FakeJobStore {
        fn get_job(
            &self,
            _job_key: &str,
        ) -> impl Future<Output = Result<Option<JobSnapshot>, JobStoreError>> + Send {
            let job = self.job.clone();
            async move { Ok(job) }
        }
    }

    struct NoopActivityLog;
    impl ActivityLog for NoopActivityLog {
        fn record(
            &self,
            _entry: ActivityEntry,
        ) -> impl Future<Output = Result<(), ActivityLogError>> + Send {
            async move { Ok(()) }
        }
    }

    #[derive(Default)]
    struct RecordingResumeStore {
        versions: Mutex<Vec<ResumeVersion>>,
    }
    impl ResumeVersionStore for RecordingResumeStore {
        fn save_version(
            &self,
            version: ResumeVersion,
        ) -> impl Future<Output = Result<(), ResumeVersionStoreError>> + Send {
            self.versions.lock().unwrap().push(version);
            async move { Ok(()) }
        }
        fn get_latest_for(
            &self,
            _job_key: &str,
            _kind: RvKind,
        ) -> impl Future<Output = Result<Option<ResumeVersion>, ResumeVersionStoreError>> + Send
        {
            async move { Ok(None) }
        }
        fn get_all(
            &self,
            _job_key: &str,
        ) -> impl Future<Output = Result<Vec<ResumeVersion>, ResumeVersionStoreError>> + Send
        {
            async move { Ok(vec![]) }
        }
    }

    struct StaticExtractor;
    impl ResumeTextExtractor for StaticExtractor {
        fn extract(
            &self,
            _source_path: &str,
        ) -> impl Future<Output = Result<String, ExtractionError>> + Send {
            async move { Ok("Experienced backend engineer.".to_string()) }
        }
    }

    struct FailingExtractor;
    impl ResumeTextExtractor for FailingExtractor {
        fn extract(
            &self,
            source_path: &str,
        ) -> impl Future<Output = Result<String, ExtractionError>> + Send {
            let source_path = source_path.to_string();
            async move {
                Err(ExtractionError::Failed {
                    source_path,
                    message: "file not found".to_string(),
                })
            }
        }
    }

    struct StaticGenerator;
    impl ResumeGenerator for StaticGenerator {
        fn tailor(
            &self,
            _resume_text: &str,
            _job_description: &str,
            _job_title: &str,
            _company_name: &str,
        ) -> impl Future<Output = Result<TailoredResume, GenerationError>> + Send {
            async move {
                Ok(TailoredResume {
                    professional_summary: "Backend engineer tailored for Acme.".to_string(),
                    technical_skills: vec![],
                    work_experience: vec![],
                    key_projects: vec![],
                    education: "BS Computer Science".to_string(),
                    tailoring_notes: "".to_string(),
                })
            }
        }
    }
    impl CoverLetterGenerator for StaticGenerator {
        fn generate(
            &self,
            _resume_text: &str,
            _job_description: &str,
            _job_title: &str,
            _company_name: &str,
        ) -> impl Future<Output = Result<CoverLetter, GenerationError>> + Send {
            async move {
                Ok(CoverLetter {
                    greeting: "Dear Hiring Manager,".to_string(),
                    opening_paragraph: "I am excited to apply.".to_string(),
                    body_paragraphs: vec!["I bring relevant experience.".to_string()],
                    closing_paragraph: "Thank you for your consideration.".to_string(),
                    sign_off: "Sincerely,".to_string(),
                })
            }
        }
    }

    struct StaticRenderer;
    impl DocumentRenderer for StaticRenderer {
        fn render_resume(
            &self,
            _job_key: &str,
            _tailored: &TailoredResume,
        ) -> impl Future<Output = Result<std::path::PathBuf, RenderError>> + Send {
            async move { Ok(std::path::PathBuf::from("/tmp/resume.md")) }
        }
        fn render_cover_letter(
            &self,
            _job_key: &str,
            _letter: &CoverLetter,
        ) -> impl Future<Output = Result<std::path::PathBuf, RenderError>> + Send {
            async move { Ok(std::path::PathBuf::from("/tmp/cover-letter.md")) }
        }
    }

    fn job() -> JobSnapshot {
        JobSnapshot {
            job_key: "acme::swe".to_string(),
            platform: "remoteok".to_string(),
            title: "Software Engineer".to_string(),
            company: "Acme".to_string(),
            url: "https://acme.example/jobs/1".to_string(),
            description: "Build things.".to_string(),
            apply_url: None,
            easy_apply: false,
            status: "new".to_string(),
        }
    }

    #[tokio::test]
    async fn resume_pipeline_completes_and_persists_a_version() {
        let store = Arc::new(RecordingResumeStore::default());
        let pipeline = ResumeTailorPipeline::new(
            Arc::new(FakeJobStore { job: Some(job()) }),
            Arc::new(NoopActivityLog),
            store.clone(),
            Arc::new(StaticExtractor),
            Arc::new(StaticGenerator),
            Arc::new(StaticRenderer),
            16,
            "claude-sonnet-4-5",
        );

        let session = pipeline
            .start("acme::swe", "/resumes/default.pdf".to_string())
            .await
            .unwrap();

        let mut last_message = String::new();
        while let Some(event) = session.next_event().await {
            last_message = event.message;
        }
        assert_eq!(last_message, "Resume tailored successfully");
        assert_eq!(store.versions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resume_pipeline_extraction_failure_emits_error_then_done() {
        let pipeline = ResumeTailorPipeline::new(
            Arc::new(FakeJobStore { job: Some(job()) }),
            Arc::new(NoopActivityLog),
            Arc::new(RecordingResumeStore::default()),
            Arc::new(FailingExtractor),
            Arc::new(StaticGenerator),
            Arc::new(StaticRenderer),
            16,
            "claude-sonnet-4-5",
        );

        let session = pipeline
            .start("acme::swe", "/resumes/default.pdf".to_string())
            .await
            .unwrap();

        let mut event_types = vec![];
        while let Some(event) = session.next_event().await {
            event_types.push(event.event_type);
        }
        assert_eq!(
            event_types,
            vec![
                apply_domain::events::EventType::Progress,
                apply_domain::events::EventType::Error,
                apply_domain::events::EventType::Done,
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_start_for_same_job_returns_same_session() {
        let pipeline = ResumeTailorPipeline::new(
            Arc::new(FakeJobStore { job: Some(job()) }),
            Arc::new(NoopActivityLog),
            Arc::new(RecordingResumeStore::default()),
            Arc::new(StaticExtractor),
            Arc::new(StaticGenerator),
            Arc::new(StaticRenderer),
            16,
            "claude-sonnet-4-5",
        );

        let first = pipeline
            .start("acme::swe", "/resumes/default.pdf".to_string())
            .await
            .unwrap();
        let second = pipeline
            .start("acme::swe", "/resumes/default.pdf".to_string())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn unknown_job_key_is_rejected() {
        let pipeline = ResumeTailorPipeline::new(
            Arc::new(FakeJobStore { job: None }),
            Arc::new(NoopActivityLog),
            Arc::new(RecordingResumeStore::default()),
            Arc::new(StaticExtractor),
            Arc::new(StaticGenerator),
            Arc::new(StaticRenderer),
            16,
            "claude-sonnet-4-5",
        );
        let result = pipeline.start("acme::swe", "/resumes/default.pdf".to_string()).await;
        assert!(matches!(result, Err(PipelineError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn cover_letter_pipeline_completes_and_persists_a_version() {
        let store = Arc::new(RecordingResumeStore::default());
        let pipeline = CoverLetterPipeline::new(
            Arc::new(FakeJobStore { job: Some(job()) }),
            Arc::new(NoopActivityLog),
            store.clone(),
            Arc::new(StaticExtractor),
            Arc::new(StaticGenerator),
            Arc::new(StaticRenderer),
            16,
            "claude-sonnet-4-5",
        );

        let session = pipeline
            .start("acme::swe", "/resumes/default.pdf".to_string())
            .await
            .unwrap();

        let mut last_message = String::new();
        while let Some(event) = session.next_event().await {
            last_message = event.message;
        }
        assert_eq!(last_message, "Cover letter generated successfully");
        assert_eq!(store.versions.lock().unwrap().len(), 1);
    }
}
