//! Orchestrator: ties the Session Registry, Confirmation Gate, apply-
//! serialization Lease, Platform Registry, and Dedup Oracle together into
//! the `start`/`confirm`/`cancel`/`subscribe` surface (SPEC_FULL.md §4.1).
//!
//! Grounded on `examples/original_source/apply_engine/engine.py::ApplyEngine`:
//! the same start/confirm/cancel/get_session_queue shape, generalized per §9
//! Redesign Flags from "shared mutable globals" to struct fields, and from a
//! thread-to-event-loop hop to a Session that owns its own bounded queue.

use std::sync::Arc;

use apply_domain::config::EnginePolicy;
use apply_domain::entities::{ApplyMode, CandidateProfile, JobSnapshot};
use apply_domain::events::Event;
use apply_domain::state_machines::SessionTransition;
use apply_ports::{ActivityLog, JobStore, JobStoreError, ResumeVersionStore};
use thiserror::Error;
use tracing::{info, instrument};

use crate::dedup::DedupOracle;
use crate::lease::ApplySerializationLease;
use crate::platform_registry::PlatformRegistry;
use crate::resume_resolver::ResumeResolver;
use crate::session_registry::{Session, SessionRegistry};
use crate::worker::{ApplyWorker, WorkerError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job_key must not be empty")]
    EmptyJobKey,

    #[error("job {job_key} not found")]
    JobNotFound { job_key: String },

    #[error("apply-serialization lease unavailable")]
    Busy,

    #[error("an apply is already in progress for job {job_key}")]
    AlreadyInProgress { job_key: String },

    #[error("no session for job {job_key}")]
    SessionNotFound { job_key: String },

    #[error("job store error: {0}")]
    JobStore(#[from] JobStoreError),

    #[error("failed to launch apply worker: {0}")]
    Worker(#[from] WorkerError),
}

/// Coordinates one apply flow at a time (per the serialization lease) across
/// any number of concurrently tracked Sessions.
pub struct Orchestrator<J, A, R> {
    job_store: Arc<J>,
    activity_log: Arc<A>,
    resume_store: Arc<R>,
    platforms: Arc<PlatformRegistry>,
    sessions: Arc<SessionRegistry>,
    lease: Arc<ApplySerializationLease>,
    policy: EnginePolicy,
    default_resume_path: String,
    candidate_profile: Option<Arc<CandidateProfile>>,
}

impl<J, A, R> Orchestrator<J, A, R>
where
    J: JobStore + 'static,
    A: ActivityLog + 'static,
    R: ResumeVersionStore + 'static,
{
    pub fn new(
        job_store: Arc<J>,
        activity_log: Arc<A>,
        resume_store: Arc<R>,
        platforms: Arc<PlatformRegistry>,
        policy: EnginePolicy,
        default_resume_path: impl Into<String>,
    ) -> Self {
        Self {
            job_store,
            activity_log,
            resume_store,
            platforms,
            sessions: Arc::new(SessionRegistry::new()),
            lease: Arc::new(ApplySerializationLease::new(policy.apply_lease_capacity)),
            policy,
            default_resume_path: default_resume_path.into(),
            candidate_profile: None,
        }
    }

    /// Attach the candidate fact sheet passed through to every `ApplyWorker`
    /// for generic form filling (§4.4). Optional: without one, apply flows
    /// still run end to end but skip the fill-form stage.
    pub fn with_candidate_profile(mut self, profile: Arc<CandidateProfile>) -> Self {
        self.candidate_profile = Some(profile);
        self
    }

    /// Start an apply flow for `job_key`. Idempotent: a second call for a
    /// job_key with a live Session returns that Session rather than starting
    /// a new Worker (§4.1's idempotent start guard; §4.5's double-click
    /// suppression detail applies the same pattern to the tailor pipelines).
    #[instrument(skip(self), fields(job_key = %job_key))]
    pub async fn start(&self, job_key: &str, mode: ApplyMode) -> Result<Arc<Session>, OrchestratorError> {
        if job_key.is_empty() {
            return Err(OrchestratorError::EmptyJobKey);
        }

        if let Some(existing) = self.sessions.get(job_key) {
            return Ok(existing);
        }

        let job = self.fetch_job(job_key).await?;

        if let Some(already) = DedupOracle::new(&*self.job_store).check(job_key).await? {
            return Ok(self.short_circuit_already_applied(job_key, &already.status));
        }

        let permit = self.lease.try_acquire().map_err(|_| OrchestratorError::Busy)?;

        let session = self
            .sessions
            .register(job_key, self.policy.session_channel_capacity)
            .ok_or_else(|| OrchestratorError::AlreadyInProgress {
                job_key: job_key.to_string(),
            })?;

        let resume_path = ResumeResolver::new(&*self.resume_store, self.default_resume_path.clone())
            .resolve(job_key)
            .await;

        let mut worker = ApplyWorker::new(
            session.clone(),
            job,
            mode,
            resume_path,
            self.platforms.clone(),
            self.activity_log.clone(),
            self.policy,
        );
        if let Some(profile) = &self.candidate_profile {
            worker = worker.with_candidate_profile(profile.clone());
        }
        worker.spawn(permit)?;

        self.spawn_cleanup(job_key, session.clone());

        info!(job_key, "apply session started");
        Ok(session)
    }

    /// Resolve the Confirmation Gate of a Session awaiting confirmation.
    pub fn confirm(&self, job_key: &str) -> Result<(), OrchestratorError> {
        let session = self.session_for(job_key)?;
        session.gate.confirm();
        Ok(())
    }

    /// Cancel an in-flight Session: flags cancellation for the Worker to
    /// observe at its next checkpoint and resolves the Confirmation Gate so
    /// a Worker parked there wakes immediately.
    pub fn cancel(&self, job_key: &str) -> Result<(), OrchestratorError> {
        let session = self.session_for(job_key)?;
        session.request_cancel();
        session.gate.cancel();
        session.transition(SessionTransition::Cancel).ok();
        Ok(())
    }

    /// Return the live Session for `job_key`, if any, for the Stream Adapter
    /// to drain. `None` means either no apply was ever started or it already
    /// finished and was removed from the Registry.
    pub fn subscribe(&self, job_key: &str) -> Option<Arc<Session>> {
        self.sessions.get(job_key)
    }

    /// Already-applied short-circuit (§4.1, §8 scenario 2): synthesize one
    /// `error` event followed by `done` in a fresh Session rather than
    /// launching a Worker, so the dashboard can subscribe and observe the
    /// same terminal-event contract as any other apply flow. No lease is
    /// acquired and no activity entry is recorded.
    fn short_circuit_already_applied(&self, job_key: &str, status: &str) -> Arc<Session> {
        let session = match self.sessions.register(job_key, self.policy.session_channel_capacity) {
            Some(session) => session,
            None => return self.sessions.get(job_key).expect("just observed as registered"),
        };
        session.publish(Event::error(
            job_key,
            format!("Already applied to this job (status: {status})"),
        ));
        session.publish(Event::done(job_key, "Apply flow complete"));
        self.spawn_cleanup(job_key, session.clone());
        info!(job_key, status, "apply rejected: already applied");
        session
    }

    async fn fetch_job(&self, job_key: &str) -> Result<JobSnapshot, OrchestratorError> {
        self.job_store
            .get_job(job_key)
            .await?
            .ok_or_else(|| OrchestratorError::JobNotFound {
                job_key: job_key.to_string(),
            })
    }

    fn session_for(&self, job_key: &str) -> Result<Arc<Session>, OrchestratorError> {
        self.sessions
            .get(job_key)
            .ok_or_else(|| OrchestratorError::SessionNotFound {
                job_key: job_key.to_string(),
            })
    }

    /// Remove a finished Session from the Registry once its Worker thread
    /// has published `done`. Session Registry mutation is Orchestrator-only
    /// (§5); the Worker itself never touches the Registry.
    fn spawn_cleanup(&self, job_key: &str, session: Arc<Session>) {
        let sessions = self.sessions.clone();
        let job_key = job_key.to_string();
        tokio::spawn(async move {
            session.wait_until_done().await;
            sessions.remove(&job_key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apply_domain::entities::{
        ActivityEntry, ActivityKind, JobSnapshot, ResumeVersion, ResumeVersionKind,
    };
    use apply_ports::{
        ActivityLogError, ApiPlatform, PlatformError, ResumeVersionStoreError,
    };
    use std::future::Future;

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

    struct EmptyResumeStore;
    impl ResumeVersionStore for EmptyResumeStore {
        fn save_version(
            &self,
            _version: ResumeVersion,
        ) -> impl Future<Output = Result<(), ResumeVersionStoreError>> + Send {
            async move { Ok(()) }
        }
        fn get_latest_for(
            &self,
            _job_key: &str,
            _kind: ResumeVersionKind,
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

    struct AlwaysSucceedsApi;
    impl ApiPlatform for AlwaysSucceedsApi {
        fn platform_name(&self) -> &str {
            "remoteok"
        }
        fn apply(&self, _job: &JobSnapshot, _resume_path: &str) -> Result<bool, PlatformError> {
            Ok(true)
        }
    }

    fn job(status: &str) -> JobSnapshot {
        JobSnapshot {
            job_key: "acme::swe".to_string(),
            platform: "remoteok".to_string(),
            title: "Software Engineer".to_string(),
            company: "Acme".to_string(),
            url: "https://acme.example/jobs/1".to_string(),
            description: "Build things.".to_string(),
            apply_url: None,
            easy_apply: false,
            status: status.to_string(),
        }
    }

    fn orchestrator(
        job: Option<JobSnapshot>,
    ) -> Orchestrator<FakeJobStore, NoopActivityLog, EmptyResumeStore> {
        let mut platforms = PlatformRegistry::new();
        platforms
            .register("remoteok", crate::platform_registry::Platform::Api(Box::new(AlwaysSucceedsApi)), &["apply"])
            .unwrap();
        Orchestrator::new(
            Arc::new(FakeJobStore { job }),
            Arc::new(NoopActivityLog),
            Arc::new(EmptyResumeStore),
            Arc::new(platforms),
            EnginePolicy::test(),
            "default.pdf",
        )
    }

    #[tokio::test]
    async fn unknown_job_key_is_rejected() {
        let orchestrator = orchestrator(None);
        let result = orchestrator.start("acme::swe", ApplyMode::FullAuto).await;
        assert!(matches!(result, Err(OrchestratorError::JobNotFound { .. })));
    }

    #[tokio::test]
    async fn already_applied_job_short_circuits_to_error_then_done() {
        let orchestrator = orchestrator(Some(job("applied")));
        let session = orchestrator
            .start("acme::swe", ApplyMode::FullAuto)
            .await
            .expect("already-applied short-circuits rather than erroring");

        let mut events = vec![];
        while let Some(event) = session.next_event().await {
            events.push(event);
        }
        assert!(events
            .iter()
            .any(|e| e.event_type == apply_domain::events::EventType::Error
                && e.message.contains("Already applied")));
        assert_eq!(
            events.last().expect("at least one event").event_type,
            apply_domain::events::EventType::Done
        );
    }

    #[tokio::test]
    async fn concurrent_start_for_same_key_returns_same_session() {
        let orchestrator = orchestrator(Some(job("new")));
        let first = orchestrator.start("acme::swe", ApplyMode::FullAuto).await.unwrap();
        let second = orchestrator.start("acme::swe", ApplyMode::FullAuto).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn unknown_session_confirm_and_cancel_are_rejected() {
        let orchestrator = orchestrator(Some(job("new")));
        assert!(matches!(
            orchestrator.confirm("does-not-exist"),
            Err(OrchestratorError::SessionNotFound { .. })
        ));
        assert!(matches!(
            orchestrator.cancel("does-not-exist"),
            Err(OrchestratorError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn started_session_eventually_completes_and_is_removed() {
        let orchestrator = orchestrator(Some(job("new")));
        let session = orchestrator.start("acme::swe", ApplyMode::FullAuto).await.unwrap();

        let wait = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while let Some(_event) = session.next_event().await {}
        });
        wait.await.expect("apply flow did not complete in time");

        // Give the cleanup task a chance to run after `done` fires.
        for _ in 0..50 {
            if orchestrator.subscribe("acme::swe").is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("session was not removed from the registry after completion");
    }
}
