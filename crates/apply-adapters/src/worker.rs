//! Apply Worker: executes one apply flow off the async runtime, on a
//! dedicated OS thread (SPEC_FULL.md §4.2, §5).
//!
//! Grounded on `examples/original_source/apply_engine/engine.py`'s
//! `_apply_sync` / `_apply_browser` / `_fill_external_form`: same progress
//! message text and stage sequencing (start -> resolve platform -> login if
//! needed -> confirmation gate -> submit -> terminal done), reimplemented as
//! a `std::thread::spawn` worker publishing onto a `Session`'s event queue
//! instead of bridging into an `asyncio.Queue` via `call_soon_threadsafe`.
//! A raw `std::thread::spawn` rather than `tokio::task::spawn_blocking` is
//! used per §5, so the worker owns an OS thread independent of the runtime's
//! blocking-pool sizing.

use std::sync::Arc;

use apply_domain::config::EnginePolicy;
use apply_domain::entities::{ActivityEntry, ActivityKind, ApplyMode, CandidateProfile, JobSnapshot};
use apply_domain::events::Event;
use apply_domain::state_machines::SessionTransition;
use apply_domain::DomainError;
use apply_ports::{ActivityLog, FormPage};
use thiserror::Error;
use tracing::{error, instrument, warn};

use crate::confirmation_gate::ConfirmationOutcome;
use crate::form_filler::FormFiller;
use crate::platform_registry::{Platform, PlatformRegistry};
use crate::session_registry::Session;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn apply worker thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

enum Outcome {
    Completed,
    Cancelled,
}

/// One apply flow's fixed inputs, resolved once by the Orchestrator before
/// the worker thread is spawned (job lookup, platform lookup, resume path
/// resolution are all async and easier to do on the caller's runtime).
pub struct ApplyWorker<A: ActivityLog + 'static> {
    session: Arc<Session>,
    job: JobSnapshot,
    mode: ApplyMode,
    resume_path: String,
    platforms: Arc<PlatformRegistry>,
    activity_log: Arc<A>,
    policy: EnginePolicy,
    /// Used by the Form Filler (§4.4) when a platform exposes a `FormPage`.
    /// `None` means the Worker skips the fill/report-fields stage -- the
    /// candidate profile is an externally-loaded fact sheet (§1: config
    /// loading is out of scope), not something the core can fabricate.
    candidate_profile: Option<Arc<CandidateProfile>>,
}

impl<A: ActivityLog + 'static> ApplyWorker<A> {
    pub fn new(
        session: Arc<Session>,
        job: JobSnapshot,
        mode: ApplyMode,
        resume_path: String,
        platforms: Arc<PlatformRegistry>,
        activity_log: Arc<A>,
        policy: EnginePolicy,
    ) -> Self {
        Self {
            session,
            job,
            mode,
            resume_path,
            platforms,
            activity_log,
            policy,
            candidate_profile: None,
        }
    }

    /// Attach the candidate fact sheet the Form Filler (§4.4) fills generic
    /// ATS fields from. Without one, the Worker still runs the full apply
    /// flow but never attempts to fill a form.
    pub fn with_candidate_profile(mut self, profile: Arc<CandidateProfile>) -> Self {
        self.candidate_profile = Some(profile);
        self
    }

    /// Launch this worker on its own OS thread, holding `lease_permit` for
    /// the thread's lifetime so the apply-serialization lease is released
    /// exactly when the apply flow finishes. Returns once the thread has
    /// been spawned, not once the apply flow has finished -- callers observe
    /// progress via `Session::next_event` / `Session::wait_until_done`.
    pub fn spawn(self, lease_permit: crate::lease::LeasePermit) -> Result<(), WorkerError> {
        let job_key = self.job.job_key.clone();
        std::thread::Builder::new()
            .name(format!("apply-worker-{job_key}"))
            .spawn(move || {
                let _permit = lease_permit;
                let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(job_key = %job_key, error = %e, "failed to build apply worker runtime");
                        return;
                    }
                };
                rt.block_on(self.run());
            })?;
        Ok(())
    }

    /// Run the apply flow to completion. Never panics out past this point
    /// and always ends by publishing exactly one `done` event, matching the
    /// `finally`-equivalent in `engine.py::apply`.
    #[instrument(skip(self), fields(job_key = %self.job.job_key, session_id = %self.session.id.as_str()))]
    async fn run(self) {
        self.record_activity(ActivityKind::ApplyStarted, format!("mode={:?}", self.mode))
            .await;

        self.emit(Event::progress(
            &self.job.job_key,
            format!("Starting apply for {} at {}...", self.job.title, self.job.company),
        ));

        if self.session.is_cancelled() {
            self.session.transition(SessionTransition::Cancel).ok();
            self.finish("Application cancelled by user");
            return;
        }

        self.emit(Event::progress(
            &self.job.job_key,
            format!("Using resume: {}", self.resume_path),
        ));

        match self.dispatch().await {
            Ok(Outcome::Completed) => {
                self.record_activity(ActivityKind::ApplyCompleted, String::new()).await;
                self.finish("Apply flow complete");
            }
            Ok(Outcome::Cancelled) => {
                self.finish("Application cancelled by user");
            }
            Err(message) => {
                self.emit(Event::error(&self.job.job_key, message.clone()));
                self.record_activity(ActivityKind::ApplyFailed, message).await;
                self.finish("Apply flow complete");
            }
        }
    }

    async fn dispatch(&self) -> Result<Outcome, String> {
        let platform = self
            .platforms
            .get(&self.job.platform)
            .map_err(|e| e.to_string())?;

        match platform {
            Platform::Api(_) => self.apply_api(platform).await,
            Platform::Browser(_) => self.apply_browser(platform).await,
        }
    }

    async fn apply_api(&self, platform: &Platform) -> Result<Outcome, String> {
        let api = match platform {
            Platform::Api(p) => p.as_ref(),
            Platform::Browser(_) => unreachable!("dispatch routed by variant"),
        };

        self.emit(Event::progress(&self.job.job_key, "External ATS application flow..."));
        self.emit(Event::progress(
            &self.job.job_key,
            format!("Opening external ATS: {}", self.job.effective_apply_url()),
        ));

        if self.mode == ApplyMode::EasyApplyOnly && !self.job.easy_apply {
            return Err("Job does not support Easy Apply (mode: easy_apply_only)".to_string());
        }

        if self.session.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        self.fill_form_if_available(api.open_page(&self.job));

        if let Some(outcome) = self.await_confirmation().await? {
            return Ok(outcome);
        }

        self.capture_screenshot_if_available(|label| api.capture_screenshot(label));

        match api.apply(&self.job, &self.resume_path) {
            Ok(true) => {
                self.emit(Event::progress(&self.job.job_key, "Application submitted successfully!"));
                Ok(Outcome::Completed)
            }
            Ok(false) => Err("Application submission returned failure".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn apply_browser(&self, platform: &Platform) -> Result<Outcome, String> {
        let browser = match platform {
            Platform::Browser(p) => p.as_ref(),
            Platform::Api(_) => unreachable!("dispatch routed by variant"),
        };

        if !browser.is_logged_in() {
            self.emit(Event::progress(&self.job.job_key, "Logging in..."));
            browser.login().map_err(|e| e.to_string())?;
            if !browser.is_logged_in() {
                return Err("Login failed -- cannot proceed with apply".to_string());
            }
        }

        if self.mode == ApplyMode::EasyApplyOnly && !self.job.easy_apply {
            return Err("Job does not support Easy Apply (mode: easy_apply_only)".to_string());
        }

        self.emit(Event::progress(&self.job.job_key, "Navigating to job page..."));

        if self.session.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        self.fill_form_if_available(browser.open_page(&self.job));

        if let Some(outcome) = self.await_confirmation().await? {
            return Ok(outcome);
        }

        self.capture_screenshot_if_available(|label| browser.capture_screenshot(label));

        match browser.apply(&self.job, &self.resume_path) {
            Ok(true) => {
                self.emit(Event::progress(&self.job.job_key, "Application submitted successfully!"));
                Ok(Outcome::Completed)
            }
            Ok(false) => Err("Application submission returned failure".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Run the generic Form Filler (§4.4) against an opened page, if both a
    /// page and a candidate profile are available, and report the fields
    /// filled. Swallows a `FormPageError` into a warning: a form-fill
    /// failure is not itself fatal to the apply flow (the adapter's
    /// subsequent `apply()` call is the one that can actually fail the
    /// submission).
    fn fill_form_if_available(&self, page: Option<Box<dyn FormPage>>) {
        let (Some(page), Some(profile)) = (page, &self.candidate_profile) else {
            return;
        };
        let filler = FormFiller::new(profile.as_ref());
        match filler.fill_form(page.as_ref(), Some(&self.resume_path), None) {
            Ok(filled) => {
                self.emit(
                    Event::progress(&self.job.job_key, format!("Filled {} form fields", filled.len()))
                        .with_fields_filled(filled),
                );
            }
            Err(e) => {
                warn!(job_key = %self.job.job_key, error = %e, "form filler could not complete");
            }
        }
    }

    /// Capture a pre-submit debug screenshot, if the adapter supports one,
    /// and embed its path in a progress event. §4.2 step 3, §6 "Environment".
    fn capture_screenshot_if_available(&self, capture: impl FnOnce(&str) -> Option<String>) {
        if let Some(path) = capture("pre-submit") {
            self.emit(
                Event::progress(&self.job.job_key, "Screenshot captured").with_screenshot(path),
            );
        }
    }

    /// Enter the Confirmation Gate when `mode` requires one (`SemiAuto`).
    /// Returns `Ok(Some(outcome))` when the caller should stop there
    /// (cancellation), `Err` on timeout, `Ok(None)` to proceed straight to
    /// submission (`FullAuto` / `EasyApplyOnly` skip the gate entirely).
    async fn await_confirmation(&self) -> Result<Option<Outcome>, String> {
        if self.mode != ApplyMode::SemiAuto {
            return Ok(None);
        }
        if self.session.is_cancelled() {
            return Ok(Some(Outcome::Cancelled));
        }

        self.session
            .transition(SessionTransition::EnterAwaitingConfirm)
            .map_err(|e| e.to_string())?;
        self.emit(Event::awaiting_confirm(
            &self.job.job_key,
            format!(
                "Ready to apply for {} at {}. Confirm?",
                self.job.title, self.job.company
            ),
        ));

        match self.session.gate.wait(self.policy.confirm_timeout).await {
            Ok(ConfirmationOutcome::Confirmed) => {
                self.session.transition(SessionTransition::Confirm).ok();
                self.emit(Event::confirmed(
                    &self.job.job_key,
                    "User confirmed -- submitting application",
                ));
                Ok(None)
            }
            Ok(ConfirmationOutcome::Cancelled) => {
                self.session.transition(SessionTransition::Cancel).ok();
                Ok(Some(Outcome::Cancelled))
            }
            Err(DomainError::ConfirmationTimedOut { .. }) => Err("Confirmation timed out".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn emit(&self, event: Event) {
        self.session.publish(event);
    }

    fn finish(&self, message: impl Into<String>) {
        self.emit(Event::done(&self.job.job_key, message.into()));
    }

    async fn record_activity(&self, kind: ActivityKind, detail: String) {
        if let Err(e) = self
            .activity_log
            .record(ActivityEntry::new(&self.job.job_key, kind, detail))
            .await
        {
            warn!(job_key = %self.job.job_key, error = %e, "failed to record activity");
        }
    }
}
