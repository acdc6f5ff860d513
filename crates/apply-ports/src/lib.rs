//! Port traits for every external collaborator named in SPEC_FULL.md §1/§6:
//! job storage, activity logging, resume version storage, resume text
//! extraction, LLM-backed resume/cover-letter generation, document
//! rendering, and the generic form-filling page capability.
//!
//! Adapters in `apply-adapters` implement these against Postgres, a real
//! PDF extractor, a browser automation backend, etc. Fakes for testing live
//! behind `#[cfg(test)]` in the adapter crate that would otherwise own the
//! real implementation.

use std::future::Future;
use std::path::PathBuf;

use apply_domain::{
    ActivityEntry, CandidateProfile, CoverLetter, JobSnapshot, ResumeVersion, ResumeVersionKind,
    TailoredResume,
};
use chrono::{DateTime, Utc};

/// Job storage port. §6: "Job row read".
pub trait JobStore: Send + Sync {
    fn get_job(
        &self,
        job_key: &str,
    ) -> impl Future<Output = Result<Option<JobSnapshot>, JobStoreError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job store connection error: {message}")]
    ConnectionError { message: String },
}

/// Activity log port. §6: "Activity log writes".
pub trait ActivityLog: Send + Sync {
    fn record(
        &self,
        entry: ActivityEntry,
    ) -> impl Future<Output = Result<(), ActivityLogError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ActivityLogError {
    #[error("activity log write error: {message}")]
    WriteError { message: String },
}

/// Resume Version storage port. §3, §4.7, §9 ("Keep the contract narrow").
pub trait ResumeVersionStore: Send + Sync {
    fn save_version(
        &self,
        version: ResumeVersion,
    ) -> impl Future<Output = Result<(), ResumeVersionStoreError>> + Send;

    fn get_latest_for(
        &self,
        job_key: &str,
        kind: ResumeVersionKind,
    ) -> impl Future<Output = Result<Option<ResumeVersion>, ResumeVersionStoreError>> + Send;

    fn get_all(
        &self,
        job_key: &str,
    ) -> impl Future<Output = Result<Vec<ResumeVersion>, ResumeVersionStoreError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeVersionStoreError {
    #[error("resume version store error: {message}")]
    StoreError { message: String },
}

/// PDF/text extraction port. Out of scope to implement (§1); the core only
/// depends on the contract.
pub trait ResumeTextExtractor: Send + Sync {
    fn extract(
        &self,
        source_path: &str,
    ) -> impl Future<Output = Result<String, ExtractionError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to extract text from {source_path}: {message}")]
    Failed { source_path: String, message: String },
}

/// LLM-backed resume tailoring port. The external LLM-invocation subprocess
/// itself is out of scope (§1); this is its contract boundary.
pub trait ResumeGenerator: Send + Sync {
    fn tailor(
        &self,
        resume_text: &str,
        job_description: &str,
        job_title: &str,
        company_name: &str,
    ) -> impl Future<Output = Result<TailoredResume, GenerationError>> + Send;
}

/// LLM-backed cover letter generation port. Same out-of-scope boundary.
pub trait CoverLetterGenerator: Send + Sync {
    fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        job_title: &str,
        company_name: &str,
    ) -> impl Future<Output = Result<CoverLetter, GenerationError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation failed: {message}")]
    Failed { message: String },
}

/// PDF rendering port. Out of scope to implement (§1); the core only
/// depends on the contract to obtain a file path to record in a
/// ResumeVersion.
pub trait DocumentRenderer: Send + Sync {
    fn render_resume(
        &self,
        job_key: &str,
        tailored: &TailoredResume,
    ) -> impl Future<Output = Result<PathBuf, RenderError>> + Send;

    fn render_cover_letter(
        &self,
        job_key: &str,
        letter: &CoverLetter,
    ) -> impl Future<Output = Result<PathBuf, RenderError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render failed: {message}")]
    Failed { message: String },
}

/// A field discovered on a form page. §4.4.
#[derive(Debug, Clone)]
pub struct FormField {
    pub element_kind: FormElementKind,
    /// Lowercased, concatenated name/id/placeholder/aria-label/label clues.
    pub clues: String,
    pub current_value_attr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormElementKind {
    Text,
    TextArea,
    Select,
    Checkbox,
    Radio,
    File,
}

/// A page-like capability the generic Form Filler (§4.4) operates over.
/// Browser automation primitives themselves are out of scope (§1); this is
/// the narrow seam the Form Filler needs.
pub trait FormPage: Send + Sync {
    /// URLs of every frame hosted on the page (used for ATS iframe detection).
    fn frame_urls(&self) -> Vec<String>;

    /// Enumerate fillable fields, optionally scoped to a specific frame URL.
    fn fields(&self, frame_url: Option<&str>) -> Vec<FormField>;

    fn fill_text(&self, field: &FormField, value: &str) -> Result<(), FormPageError>;
    fn select_option(&self, field: &FormField, label: &str) -> Result<(), FormPageError>;
    fn set_checkbox(&self, field: &FormField, checked: bool) -> Result<(), FormPageError>;
    fn upload_file(&self, field: &FormField, path: &str) -> Result<(), FormPageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FormPageError {
    #[error("form field interaction failed: {message}")]
    InteractionFailed { message: String },
}

/// Browser-automated platform adapter. §4.8, §9 ("closed polymorphic model").
pub trait BrowserPlatform: Send + Sync {
    fn platform_name(&self) -> &str;
    fn is_logged_in(&self) -> bool;
    fn login(&self) -> Result<bool, PlatformError>;
    fn apply(&self, job: &JobSnapshot, resume_path: &str) -> Result<bool, PlatformError>;

    /// Search the platform's job board. Job-board scraping and search
    /// result parsing are out of scope for this engine (§1); adapters that
    /// do not declare the `search` capability at registration use the
    /// default, which reports unsupported.
    fn search(&self, _query: &str) -> Result<Vec<JobSnapshot>, PlatformError> {
        Err(PlatformError::NotSupported {
            platform: self.platform_name().to_string(),
            capability: "search",
        })
    }

    /// Fetch full posting details for a job key found via `search`. Out of
    /// scope for this engine (§1); default reports unsupported.
    fn get_job_details(&self, _job_key: &str) -> Result<JobSnapshot, PlatformError> {
        Err(PlatformError::NotSupported {
            platform: self.platform_name().to_string(),
            capability: "get_job_details",
        })
    }

    /// Open a `FormPage` for the job's page so the generic Form Filler
    /// (§4.4) can run before the Confirmation Gate. `None` means this
    /// adapter does not expose page-level form access (e.g. it submits
    /// through a flow the Form Filler has no seam into); the Worker then
    /// skips the fill/report-fields stage instead of failing the apply.
    fn open_page(&self, _job: &JobSnapshot) -> Option<Box<dyn FormPage>> {
        None
    }

    /// Capture a debug screenshot, returning the path it was written to.
    /// `None` means this adapter does not support screenshots.
    fn capture_screenshot(&self, _label: &str) -> Option<String> {
        None
    }
}

/// HTTP-API-backed platform adapter. §4.8.
pub trait ApiPlatform: Send + Sync {
    fn platform_name(&self) -> &str;
    fn apply(&self, job: &JobSnapshot, resume_path: &str) -> Result<bool, PlatformError>;

    /// One-time session/credential setup before `search`/`apply` are used.
    /// Out of scope for this engine (§1); default is a no-op success.
    fn init(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// See `BrowserPlatform::search`.
    fn search(&self, _query: &str) -> Result<Vec<JobSnapshot>, PlatformError> {
        Err(PlatformError::NotSupported {
            platform: self.platform_name().to_string(),
            capability: "search",
        })
    }

    /// See `BrowserPlatform::get_job_details`.
    fn get_job_details(&self, _job_key: &str) -> Result<JobSnapshot, PlatformError> {
        Err(PlatformError::NotSupported {
            platform: self.platform_name().to_string(),
            capability: "get_job_details",
        })
    }

    /// See `BrowserPlatform::open_page`.
    fn open_page(&self, _job: &JobSnapshot) -> Option<Box<dyn FormPage>> {
        None
    }

    /// See `BrowserPlatform::capture_screenshot`.
    fn capture_screenshot(&self, _label: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("login failed for platform {platform}")]
    LoginFailed { platform: String },

    #[error("captcha detected on platform {platform}")]
    CaptchaDetected { platform: String },

    #[error("submission failed: {message}")]
    SubmissionFailed { message: String },

    #[error("platform {platform} does not support capability '{capability}'")]
    NotSupported {
        platform: String,
        capability: &'static str,
    },
}

/// Clock port for deterministic time handling in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
