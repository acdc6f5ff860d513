//! Domain entities: jobs, apply modes, candidate profile, generated-document
//! models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Session identifier: `sess_<ULID>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("sess_{}", Ulid::new()))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Resume Version record identifier: `rv_<ULID>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumeVersionId(String);

impl ResumeVersionId {
    pub fn new() -> Self {
        Self(format!("rv_{}", Ulid::new()))
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResumeVersionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Operational mode for the apply flow. §3 / §4.2 of SPEC_FULL.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    FullAuto,
    SemiAuto,
    EasyApplyOnly,
}

impl Default for ApplyMode {
    fn default() -> Self {
        Self::SemiAuto
    }
}

/// Kind of platform adapter. §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Browser,
    Api,
}

/// Read-only job shape the Worker consumes. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_key: String,
    pub platform: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub apply_url: Option<String>,
    #[serde(default)]
    pub easy_apply: bool,
    pub status: String,
}

impl JobSnapshot {
    /// The URL the Worker should navigate to for an external-ATS apply flow.
    pub fn effective_apply_url(&self) -> &str {
        self.apply_url.as_deref().unwrap_or(&self.url)
    }
}

/// Applied-set per the Dedup Oracle. §4.6 / Glossary.
pub const APPLIED_STATUSES: [&str; 5] = [
    "applied",
    "phone_screen",
    "technical",
    "final_interview",
    "offer",
];

pub fn is_applied_status(status: &str) -> bool {
    APPLIED_STATUSES.contains(&status)
}

/// Kind of artifact recorded by a Resume Version record. §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeVersionKind {
    Resume,
    CoverLetter,
}

/// Persisted Resume Version record. §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeVersion {
    pub id: ResumeVersionId,
    pub job_key: String,
    pub kind: ResumeVersionKind,
    pub file_path: String,
    pub source_path: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// Activity log entry kind. §6 / EXPANSION §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ApplyStarted,
    ApplyCompleted,
    ApplyFailed,
    ResumeTailored,
    CoverLetterGenerated,
}

/// Activity log entry. §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub job_key: String,
    pub event_type: ActivityKind,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(job_key: impl Into<String>, event_type: ActivityKind, detail: impl Into<String>) -> Self {
        Self {
            job_key: job_key.into(),
            event_type,
            detail: detail.into(),
            at: Utc::now(),
        }
    }
}

/// Static facts about the applicant used to answer generic form fields.
/// Recovered from `core/config.py` / `core/form_filler.py`. Loaded
/// externally; the core only consumes an already-constructed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub github: Option<String>,
    pub website: Option<String>,
    pub years_experience: String,
    pub current_title: String,
    pub current_company: String,
    pub desired_salary: Option<String>,
    pub start_date: Option<String>,
    pub education: String,
    pub work_authorization: String,
    pub willing_to_relocate: String,
}

/// A grouped category of technical skills. Recovered from
/// `resume_ai/models.py::SkillSection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSection {
    pub category: String,
    pub skills: Vec<String>,
}

/// A single work experience entry with achievements reordered for
/// relevance. Recovered from `resume_ai/models.py::WorkExperience`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkExperienceEntry {
    pub company: String,
    pub title: String,
    pub period: String,
    pub achievements: Vec<String>,
}

/// Structured output the (out-of-scope) LLM invocation is expected to
/// produce when tailoring a resume. Recovered from
/// `resume_ai/models.py::TailoredResume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoredResume {
    pub professional_summary: String,
    pub technical_skills: Vec<SkillSection>,
    pub work_experience: Vec<WorkExperienceEntry>,
    pub key_projects: Vec<String>,
    pub education: String,
    pub tailoring_notes: String,
}

/// Structured output the (out-of-scope) LLM invocation is expected to
/// produce when generating a cover letter. Recovered from
/// `resume_ai/models.py::CoverLetter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetter {
    pub greeting: String,
    pub opening_paragraph: String,
    pub body_paragraphs: Vec<String>,
    pub closing_paragraph: String,
    pub sign_off: String,
}
