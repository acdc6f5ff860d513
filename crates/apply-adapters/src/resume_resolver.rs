//! Resume Resolver: picks the resume path a Worker should use for a given
//! job, preferring a tailored version but never failing (SPEC_FULL.md §4.7).
//!
//! Grounded on `examples/original_source/apply_engine/engine.py::_get_resume_path`:
//! store lookup errors and missing-file checks are both swallowed and
//! treated as "no tailored version", falling back to the configured default.

use std::path::Path;

use apply_domain::entities::ResumeVersionKind;
use apply_ports::ResumeVersionStore;
use tracing::{instrument, warn};

pub struct ResumeResolver<'a, S: ResumeVersionStore> {
    store: &'a S,
    default_path: String,
}

impl<'a, S: ResumeVersionStore> ResumeResolver<'a, S> {
    pub fn new(store: &'a S, default_path: impl Into<String>) -> Self {
        Self {
            store,
            default_path: default_path.into(),
        }
    }

    /// Resolve the resume path to use. Never returns an error: a store
    /// failure or a tailored file that no longer exists on disk both fall
    /// back to the default path, matching the totality guarantee recovered
    /// from `_get_resume_path`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, job_key: &str) -> String {
        match self
            .store
            .get_latest_for(job_key, ResumeVersionKind::Resume)
            .await
        {
            Ok(Some(version)) if Path::new(&version.file_path).exists() => version.file_path,
            Ok(Some(version)) => {
                warn!(
                    job_key,
                    path = %version.file_path,
                    "tailored resume path no longer exists, falling back to default"
                );
                self.default_path.clone()
            }
            Ok(None) => self.default_path.clone(),
            Err(error) => {
                warn!(job_key, %error, "resume version lookup failed, falling back to default");
                self.default_path.clone()
            }
        }
    }
}
