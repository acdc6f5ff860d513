//! Dedup Oracle: checks whether a job has already been applied to, using
//! durable job-status state (SPEC_FULL.md §4.6).
//!
//! Grounded on `examples/original_source/apply_engine/dedup.py::is_already_applied`:
//! fetch the job, return "not applied" for a missing job, else check status
//! against the fixed applied-set.

use apply_domain::entities::{is_applied_status, JobSnapshot};
use apply_ports::{JobStore, JobStoreError};

pub struct DedupOracle<'a, S: JobStore> {
    job_store: &'a S,
}

impl<'a, S: JobStore> DedupOracle<'a, S> {
    pub fn new(job_store: &'a S) -> Self {
        Self { job_store }
    }

    /// Returns the job if it has already reached an applied-set status;
    /// `None` for a missing job or one not yet applied to.
    pub async fn check(&self, job_key: &str) -> Result<Option<JobSnapshot>, JobStoreError> {
        let job = self.job_store.get_job(job_key).await?;
        Ok(job.filter(|j| is_applied_status(&j.status)))
    }
}
