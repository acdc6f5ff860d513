//! HTTP handlers for the apply orchestrator's trigger/confirm/cancel and
//! SSE surfaces (SPEC_FULL.md §6).

pub mod apply;
pub mod error;
pub mod resume;
pub mod stream;

pub use error::{ApiError, ApiResult};
