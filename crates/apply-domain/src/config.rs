//! Engine-level defaults: timeouts, capacities, and other policy constants
//! named throughout SPEC_FULL.md §5. Pure domain configuration — no env var
//! or file I/O here; that belongs to the adapters/api layer's `EngineConfig`
//! (`apply-adapters/src/config.rs`) which loads these as overridable defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine-wide policy knobs. §5, §9 Open Questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Apply-serialization lease capacity. Default 1, configurable 1-5.
    pub apply_lease_capacity: usize,
    /// Confirmation gate wait timeout. Default 300s.
    pub confirm_timeout: Duration,
    /// Stream Adapter keepalive interval. Default 15s.
    pub keepalive_interval: Duration,
    /// External-ATS page load timeout. Default 120s.
    pub ats_form_fill_timeout: Duration,
    /// Per-Session event channel capacity (bridge bound). §5.
    pub session_channel_capacity: usize,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            apply_lease_capacity: 1,
            confirm_timeout: Duration::from_secs(300),
            keepalive_interval: Duration::from_secs(15),
            ats_form_fill_timeout: Duration::from_secs(120),
            session_channel_capacity: 64,
        }
    }
}

impl EnginePolicy {
    /// Fast timeouts for tests that exercise the timeout/cancellation paths
    /// without waiting real wall-clock minutes.
    pub fn test() -> Self {
        Self {
            apply_lease_capacity: 1,
            confirm_timeout: Duration::from_millis(50),
            keepalive_interval: Duration::from_millis(20),
            ats_form_fill_timeout: Duration::from_millis(200),
            session_channel_capacity: 16,
        }
    }
}
