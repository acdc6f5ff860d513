//! Platform Registry: process-wide, read-only-after-init table of platform
//! adapters (SPEC_FULL.md §4.8).
//!
//! Grounded on `examples/original_source/platforms/registry.py` /
//! `platforms/protocols.py`'s reflection-based `register_platform` decorator
//! and `_validate_against_protocol` fail-fast check, generalized per §9
//! Design Notes to a closed Rust enum of two trait objects (`BrowserPlatform`
//! / `ApiPlatform`, both defined in `apply-ports`) instead of runtime
//! reflection — Rust's type system already enforces the method set at
//! compile time, so "fail fast" becomes a declared-capabilities check
//! against the trait's expected capability tags at registration time.

use std::collections::HashMap;

use apply_ports::{ApiPlatform, BrowserPlatform};
use thiserror::Error;
use tracing::info;

/// A registered platform adapter: either a browser-automated or an
/// HTTP-API-backed implementation. Closed polymorphic model (§9).
pub enum Platform {
    Browser(Box<dyn BrowserPlatform>),
    Api(Box<dyn ApiPlatform>),
}

impl Platform {
    pub fn platform_name(&self) -> &str {
        match self {
            Platform::Browser(p) => p.platform_name(),
            Platform::Api(p) => p.platform_name(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PlatformRegistryError {
    #[error("platform key '{key}' is already registered")]
    DuplicateKey { key: String },

    #[error("platform '{key}' declares capability '{capability}' that its kind does not support")]
    UnsupportedCapability { key: String, capability: String },

    #[error("unknown platform '{key}'. available platforms: {available:?}")]
    NotFound { key: String, available: Vec<String> },
}

/// Capabilities a `Browser` platform may declare. §4.8.
const BROWSER_CAPABILITIES: &[&str] = &["login", "is_logged_in", "search", "get_job_details", "apply"];
/// Capabilities an `Api` platform may declare. §4.8.
const API_CAPABILITIES: &[&str] = &["init", "search", "get_job_details", "apply"];

/// Process-wide, read-only-after-init table of platform adapters. §4.8, §5.
#[derive(Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, Platform>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Register a platform under `key`, declaring `capabilities` it
    /// supports. Fails fast if the key is already registered or a declared
    /// capability is not valid for the platform's kind.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        platform: Platform,
        capabilities: &[&str],
    ) -> Result<(), PlatformRegistryError> {
        let key = key.into();
        if self.platforms.contains_key(&key) {
            return Err(PlatformRegistryError::DuplicateKey { key });
        }

        let allowed = match &platform {
            Platform::Browser(_) => BROWSER_CAPABILITIES,
            Platform::Api(_) => API_CAPABILITIES,
        };
        for capability in capabilities {
            if !allowed.contains(capability) {
                return Err(PlatformRegistryError::UnsupportedCapability {
                    key,
                    capability: capability.to_string(),
                });
            }
        }

        info!(platform = %key, name = %platform.platform_name(), "platform registered");
        self.platforms.insert(key, platform);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Platform, PlatformRegistryError> {
        self.platforms.get(key).ok_or_else(|| PlatformRegistryError::NotFound {
            key: key.to_string(),
            available: self.platforms.keys().cloned().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
