//! API server configuration: bind address plus the adapter-layer
//! `EngineConfig` it wires into `AppState`.

use std::env;

use apply_adapters::EngineConfig;

/// Top-level API configuration. Recovered from
/// `examples/original_source/webapp/settings.py`'s host/port plus the
/// existing engine settings; OIDC/MinIO/NATS concerns from the teacher's
/// `ApiConfig` have no counterpart in this domain and are dropped.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub engine: EngineConfig,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("APPLY_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("APPLY_API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            engine: EngineConfig::from_env(),
        }
    }

    pub fn local_dev() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            engine: EngineConfig::local_dev(),
        }
    }

    pub fn test() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            engine: EngineConfig::test(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
