//! Apply orchestrator domain core.
//!
//! Pure domain logic: the Session state machine, the Event model, job/
//! platform/resume entities, engine policy defaults, and domain errors.
//!
//! This crate MUST NOT import DB clients, HTTP frameworks, or browser
//! automation SDKs — those belong to `apply-adapters` and `apply-api`.

pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod state_machines;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use state_machines::*;
