//! Periodic driver for curation, production, and delivery.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::Orchestrator;
pub use types::OrchestratorStatus;
