pub mod auth;
pub mod compose;
pub mod config;
pub mod curation;
pub mod embedding;
pub mod metrics;
pub mod narration;
pub mod orchestrator;
pub mod pipeline;
pub mod queue;
pub mod repository;
pub mod schedule;
pub mod script;
pub mod testing;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use curation::{CurationEngine, CurationQuotas, CurationReport};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorStatus};
pub use pipeline::{InFlightRegistry, Synthesizer, SynthesisError};
pub use queue::{ProductionRecord, ProductionStatus, QueueStore, SqliteQueueStore, Track};
pub use repository::{CandidateRepository, SourceItem, SqliteArticleRepository};
pub use schedule::{
    DeliveryWorker, Scheduler, ScheduleStore, SlotCalendar, SqliteScheduleStore,
};
