use std::sync::Arc;

use clipforge_core::{
    curation::CurationEngine,
    pipeline::{InFlightRegistry, Synthesizer},
    queue::QueueStore,
    schedule::ScheduleStore,
    Authenticator, Config, Orchestrator, SanitizedConfig,
};

/// Shared application state.
///
/// Curation, synthesis, and the orchestrator are optional: each needs
/// external services that may be absent from the config. Handlers answer
/// 503 for the parts that are not wired up.
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    queue: Arc<dyn QueueStore>,
    schedule: Arc<dyn ScheduleStore>,
    registry: Arc<InFlightRegistry>,
    curation: Option<Arc<CurationEngine>>,
    synthesizer: Option<Arc<Synthesizer>>,
    orchestrator: Option<Arc<Orchestrator>>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        queue: Arc<dyn QueueStore>,
        schedule: Arc<dyn ScheduleStore>,
        registry: Arc<InFlightRegistry>,
        curation: Option<Arc<CurationEngine>>,
        synthesizer: Option<Arc<Synthesizer>>,
        orchestrator: Option<Arc<Orchestrator>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            queue,
            schedule,
            registry,
            curation,
            synthesizer,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn queue(&self) -> &dyn QueueStore {
        self.queue.as_ref()
    }

    pub fn schedule(&self) -> &dyn ScheduleStore {
        self.schedule.as_ref()
    }

    pub fn registry(&self) -> &InFlightRegistry {
        self.registry.as_ref()
    }

    pub fn curation(&self) -> Option<&Arc<CurationEngine>> {
        self.curation.as_ref()
    }

    pub fn synthesizer(&self) -> Option<&Arc<Synthesizer>> {
        self.synthesizer.as_ref()
    }

    pub fn orchestrator(&self) -> Option<&Arc<Orchestrator>> {
        self.orchestrator.as_ref()
    }
}
