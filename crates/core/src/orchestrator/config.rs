//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the periodic orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the orchestrator.
    /// When disabled, curation and production run only via the API.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between curation cycles.
    #[serde(default = "default_curation_interval")]
    pub curation_interval_secs: u64,

    /// Seconds between production ticks (one queued item per tick).
    #[serde(default = "default_production_interval")]
    pub production_interval_secs: u64,

    /// Seconds between delivery checks.
    #[serde(default = "default_delivery_interval")]
    pub delivery_interval_secs: u64,

    /// Reaction-track admissions per curation cycle.
    #[serde(default = "default_agro_quota")]
    pub agro_quota: usize,

    /// Explainer-track admissions per curation cycle.
    #[serde(default = "default_info_quota")]
    pub info_quota: usize,

    /// Minimum composite score for admission.
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,
}

fn default_curation_interval() -> u64 {
    1800 // 30 minutes
}

fn default_production_interval() -> u64 {
    300 // 5 minutes
}

fn default_delivery_interval() -> u64 {
    600 // 10 minutes
}

fn default_agro_quota() -> usize {
    2
}

fn default_info_quota() -> usize {
    2
}

fn default_min_quality_score() -> f64 {
    6.5
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            curation_interval_secs: default_curation_interval(),
            production_interval_secs: default_production_interval(),
            delivery_interval_secs: default_delivery_interval(),
            agro_quota: default_agro_quota(),
            info_quota: default_info_quota(),
            min_quality_score: default_min_quality_score(),
        }
    }
}
