use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub curation: CurationConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
    #[serde(default)]
    pub script: Option<ScriptConfig>,
    #[serde(default)]
    pub speech: Option<SpeechConfig>,
    #[serde(default)]
    pub delivery: Option<DeliveryConfig>,
    #[serde(default)]
    pub images: Option<ImagesConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key"
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("clipforge.db")
}

/// Curation engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurationConfig {
    /// Cosine similarity above which a candidate counts as a duplicate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Minimum article body length to be considered at all
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,
    /// Minimum popularity to be considered at all
    #[serde(default = "default_min_popularity")]
    pub min_popularity: i64,
    /// Extra popularity bar for the reaction track
    #[serde(default = "default_agro_min_popularity")]
    pub agro_min_popularity: i64,
    /// Extra body-depth bar for the explainer track
    #[serde(default = "default_info_min_body_chars")]
    pub info_min_body_chars: usize,
    /// Candidates fetched per track before scoring
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_body_chars: default_min_body_chars(),
            min_popularity: default_min_popularity(),
            agro_min_popularity: default_agro_min_popularity(),
            info_min_body_chars: default_info_min_body_chars(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.90
}

fn default_min_body_chars() -> usize {
    300
}

fn default_min_popularity() -> i64 {
    50
}

fn default_agro_min_popularity() -> i64 {
    100
}

fn default_info_min_body_chars() -> usize {
    500
}

fn default_fetch_limit() -> usize {
    30
}

/// Synthesis pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthesisConfig {
    /// Primary narration attempts before falling back
    #[serde(default = "default_max_narration_retries")]
    pub max_narration_retries: u32,
    /// Base delay for the narration retry backoff, doubled per attempt
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: f64,
    /// Duration of the silent placeholder when all narration fails
    #[serde(default = "default_placeholder_secs")]
    pub placeholder_secs: f64,
    /// Narration playback rate applied after synthesis
    #[serde(default = "default_target_tempo")]
    pub target_tempo: f64,
    /// Narration fields shorter than this are skipped
    #[serde(default = "default_min_field_chars")]
    pub min_field_chars: usize,
    /// Music bed mixed under the whole video; no bed when unset
    #[serde(default)]
    pub bgm_path: Option<PathBuf>,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_narration_retries: default_max_narration_retries(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
            placeholder_secs: default_placeholder_secs(),
            target_tempo: default_target_tempo(),
            min_field_chars: default_min_field_chars(),
            bgm_path: None,
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_max_narration_retries() -> u32 {
    3
}

fn default_retry_base_delay_secs() -> f64 {
    2.0
}

fn default_placeholder_secs() -> f64 {
    5.0
}

fn default_target_tempo() -> f64 {
    1.35
}

fn default_min_field_chars() -> usize {
    5
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("/tmp/clipforge")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("videos")
}

/// Publication scheduler configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Maximum uploads scheduled per local day
    #[serde(default = "default_daily_cap")]
    pub daily_cap: usize,
    /// Fixed UTC offset of the publication calendar, in hours
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_daily_cap() -> usize {
    4
}

fn default_utc_offset_hours() -> i32 {
    9
}

/// Embedding service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding endpoint URL (e.g., "http://localhost:11434")
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

/// Script model configuration (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_max_tokens() -> u32 {
    1024
}

/// Narration service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechConfig {
    pub primary: SpeechEndpoint,
    #[serde(default)]
    pub secondary: Option<SpeechEndpoint>,
}

/// One text-to-speech endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeechEndpoint {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_voice() -> String {
    "alloy".to_string()
}

/// Delivery (upload) API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Background image search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImagesConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub curation: CurationConfig,
    pub synthesis: SynthesisConfig,
    pub scheduler: SchedulerConfig,
    pub orchestrator: OrchestratorConfig,
    pub embedding_configured: bool,
    pub script_configured: bool,
    pub speech_configured: bool,
    pub delivery_configured: bool,
    pub images_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            curation: config.curation.clone(),
            synthesis: config.synthesis.clone(),
            scheduler: config.scheduler.clone(),
            orchestrator: config.orchestrator.clone(),
            embedding_configured: config.embedding.is_some(),
            script_configured: config.script.is_some(),
            speech_configured: config.speech.is_some(),
            delivery_configured: config.delivery.is_some(),
            images_configured: config.images.is_some(),
        }
    }
}
