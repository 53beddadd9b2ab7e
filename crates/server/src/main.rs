mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipforge_core::{
    compose::{FfmpegRenderer, ImageProvider, NoneImageProvider, RemoteImageProvider, Renderer},
    create_authenticator,
    curation::CurationEngine,
    embedding::RemoteEmbedder,
    load_config,
    narration::{NarrationStage, RemoteSpeechClient, SpeechService},
    pipeline::{InFlightRegistry, Synthesizer},
    queue::{QueueStore, SqliteQueueStore},
    repository::{CandidateRepository, SqliteArticleRepository},
    schedule::{
        DeliveryApi, DeliveryWorker, RemoteDeliveryClient, Scheduler, ScheduleStore,
        SlotCalendar, SqliteScheduleStore,
    },
    script::{OpenAiChatClient, ScriptGenerator},
    validate_config, Authenticator, Orchestrator,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let json_logs = std::env::var("CLIPFORGE_LOG_FORMAT").is_ok_and(|v| v == "json");
    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Determine config path
    let config_path = std::env::var("CLIPFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("clipforge {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // SQLite stores (one connection each, same database file)
    let repository = Arc::new(
        SqliteArticleRepository::new(&config.database.path)
            .context("Failed to open article repository")?,
    );
    let queue: Arc<dyn QueueStore> = Arc::new(
        SqliteQueueStore::new(&config.database.path).context("Failed to open production queue")?,
    );
    let schedule: Arc<dyn ScheduleStore> = Arc::new(
        SqliteScheduleStore::new(&config.database.path)
            .context("Failed to open schedule store")?,
    );
    info!("Stores initialized");

    let registry = Arc::new(InFlightRegistry::new());

    // Curation needs an embedding service for the dedup corpus
    let curation: Option<Arc<CurationEngine>> = match &config.embedding {
        Some(embedding_config) => {
            info!("Initializing embedder at {}", embedding_config.url);
            Some(Arc::new(CurationEngine::new(
                Arc::clone(&repository) as Arc<dyn CandidateRepository>,
                Arc::clone(&queue),
                Arc::new(RemoteEmbedder::new(embedding_config.clone())),
                config.curation.clone(),
            )))
        }
        None => {
            info!("No embedding service configured, curation disabled");
            None
        }
    };

    // Scheduler is always available; booking slots needs no external service
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&schedule),
        SlotCalendar::new(
            config.scheduler.utc_offset_hours,
            config.scheduler.daily_cap,
        ),
    ));

    // Synthesis needs a script model and at least a primary speech service
    let synthesizer: Option<Arc<Synthesizer>> = match (&config.script, &config.speech) {
        (Some(script_config), Some(speech_config)) => {
            info!("Initializing script model '{}'", script_config.model);
            let scripts = ScriptGenerator::new(Arc::new(OpenAiChatClient::new(
                script_config.clone(),
            )));

            let primary: Arc<dyn SpeechService> = Arc::new(RemoteSpeechClient::new(
                "primary",
                speech_config.primary.clone(),
            ));
            let secondary: Option<Arc<dyn SpeechService>> = speech_config
                .secondary
                .clone()
                .map(|endpoint| {
                    Arc::new(RemoteSpeechClient::new("secondary", endpoint))
                        as Arc<dyn SpeechService>
                });
            let narration = NarrationStage::new(primary, secondary, config.synthesis.clone());

            let images: Arc<dyn ImageProvider> = match &config.images {
                Some(images_config) => {
                    Arc::new(RemoteImageProvider::new(images_config.clone()))
                }
                None => Arc::new(NoneImageProvider),
            };

            let renderer = FfmpegRenderer::new().with_tempo(config.synthesis.target_tempo);
            if let Err(e) = renderer.validate().await {
                warn!("ffmpeg validation failed, rendering will fail: {}", e);
            }

            Some(Arc::new(Synthesizer::new(
                Arc::clone(&repository) as Arc<dyn CandidateRepository>,
                Arc::clone(&queue),
                Arc::clone(&registry),
                scripts,
                narration,
                images,
                Arc::new(renderer) as Arc<dyn Renderer>,
                Arc::clone(&scheduler),
                config.synthesis.clone(),
            )))
        }
        _ => {
            info!("Script or speech service not configured, production disabled");
            None
        }
    };

    // Delivery needs an upload endpoint
    let delivery: Option<Arc<DeliveryWorker>> = match &config.delivery {
        Some(delivery_config) => {
            info!("Initializing delivery client at {}", delivery_config.url);
            Some(Arc::new(DeliveryWorker::new(
                Arc::clone(&schedule),
                Arc::clone(&queue),
                Arc::clone(&repository) as Arc<dyn CandidateRepository>,
                Arc::new(RemoteDeliveryClient::new(delivery_config.clone()))
                    as Arc<dyn DeliveryApi>,
            )))
        }
        None => {
            info!("No delivery endpoint configured, uploads disabled");
            None
        }
    };

    // Orchestrator drives all three stages, so it needs all of them
    let orchestrator: Option<Arc<Orchestrator>> =
        match (&curation, &synthesizer, &delivery) {
            (Some(curation), Some(synthesizer), Some(delivery)) => {
                Some(Arc::new(Orchestrator::new(
                    config.orchestrator.clone(),
                    Arc::clone(curation),
                    Arc::clone(synthesizer),
                    Arc::clone(delivery),
                    Arc::clone(&queue),
                    Arc::clone(&registry),
                )))
            }
            _ => None,
        };

    match (&orchestrator, config.orchestrator.enabled) {
        (Some(orchestrator), true) => orchestrator.start(),
        (Some(_), false) => info!("Orchestrator available but disabled by config"),
        (None, true) => {
            warn!("Orchestrator enabled but curation, production, or delivery is not configured")
        }
        (None, false) => {}
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        queue,
        schedule,
        registry,
        curation,
        synthesizer,
        orchestrator.clone(),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(orchestrator) = &orchestrator {
        orchestrator.stop().await;
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
