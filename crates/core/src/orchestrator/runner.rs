//! The periodic orchestrator.
//!
//! Three independent cooperative loops: curation, production (one queued
//! item per tick), and delivery. Every tick catches and logs its own errors;
//! one failing item never halts the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::curation::{CurationEngine, CurationQuotas};
use crate::pipeline::{InFlightRegistry, Synthesizer};
use crate::queue::{ProductionStatus, QueueStore};
use crate::schedule::DeliveryWorker;

use super::config::OrchestratorConfig;
use super::types::OrchestratorStatus;

/// Drives the whole system on fixed intervals.
pub struct Orchestrator {
    config: OrchestratorConfig,
    curation: Arc<CurationEngine>,
    synthesizer: Arc<Synthesizer>,
    delivery: Arc<DeliveryWorker>,
    queue: Arc<dyn QueueStore>,
    registry: Arc<InFlightRegistry>,

    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        curation: Arc<CurationEngine>,
        synthesizer: Arc<Synthesizer>,
        delivery: Arc<DeliveryWorker>,
        queue: Arc<dyn QueueStore>,
        registry: Arc<InFlightRegistry>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            curation,
            synthesizer,
            delivery,
            queue,
            registry,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the orchestrator (spawns background loops).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!("Starting orchestrator");
        self.spawn_curation_loop();
        self.spawn_production_loop();
        self.spawn_delivery_loop();
        info!("Orchestrator started");
    }

    /// Stop the orchestrator gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping orchestrator");
        let _ = self.shutdown_tx.send(());

        // Give loops a moment to observe the signal
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("Orchestrator stopped");
    }

    /// Current status snapshot.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            in_flight: self.registry.active_count(),
            pending_count: self
                .queue
                .count_by_status(ProductionStatus::Pending)
                .unwrap_or(0),
            done_count: self
                .queue
                .count_by_status(ProductionStatus::Done)
                .unwrap_or(0),
            failed_count: self
                .queue
                .count_by_status(ProductionStatus::Failed)
                .unwrap_or(0),
        }
    }

    fn spawn_curation_loop(&self) {
        let running = Arc::clone(&self.running);
        let curation = Arc::clone(&self.curation);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Curation loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Curation loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.curation_interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let quotas = CurationQuotas {
                            agro: config.agro_quota,
                            info: config.info_quota,
                        };
                        // curate() is fail-open and logs its own troubles
                        let report = curation.curate(quotas, config.min_quality_score).await;
                        if !report.selected.is_empty() {
                            info!(selected = report.selected.len(), "Curation tick admitted candidates");
                        }
                    }
                }
            }
            info!("Curation loop stopped");
        });
    }

    fn spawn_production_loop(&self) {
        let running = Arc::clone(&self.running);
        let synthesizer = Arc::clone(&self.synthesizer);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Production loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Production loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.production_interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match synthesizer.produce_next().await {
                            Ok(Some(record)) => {
                                info!(source_id = record.source_id, "Production tick finished a video");
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!("Production tick failed: {}", e);
                            }
                        }
                    }
                }
            }
            info!("Production loop stopped");
        });
    }

    fn spawn_delivery_loop(&self) {
        let running = Arc::clone(&self.running);
        let delivery = Arc::clone(&self.delivery);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Delivery loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Delivery loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.delivery_interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let uploaded = delivery.deliver_due(Utc::now()).await;
                        if uploaded > 0 {
                            info!(uploaded, "Delivery tick uploaded videos");
                        }
                    }
                }
            }
            info!("Delivery loop stopped");
        });
    }
}
