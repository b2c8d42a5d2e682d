//! The fixed-interval collection loop
//!
//! One strictly sequential task: ensure the session is live, scan the page
//! once, fan any new outcome out, sleep. Every per-cycle error becomes a
//! counter bump and a log line; nothing inside the loop terminates the
//! process. Shutdown is cooperative and only honored between cycles.


use crate::config::Config;
use crate::detector::Detector;
use crate::outcome::RoundOutcome;
use crate::session::SessionManager;
use crate::sink::{Delivery, Distributor};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy)]
pub struct CollectorStats {
    pub collected: u64,
    pub errors: u64,
    pub started_at: DateTime<Utc>,
}

pub struct Collector {
    interval: Duration,
    session: SessionManager,
    detector: Detector,
    distributor: Distributor,
    shutdown: watch::Receiver<bool>,
    stats: CollectorStats,
}

impl Collector {
    pub fn new(
        config: &Config,
        session: SessionManager,
        distributor: Distributor,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            interval: Duration::from_secs(config.collector.scan_interval_secs),
            session,
            detector: Detector::new(&config.collector, config.casino.table_name.clone()),
            distributor,
            shutdown,
            stats: CollectorStats {
                collected: 0,
                errors: 0,
                started_at: Utc::now(),
            },
        }
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    pub async fn run(&mut self) {
        self.distributor.announce_startup().await;
        tracing::info!(
            "Collector running, scanning every {}s (Ctrl+C to stop)",
            self.interval.as_secs()
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    // sender gone means no one can ever stop us gracefully;
                    // treat it the same as a stop request
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.finish().await;
    }

    async fn cycle(&mut self) {
        if self.session.is_expired() {
            tracing::info!("Session expired, refreshing");
            if let Err(e) = self.session.refresh().await {
                tracing::error!("Session refresh failed: {}", e);
                self.stats.errors += 1;
                return;
            }
        }

        if self.session.check_blocked().await {
            tracing::warn!("Block page detected, attempting recovery");
            if let Err(e) = self.session.recover().await {
                tracing::error!("Block recovery failed: {}", e);
                self.stats.errors += 1;
                if let Some(discord) = self.distributor.discord() {
                    let _ = discord.error("blocked by anti-automation challenge").await;
                }
            }
            // give the page a cycle to settle either way
            return;
        }

        let session_id = self.session.session_id();
        let detected = self
            .detector
            .detect(
                self.session.page(),
                Utc::now(),
                &session_id,
                self.session.last_outcome(),
            )
            .await;

        match detected {
            Ok(Some(outcome)) => self.handle_outcome(outcome).await,
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Detection error: {}", e);
                self.stats.errors += 1;
            }
        }
    }

    async fn handle_outcome(&mut self, outcome: RoundOutcome) {
        tracing::info!(
            "New result: {} ({})",
            outcome.number,
            outcome.color.as_str()
        );
        self.stats.collected += 1;
        self.session.record(outcome.clone());

        let reports = self.distributor.distribute(&outcome).await;
        for report in &reports {
            if matches!(report.status, Delivery::Failed(_)) {
                self.stats.errors += 1;
            }
        }
    }

    async fn finish(&mut self) {
        tracing::info!("Stopping collector...");
        self.distributor.announce_shutdown().await;
        self.session.close().await;

        let counters = self.distributor.counters();
        let runtime = Utc::now() - self.stats.started_at;
        tracing::info!(
            "Runtime: {}m {}s",
            runtime.num_minutes(),
            runtime.num_seconds() % 60
        );
        tracing::info!(
            "Final statistics: collected={} webhook_sent={} local_sent={} persisted={} errors={}",
            self.stats.collected,
            counters.webhook_sent,
            counters.local_sent,
            counters.persisted,
            self.stats.errors
        );
    }
}
