//! Outcome fan-out to downstream sinks
//!
//! One accepted outcome goes to up to three independent consumers: the
//! Discord webhook, the local HTTP endpoint, and the day-file log. Sinks
//! are isolated; a failure in one never blocks or rolls back another, and
//! partial success is a normal pipeline state.

pub mod discord;
pub mod local;
pub mod store;

#[cfg(test)]
mod tests;

pub use discord::DiscordSink;
pub use local::LocalSink;
pub use store::DayFileStore;

use crate::outcome::RoundOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Webhook,
    Local,
    Store,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Webhook => write!(f, "discord webhook"),
            SinkKind::Local => write!(f, "local sink"),
            SinkKind::Store => write!(f, "day file"),
        }
    }
}

/// Per-sink outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Optional sink was not there; treated as soft success
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub sink: SinkKind,
    pub status: Delivery,
}

/// Cumulative fan-out counters, reported at shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkCounters {
    pub webhook_sent: u64,
    pub local_sent: u64,
    pub persisted: u64,
    pub failures: u64,
}

pub struct Distributor {
    discord: Option<DiscordSink>,
    local: Option<LocalSink>,
    store: Option<DayFileStore>,
    counters: SinkCounters,
}

impl Distributor {
    pub fn new(
        discord: Option<DiscordSink>,
        local: Option<LocalSink>,
        store: Option<DayFileStore>,
    ) -> Self {
        Self {
            discord,
            local,
            store,
            counters: SinkCounters::default(),
        }
    }

    /// Fan one outcome out to every enabled sink.
    ///
    /// Deliveries run concurrently but all complete (or time out on their
    /// own client timeouts) before this returns; no cross-sink coupling.
    pub async fn distribute(&mut self, outcome: &RoundOutcome) -> Vec<SinkReport> {
        let (webhook, local, store) = tokio::join!(
            async {
                match &self.discord {
                    Some(sink) => Some(sink.deliver(outcome).await),
                    None => None,
                }
            },
            async {
                match &self.local {
                    Some(sink) => Some(sink.deliver(outcome).await),
                    None => None,
                }
            },
            async {
                match &self.store {
                    Some(sink) => Some(sink.deliver(outcome).await),
                    None => None,
                }
            },
        );

        let mut reports = Vec::with_capacity(3);
        for (sink, status) in [
            (SinkKind::Webhook, webhook),
            (SinkKind::Local, local),
            (SinkKind::Store, store),
        ] {
            if let Some(status) = status {
                self.tally(sink, &status);
                reports.push(SinkReport { sink, status });
            }
        }
        reports
    }

    fn tally(&mut self, sink: SinkKind, status: &Delivery) {
        match status {
            Delivery::Delivered => {
                match sink {
                    SinkKind::Webhook => self.counters.webhook_sent += 1,
                    SinkKind::Local => self.counters.local_sent += 1,
                    SinkKind::Store => self.counters.persisted += 1,
                }
                tracing::info!("Result sent to {}", sink);
            }
            Delivery::Skipped => {
                tracing::debug!("{} skipped (not available)", sink);
            }
            Delivery::Failed(reason) => {
                self.counters.failures += 1;
                tracing::error!("Failed to send result to {}: {}", sink, reason);
            }
        }
    }

    pub fn counters(&self) -> SinkCounters {
        self.counters
    }

    pub fn discord(&self) -> Option<&DiscordSink> {
        self.discord.as_ref()
    }

    /// Best-effort lifecycle notices; never fail the caller.
    pub async fn announce_startup(&self) {
        if let Some(discord) = &self.discord {
            if let Err(e) = discord.startup().await {
                tracing::warn!("Failed to send startup notification: {}", e);
            }
        }
        if let Some(local) = &self.local {
            local.health().await;
        }
    }

    pub async fn announce_shutdown(&self) {
        if let Some(discord) = &self.discord {
            if let Err(e) = discord.shutdown().await {
                tracing::warn!("Failed to send shutdown notification: {}", e);
            }
        }
    }
}
