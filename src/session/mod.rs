//! Session lifetime and anti-automation recovery
//!
//! Casino sessions go stale after a couple of hours and the site
//! occasionally swaps the game for a bot-check challenge page. The session
//! manager owns the page handle, knows when to reload it, recognizes block
//! pages, and walks a short list of identity-rotation strategies to get
//! back in. Callers own the outer retry cadence; nothing here loops
//! forever.


use crate::browser::{PageHandle, ReconnectOptions};
use crate::config::SessionConfig;
use crate::error::{CollectorError, Result};
use crate::outcome::RoundOutcome;
use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::VecDeque;

/// Substrings that mark a challenge page instead of game content.
const BLOCK_MARKERS: &[&str] = &[
    "sorry, you have been blocked",
    "cloudflare",
    "attention required",
    "checking your browser",
    "please wait while we verify",
];

/// Identity strings rotated during block recovery.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/118.0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Expired,
    Refreshing,
    Blocked,
}

pub struct SessionManager {
    page: Box<dyn PageHandle>,
    config: SessionConfig,
    started_at: DateTime<Utc>,
    phase: SessionPhase,
    /// Bounded FIFO of accepted outcomes; tail is the dedup reference
    history: VecDeque<RoundOutcome>,
}

impl SessionManager {
    pub fn new(page: Box<dyn PageHandle>, config: SessionConfig) -> Self {
        let history_size = config.history_size;
        Self {
            page,
            config,
            started_at: Utc::now(),
            phase: SessionPhase::Active,
            history: VecDeque::with_capacity(history_size),
        }
    }

    pub fn page(&self) -> &dyn PageHandle {
        self.page.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Sortable session label derived from the last successful connect.
    pub fn session_id(&self) -> String {
        self.started_at.format("%Y%m%d_%H%M%S").to_string()
    }

    pub fn is_expired(&mut self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Purely time-based; detections do not extend the session.
    pub fn is_expired_at(&mut self, now: DateTime<Utc>) -> bool {
        let timeout = Duration::minutes(self.config.timeout_minutes as i64);
        if now - self.started_at > timeout {
            self.phase = SessionPhase::Expired;
            true
        } else {
            false
        }
    }

    /// Reload the page in place and restart the session clock.
    pub async fn refresh(&mut self) -> Result<()> {
        self.phase = SessionPhase::Refreshing;
        if let Err(e) = self.page.reload().await {
            self.phase = SessionPhase::Expired;
            return Err(CollectorError::RefreshFailed(e.to_string()));
        }
        self.settle_delay().await;
        self.started_at = Utc::now();
        self.phase = SessionPhase::Active;
        tracing::info!("Session refreshed, new session id {}", self.session_id());
        Ok(())
    }

    /// Case-insensitive scan of the rendered text for challenge markers.
    /// An unreadable page is treated as not blocked; the next cycle will
    /// see it again.
    pub async fn check_blocked(&mut self) -> bool {
        let text = match self.page.page_text().await {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                tracing::debug!("Block check could not read page: {}", e);
                return false;
            }
        };
        if BLOCK_MARKERS.iter().any(|marker| text.contains(marker)) {
            self.phase = SessionPhase::Blocked;
            true
        } else {
            false
        }
    }

    /// Try each recovery strategy once: reconnect under a rotated user
    /// agent, then reconnect headless. First strategy that lands on a
    /// non-blocked page wins and restarts the session clock.
    pub async fn recover(&mut self) -> Result<()> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .map(|ua| ua.to_string());
        let strategies = [
            ReconnectOptions {
                user_agent,
                headless: false,
            },
            ReconnectOptions {
                user_agent: None,
                headless: true,
            },
        ];

        for (i, opts) in strategies.iter().enumerate() {
            tracing::warn!("Block recovery strategy {} of {}", i + 1, strategies.len());
            self.settle_delay().await;

            if let Err(e) = self.page.reconnect(opts).await {
                tracing::warn!("Reconnect failed: {}", e);
                continue;
            }
            if !self.check_blocked().await {
                self.started_at = Utc::now();
                self.phase = SessionPhase::Active;
                tracing::info!("Recovered from block page");
                return Ok(());
            }
        }

        self.phase = SessionPhase::Blocked;
        Err(CollectorError::NavigationBlocked)
    }

    /// Record an accepted outcome, evicting the oldest past the cap.
    pub fn record(&mut self, outcome: RoundOutcome) {
        self.history.push_back(outcome);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.history.back()
    }

    pub fn history(&self) -> &VecDeque<RoundOutcome> {
        &self.history
    }

    pub async fn close(&mut self) {
        if let Err(e) = self.page.close().await {
            tracing::warn!("Error closing page: {}", e);
        }
    }

    async fn settle_delay(&self) {
        let (min, max) = (
            self.config.settle_delay_min_secs,
            self.config.settle_delay_max_secs,
        );
        if max <= 0.0 {
            return;
        }
        let secs = rand::rng().random_range(min.min(max)..=max);
        tokio::time::sleep(std::time::Duration::from_secs_f64(secs)).await;
    }

    #[cfg(test)]
    pub(crate) fn set_started_at(&mut self, started_at: DateTime<Utc>) {
        self.started_at = started_at;
    }
}
