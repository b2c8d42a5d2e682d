//! Winning-number extraction from the rendered page
//!
//! The game UI exposes no structured round feed, only whatever element
//! currently displays the last winning number, and its markup differs per
//! provider skin. The detector walks an ordered list of selector guesses,
//! most specific first, and accepts the first element text that parses as a
//! pocket number. A miss is a normal cycle outcome, not an error.


use crate::browser::PageHandle;
use crate::config::CollectorConfig;
use crate::error::Result;
use crate::outcome::RoundOutcome;
use chrono::{DateTime, Duration, Utc};

pub struct Detector {
    /// Selector candidates in priority order; first hit wins
    candidates: Vec<String>,
    dedup_window: Duration,
    table_name: String,
}

impl Detector {
    pub fn new(config: &CollectorConfig, table_name: impl Into<String>) -> Self {
        Self {
            candidates: config.selectors.clone(),
            dedup_window: Duration::seconds(config.dedup_window_secs),
            table_name: table_name.into(),
        }
    }

    /// Scan the page once. Returns the newly observed outcome, or `None`
    /// when nothing parseable is visible or the read is a duplicate.
    ///
    /// Never updates dedup state; recording an accepted outcome is the
    /// caller's job once the result is fully handled.
    pub async fn detect(
        &self,
        page: &dyn PageHandle,
        now: DateTime<Utc>,
        session_id: &str,
        last: Option<&RoundOutcome>,
    ) -> Result<Option<RoundOutcome>> {
        for selector in &self.candidates {
            let texts = match page.query_text(selector).await {
                Ok(texts) => texts,
                Err(e) => {
                    tracing::debug!("Selector {} failed: {}", selector, e);
                    continue;
                }
            };

            for text in &texts {
                let Some(number) = parse_pocket_number(text) else {
                    continue;
                };

                if self.is_duplicate(number, now, last) {
                    tracing::debug!(
                        "Ignoring re-read of {} within dedup window",
                        number
                    );
                    return Ok(None);
                }

                let outcome =
                    RoundOutcome::new(number, now, self.table_name.clone(), session_id)?;
                tracing::info!(
                    "Result detected via {}: {} ({})",
                    selector,
                    outcome.number,
                    outcome.color.as_str()
                );
                return Ok(Some(outcome));
            }
        }

        Ok(None)
    }

    /// Same number seen again inside the window is assumed to be the same
    /// round still on screen. The page carries no round id, so a genuine
    /// repeat inside the window is indistinguishable and gets dropped too.
    fn is_duplicate(&self, number: u8, now: DateTime<Utc>, last: Option<&RoundOutcome>) -> bool {
        match last {
            Some(prev) => prev.number == number && now - prev.timestamp < self.dedup_window,
            None => false,
        }
    }
}

/// Strict parse: trimmed, all ASCII digits, in 0..=36.
fn parse_pocket_number(text: &str) -> Option<u8> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: u8 = trimmed.parse().ok()?;
    (number <= 36).then_some(number)
}
