//! Local HTTP sink
//!
//! Forwards each outcome to a local dashboard endpoint. The endpoint is
//! optional by design: connection refused means nothing is listening, which
//! is a soft success, not an error.

use super::Delivery;
use crate::config::LocalSinkConfig;
use crate::error::{CollectorError, Result};
use crate::outcome::RoundOutcome;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

#[derive(Debug, Serialize)]
struct BatchPayload {
    results: Vec<crate::outcome::OutcomeRecord>,
    count: usize,
}

pub struct LocalSink {
    http: Client,
    endpoint: String,
}

impl LocalSink {
    pub fn new(config: &LocalSinkConfig) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub async fn deliver(&self, outcome: &RoundOutcome) -> Delivery {
        let request = self
            .http
            .post(&self.endpoint)
            .json(&outcome.to_record())
            .send();
        match request.await {
            Ok(resp) if SUCCESS_STATUSES.contains(&resp.status().as_u16()) => Delivery::Delivered,
            Ok(resp) => Delivery::Failed(format!(
                "local sink returned {}",
                resp.status().as_u16()
            )),
            Err(e) if e.is_connect() => {
                tracing::warn!("Local sink not reachable, continuing without it");
                Delivery::Skipped
            }
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }

    /// Push a batch of historical outcomes to `<endpoint>/batch`.
    pub async fn send_batch(&self, records: Vec<crate::outcome::OutcomeRecord>) -> Result<Delivery> {
        let payload = BatchPayload {
            count: records.len(),
            results: records,
        };
        let request = self
            .http
            .post(format!("{}/batch", self.endpoint))
            .json(&payload)
            .send();
        match request.await {
            Ok(resp) if SUCCESS_STATUSES.contains(&resp.status().as_u16()) => {
                Ok(Delivery::Delivered)
            }
            Ok(resp) => Err(CollectorError::SinkRejected {
                sink: "local",
                status: resp.status().as_u16(),
            }),
            Err(e) if e.is_connect() => {
                tracing::warn!("Local sink not reachable for batch send");
                Ok(Delivery::Skipped)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Probe `<endpoint>/health`, expecting 200.
    pub async fn health(&self) -> bool {
        match self
            .http
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) if resp.status().as_u16() == 200 => {
                tracing::info!("Local sink is available");
                true
            }
            Ok(resp) => {
                tracing::warn!("Local sink health check returned {}", resp.status());
                false
            }
            Err(_) => {
                tracing::warn!("Local sink not available");
                false
            }
        }
    }
}
