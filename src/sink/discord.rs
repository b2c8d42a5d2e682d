//! Discord webhook notifier
//!
//! Posts one embed per accepted outcome plus lifecycle status messages.
//! The webhook contract is strict: anything but HTTP 204 is a failure.
//! There is no retry here; the next natural event is the retry.

use super::Delivery;
use crate::config::DiscordConfig;
use crate::error::{CollectorError, Result};
use crate::outcome::{HighLow, RoundOutcome};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const USERNAME: &str = "Roulette Results Collector";

pub const STATUS_GREEN: u32 = 0x00ff00;
pub const STATUS_ORANGE: u32 = 0xffa500;
pub const STATUS_RED: u32 = 0xff0000;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: Vec<Embed>,
    username: &'static str,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<EmbedFooter>,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

pub struct DiscordSink {
    http: Client,
    webhook_url: String,
    notify_lifecycle: bool,
}

impl DiscordSink {
    pub fn new(config: &DiscordConfig) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            webhook_url: config.webhook_url.clone(),
            notify_lifecycle: config.notify_lifecycle,
        })
    }

    pub async fn deliver(&self, outcome: &RoundOutcome) -> Delivery {
        match self.send_result(outcome).await {
            Ok(()) => Delivery::Delivered,
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }

    pub async fn send_result(&self, outcome: &RoundOutcome) -> Result<()> {
        let payload = WebhookPayload {
            embeds: vec![result_embed(outcome)],
            username: USERNAME,
        };
        self.post(&payload).await
    }

    pub async fn send_status(&self, message: &str, color: u32) -> Result<()> {
        let payload = WebhookPayload {
            embeds: vec![Embed {
                title: "Roulette Collector Status".to_string(),
                description: message.to_string(),
                color,
                fields: Vec::new(),
                footer: None,
                timestamp: Utc::now().to_rfc3339(),
            }],
            username: USERNAME,
        };
        self.post(&payload).await
    }

    pub async fn startup(&self) -> Result<()> {
        if !self.notify_lifecycle {
            return Ok(());
        }
        self.send_status("🚀 Roulette results collector started", STATUS_GREEN)
            .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        if !self.notify_lifecycle {
            return Ok(());
        }
        self.send_status("🛑 Roulette results collector stopped", STATUS_ORANGE)
            .await
    }

    pub async fn error(&self, message: &str) -> Result<()> {
        self.send_status(&format!("❌ Error: {message}"), STATUS_RED)
            .await
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status == 204 {
            Ok(())
        } else {
            Err(CollectorError::SinkRejected {
                sink: "discord",
                status,
            })
        }
    }
}

fn result_embed(outcome: &RoundOutcome) -> Embed {
    let color_name = capitalize(outcome.color.as_str());
    let dozen = zero_or(outcome.dozen());
    let column = zero_or(outcome.column());
    let high_low = match outcome.high_low() {
        HighLow::Zero => "Zero",
        HighLow::Low => "Low",
        HighLow::High => "High",
    };

    Embed {
        title: format!("🎰 Roulette Result: {}", outcome.number),
        description: format!(
            "{} **{}** ({})",
            outcome.color.emoji(),
            outcome.number,
            color_name
        ),
        color: outcome.color.embed_color(),
        fields: vec![
            field("Number", outcome.number.to_string()),
            field("Color", color_name),
            field(
                "Even/Odd",
                if outcome.is_even() { "Even" } else { "Odd" }.to_string(),
            ),
            field("Dozen", dozen),
            field("Column", column),
            field("High/Low", high_low.to_string()),
        ],
        footer: Some(EmbedFooter {
            text: format!("Table: {}", outcome.table_name),
        }),
        timestamp: outcome.timestamp.to_rfc3339(),
    }
}

fn field(name: &'static str, value: String) -> EmbedField {
    EmbedField {
        name,
        value,
        inline: true,
    }
}

fn zero_or(value: u8) -> String {
    if value == 0 {
        "Zero".to_string()
    } else {
        value.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
