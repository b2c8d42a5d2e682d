//! Chrome DevTools Protocol page handle
//!
//! Attaches to an already-running Chrome started with
//! `--remote-debugging-port`, the same way an operator keeps a logged-in
//! casino session open and lets the collector ride along. Discovery goes
//! over the DevTools HTTP endpoints; commands go over the target's
//! websocket.

use super::{PageHandle, ReconnectOptions};
use crate::config::BrowserConfig;
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A debuggable target as reported by `/json/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpTarget {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_url: Option<String>,
}

/// Prefer a page target already on the casino host, else any page target.
pub(crate) fn pick_target<'a>(targets: &'a [CdpTarget], host: &str) -> Option<&'a CdpTarget> {
    let pages = || targets.iter().filter(|t| t.kind == "page" && t.ws_url.is_some());
    if !host.is_empty() {
        if let Some(t) = pages().find(|t| t.url.contains(host)) {
            return Some(t);
        }
    }
    pages().next()
}

/// Host portion of a URL, without pulling in a full URL parser.
pub(crate) fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

pub struct CdpPage {
    http: reqwest::Client,
    ws: Mutex<Ws>,
    next_id: AtomicU64,
    ports: Vec<u16>,
    casino_url: String,
    viewport: (u32, u32),
}

impl CdpPage {
    /// Attach to the first responsive DevTools port and pick a page target.
    ///
    /// Failure here is the one unrecoverable startup error; everything after
    /// attach is retried at the cycle level.
    pub async fn attach(browser: &BrowserConfig, casino_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DISCOVERY_TIMEOUT)
            .build()?;

        let (port, targets) = Self::discover(&http, &browser.debug_ports).await?;
        tracing::info!("Attached to DevTools on port {}", port);

        let ws = Self::open_target(&targets, casino_url).await?;

        let page = Self {
            http,
            ws: Mutex::new(ws),
            next_id: AtomicU64::new(1),
            ports: browser.debug_ports.clone(),
            casino_url: casino_url.to_string(),
            viewport: (browser.width, browser.height),
        };

        page.apply_viewport().await?;

        // The attached tab may be anywhere; bring it to the table.
        if !casino_url.is_empty() {
            let on_page = page
                .evaluate("location.href")
                .await?
                .as_str()
                .map(|u| u.contains(host_of(casino_url)))
                .unwrap_or(false);
            if !on_page {
                tracing::info!("Not on casino page, navigating");
                page.navigate(casino_url).await?;
            }
        }

        Ok(page)
    }

    async fn discover(
        http: &reqwest::Client,
        ports: &[u16],
    ) -> Result<(u16, Vec<CdpTarget>)> {
        for &port in ports {
            let version = format!("http://127.0.0.1:{port}/json/version");
            if http.get(&version).send().await.is_err() {
                continue;
            }
            let list = format!("http://127.0.0.1:{port}/json/list");
            match http.get(&list).send().await {
                Ok(resp) => {
                    let targets: Vec<CdpTarget> = resp.json().await?;
                    return Ok((port, targets));
                }
                Err(e) => {
                    tracing::debug!("Port {} answered /json/version but not /json/list: {}", port, e);
                }
            }
        }
        Err(CollectorError::Browser(format!(
            "no DevTools endpoint on ports {:?}; start Chrome with --remote-debugging-port",
            ports
        )))
    }

    async fn open_target(targets: &[CdpTarget], casino_url: &str) -> Result<Ws> {
        let target = pick_target(targets, host_of(casino_url)).ok_or_else(|| {
            CollectorError::Browser("no debuggable page target available".to_string())
        })?;
        let ws_url = target.ws_url.as_deref().unwrap_or_default();
        tracing::debug!("Connecting to target {} ({})", target.url, ws_url);
        let (ws, _) = connect_async(ws_url).await?;
        Ok(ws)
    }

    async fn apply_viewport(&self) -> Result<()> {
        let (width, height) = self.viewport;
        self.command(
            "Emulation.setDeviceMetricsOverride",
            json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            }),
        )
        .await?;
        Ok(())
    }

    /// Send one protocol command and wait for its response, skipping event
    /// notifications interleaved on the socket.
    async fn command(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({ "id": id, "method": method, "params": params }).to_string();

        let mut ws = self.ws.lock().await;
        ws.send(Message::Text(payload.into())).await?;

        let reply = tokio::time::timeout(COMMAND_TIMEOUT, async {
            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let mut v: Value = match serde_json::from_str(text.as_str()) {
                            Ok(v) => v,
                            Err(_) => continue,
                        };
                        if v.get("id").and_then(Value::as_u64) == Some(id) {
                            if let Some(err) = v.get("error") {
                                return Err(CollectorError::Browser(format!(
                                    "{method} failed: {err}"
                                )));
                            }
                            return Ok(v.get_mut("result").map(Value::take).unwrap_or(Value::Null));
                        }
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        return Err(CollectorError::Browser(
                            "DevTools connection closed".to_string(),
                        ))
                    }
                }
            }
        })
        .await
        .map_err(|_| CollectorError::Browser(format!("{method} timed out")))??;

        Ok(reply)
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .command(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        if result.get("exceptionDetails").is_some() {
            return Err(CollectorError::Browser(
                "page script threw an exception".to_string(),
            ));
        }
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PageHandle for CdpPage {
    async fn query_text(&self, selector: &str) -> Result<Vec<String>> {
        let expression = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(e => (e.innerText || '').trim()))",
            serde_json::to_string(selector)?
        );
        let value = self.evaluate(&expression).await?;
        let raw = value.as_str().unwrap_or("[]");
        Ok(serde_json::from_str(raw)?)
    }

    async fn page_text(&self) -> Result<String> {
        let value = self
            .evaluate("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.command("Page.navigate", json!({ "url": url })).await?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.command("Page.reload", json!({})).await?;
        Ok(())
    }

    async fn reconnect(&self, opts: &ReconnectOptions) -> Result<()> {
        tracing::info!(
            "Reconnecting page transport (alt identity: {}, headless: {})",
            opts.user_agent.is_some(),
            opts.headless
        );
        if opts.headless {
            // An attached browser cannot switch rendering mode; the flag only
            // matters when the operator relaunches Chrome headless.
            tracing::debug!("Headless requested on an attached browser, identity-only reconnect");
        }

        let (_, targets) = Self::discover(&self.http, &self.ports).await?;
        let ws = Self::open_target(&targets, &self.casino_url).await?;
        *self.ws.lock().await = ws;

        if let Some(ua) = &opts.user_agent {
            self.command("Network.setUserAgentOverride", json!({ "userAgent": ua }))
                .await?;
        }
        self.apply_viewport().await?;

        if !self.casino_url.is_empty() {
            self.navigate(&self.casino_url).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut ws = self.ws.lock().await;
        ws.close(None).await.ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(kind: &str, url: &str, ws: bool) -> CdpTarget {
        CdpTarget {
            kind: kind.to_string(),
            url: url.to_string(),
            ws_url: ws.then(|| format!("ws://127.0.0.1:9222/devtools/{url}")),
        }
    }

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://www.example.bet/slots/roulette?x=1"), "www.example.bet");
        assert_eq!(host_of("http://localhost:3001/result"), "localhost:3001");
        assert_eq!(host_of("no-scheme/path"), "no-scheme");
        assert_eq!(host_of(""), "");
    }

    #[test]
    fn prefers_page_on_casino_host() {
        let targets = vec![
            target("iframe", "https://other.example/embed", true),
            target("page", "https://news.example/", true),
            target("page", "https://casino.example/roulette", true),
        ];
        let picked = pick_target(&targets, "casino.example").unwrap();
        assert!(picked.url.contains("casino.example"));
    }

    #[test]
    fn falls_back_to_first_page_target() {
        let targets = vec![
            target("worker", "about:blank", true),
            target("page", "https://news.example/", true),
        ];
        let picked = pick_target(&targets, "casino.example").unwrap();
        assert_eq!(picked.url, "https://news.example/");
    }

    #[test]
    fn ignores_targets_without_debugger_url() {
        let targets = vec![target("page", "https://casino.example/roulette", false)];
        assert!(pick_target(&targets, "casino.example").is_none());
    }
}
