//! Rendered-page access
//!
//! The collector never parses HTML itself; everything it needs from the
//! casino page is "visible text of elements matching selector S" and "full
//! body text". [`PageHandle`] is that seam, with a Chrome DevTools
//! implementation in [`cdp`].

pub mod cdp;

pub use cdp::CdpPage;

use crate::error::Result;
use async_trait::async_trait;

/// Options for re-establishing the page transport during block recovery.
#[derive(Debug, Clone, Default)]
pub struct ReconnectOptions {
    /// Override the browser's identifying header string
    pub user_agent: Option<String>,
    /// Prefer a non-visible rendering mode (only effective when the
    /// collector launched the browser itself)
    pub headless: bool,
}

/// Exclusive handle to the rendered casino page.
///
/// Only the session manager and detector touch this, and only from the
/// collector's task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Visible text of every element matching a CSS selector.
    async fn query_text(&self, selector: &str) -> Result<Vec<String>>;

    /// Full rendered body text, used for block-page scanning.
    async fn page_text(&self) -> Result<String>;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Reload the current page in place.
    async fn reload(&self) -> Result<()>;

    /// Tear down and re-establish the transport with new identity options.
    async fn reconnect(&self, opts: &ReconnectOptions) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
