//! Render engine capability and page snapshot extraction
//!
//! The crawler never talks to a browser or HTTP client directly. It goes
//! through three traits:
//!
//! - [`EngineLauncher`] starts an engine instance (once per crawl)
//! - [`RenderEngine`] opens one browsing context per URL and shuts down
//! - [`RenderPage`] navigates, then extracts a [`PageSnapshot`]
//!
//! [`EngineSession`] wraps a launcher as a scoped resource: the engine is
//! launched lazily on the first page and nothing can be opened after release.
//! [`HttpEngineLauncher`] is the engine shipped with the crate.

mod extract;
mod http;
mod session;
mod snapshot;

pub use extract::extract_snapshot;
pub use http::{build_http_client, HttpEngineLauncher, HttpPage, HttpRenderEngine};
pub use session::EngineSession;
pub use snapshot::PageSnapshot;

use crate::config::{CrawlerConfig, WaitCondition};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a render engine
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Render engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Failed to extract {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("Render engine has already been released")]
    EngineReleased,
}

impl RenderError {
    /// Returns true if the error concerns the engine rather than one page
    ///
    /// Fatal errors end the crawl; all others are recorded against the page.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::EngineReleased)
    }
}

/// Result type for render engine operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Options applied to a single navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationOptions {
    pub wait_until: WaitCondition,
    pub timeout: Duration,
}

impl NavigationOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            wait_until: config.wait_until,
            timeout: Duration::from_millis(config.navigation_timeout_ms),
        }
    }
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Metadata of a completed navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResult {
    /// HTTP status of the main document
    pub status_code: u16,
    /// Time from the start of navigation until the wait condition held
    pub elapsed_ms: u64,
    /// URL of the document after redirects
    pub final_url: Url,
}

/// Starts render engine instances
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Launches a new engine; failures are reported as `EngineUnavailable`
    async fn launch(&self) -> RenderResult<Box<dyn RenderEngine>>;
}

/// A running render engine
#[async_trait]
pub trait RenderEngine: Send {
    /// Opens a fresh browsing context
    async fn open_page(&mut self) -> RenderResult<Box<dyn RenderPage>>;

    /// Shuts the engine down; pages can no longer be opened afterwards
    async fn shutdown(&mut self) -> RenderResult<()>;
}

/// A single browsing context
#[async_trait]
pub trait RenderPage: Send {
    async fn navigate(
        &mut self,
        url: &Url,
        options: &NavigationOptions,
    ) -> RenderResult<NavigationResult>;

    /// Reads the rendered document into a snapshot
    ///
    /// Only valid after a successful `navigate`.
    async fn extract(&mut self) -> RenderResult<PageSnapshot>;

    /// Returns the raw source of the loaded document
    async fn content(&mut self) -> RenderResult<String>;

    /// Closes the browsing context, discarding the loaded document
    async fn close(&mut self) -> RenderResult<()>;
}
