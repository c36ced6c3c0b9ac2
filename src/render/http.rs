//! HTTP render engine
//!
//! This engine loads pages with a plain HTTP client:
//! - One shared client per engine instance, with the configured user agent
//! - Redirects followed by the client (max 10 hops)
//! - Navigation timeout covering both the request and the body download
//! - Non-2xx responses reported as navigation failures
//!
//! Scripts are not executed, so the snapshot reflects the server-rendered
//! document. The wait condition is accepted but has no effect.

use crate::config::UserAgentConfig;
use crate::render::{
    extract_snapshot, EngineLauncher, NavigationOptions, NavigationResult, PageSnapshot,
    RenderEngine, RenderError, RenderPage, RenderResult,
};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use url::Url;

/// Maximum redirect hops followed for a single navigation
const MAX_REDIRECTS: usize = 10;

/// Time allowed to establish a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value sent in the User-Agent header
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_audit::render::build_http_client;
///
/// let client = build_http_client("SiteAudit/1.0 (+https://example.com/bot)").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Launches [`HttpRenderEngine`] instances
#[derive(Debug, Clone)]
pub struct HttpEngineLauncher {
    user_agent: String,
}

impl HttpEngineLauncher {
    pub fn new(config: &UserAgentConfig) -> Self {
        Self {
            user_agent: config.header_value(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl EngineLauncher for HttpEngineLauncher {
    async fn launch(&self) -> RenderResult<Box<dyn RenderEngine>> {
        let client = build_http_client(&self.user_agent)
            .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;

        tracing::debug!("HTTP render engine launched as '{}'", self.user_agent);
        Ok(Box::new(HttpRenderEngine {
            client: Some(client),
        }))
    }
}

/// Render engine backed by a reqwest client
pub struct HttpRenderEngine {
    client: Option<Client>,
}

#[async_trait]
impl RenderEngine for HttpRenderEngine {
    async fn open_page(&mut self) -> RenderResult<Box<dyn RenderPage>> {
        let client = self.client.clone().ok_or(RenderError::EngineReleased)?;
        Ok(Box::new(HttpPage::new(client)))
    }

    async fn shutdown(&mut self) -> RenderResult<()> {
        self.client = None;
        Ok(())
    }
}

/// Document held by a page after a successful navigation
#[derive(Debug)]
struct LoadedDocument {
    url: Url,
    html: String,
    navigation: NavigationResult,
}

/// One browsing context of the HTTP engine
pub struct HttpPage {
    client: Client,
    loaded: Option<LoadedDocument>,
}

impl HttpPage {
    fn new(client: Client) -> Self {
        Self {
            client,
            loaded: None,
        }
    }

    async fn load(&self, url: &Url) -> RenderResult<(String, NavigationResult)> {
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;

        let navigation = NavigationResult {
            status_code: status.as_u16(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_url,
        };

        Ok((html, navigation))
    }
}

#[async_trait]
impl RenderPage for HttpPage {
    async fn navigate(
        &mut self,
        url: &Url,
        options: &NavigationOptions,
    ) -> RenderResult<NavigationResult> {
        tracing::debug!("Navigating to {} (wait until {:?})", url, options.wait_until);
        self.loaded = None;

        let (html, navigation) = match tokio::time::timeout(options.timeout, self.load(url)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RenderError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: options.timeout.as_millis() as u64,
                })
            }
        };

        self.loaded = Some(LoadedDocument {
            url: url.clone(),
            html,
            navigation: navigation.clone(),
        });

        Ok(navigation)
    }

    async fn extract(&mut self) -> RenderResult<PageSnapshot> {
        let loaded = self.loaded.as_ref().ok_or_else(|| RenderError::Extraction {
            url: String::new(),
            message: "no document loaded".to_string(),
        })?;

        Ok(extract_snapshot(
            &loaded.html,
            &loaded.url,
            &loaded.navigation,
        ))
    }

    async fn content(&mut self) -> RenderResult<String> {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.html.clone())
            .ok_or_else(|| RenderError::Extraction {
                url: String::new(),
                message: "no document loaded".to_string(),
            })
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.loaded = None;
        Ok(())
    }
}

fn connect_timeout_error(url: &Url) -> RenderError {
    RenderError::NavigationTimeout {
        url: url.to_string(),
        timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
    }
}

/// Classifies a reqwest failure for `url`
fn transport_error(url: &Url, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        connect_timeout_error(url)
    } else if error.is_connect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else if error.is_redirect() {
        RenderError::Navigation {
            url: url.to_string(),
            message: format!("Too many redirects (max {})", MAX_REDIRECTS),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
