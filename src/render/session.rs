use crate::render::{EngineLauncher, RenderEngine, RenderError, RenderPage, RenderResult};
use std::sync::Arc;

/// Engine instance scoped to one crawl
///
/// The engine is launched on the first call to [`EngineSession::open_page`]
/// and shut down by [`EngineSession::release`]. Once released the session
/// refuses to open further pages.
pub struct EngineSession {
    launcher: Arc<dyn EngineLauncher>,
    engine: Option<Box<dyn RenderEngine>>,
    released: bool,
}

impl EngineSession {
    pub fn new(launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            launcher,
            engine: None,
            released: false,
        }
    }

    /// Opens a browsing context, launching the engine if needed
    pub async fn open_page(&mut self) -> RenderResult<Box<dyn RenderPage>> {
        if self.released {
            return Err(RenderError::EngineReleased);
        }

        if self.engine.is_none() {
            tracing::debug!("Launching render engine");
            let engine = self.launcher.launch().await?;
            self.engine = Some(engine);
        }

        match self.engine.as_mut() {
            Some(engine) => engine.open_page().await,
            None => Err(RenderError::EngineReleased),
        }
    }

    /// Returns true if an engine has been launched and not yet released
    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns true once `release` has been called
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Shuts the engine down; calling this more than once is harmless
    pub async fn release(&mut self) {
        self.released = true;

        if let Some(mut engine) = self.engine.take() {
            match engine.shutdown().await {
                Ok(()) => tracing::debug!("Render engine released"),
                Err(e) => tracing::warn!("Render engine did not shut down cleanly: {}", e),
            }
        }
    }
}
