use super::Session;
use crate::error::{BrowserError, Result};
pub use crate::log_warn;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;

pub struct SessionBuilder {
    headless: bool,
    window_width: u32,
    window_height: u32,
    wait_timeout: Duration,
    args: Vec<String>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            wait_timeout: Duration::from_secs(15),
            args: vec![
                "--disable-dev-shm-usage".to_string(),
                "--disable-notifications".to_string(),
                "--lang=en-US".to_string(),
            ],
        }
    }

    pub fn headless(mut self, enabled: bool) -> Self {
        self.headless = enabled;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub async fn launch(self) -> Result<Session> {
        let mut config_builder = BrowserConfig::builder()
            .window_size(self.window_width, self.window_height)
            .no_sandbox();

        if !self.headless {
            config_builder = config_builder.with_head();
        }

        for arg in &self.args {
            config_builder = config_builder.arg(arg.as_str());
        }

        let config = config_builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The CDP event loop must be polled for the whole session lifetime.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log_warn!("[browser] CDP event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to open tab: {}", e)))?;

        Ok(Session::new(browser, page, handler_task, self.wait_timeout))
    }
}
