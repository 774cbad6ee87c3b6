mod builder;

use crate::error::{BrowserError, Result};
pub use builder::SessionBuilder;
use chromiumoxide::browser::Browser;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

// One driven browser tab plus the CDP event loop keeping it alive.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    wait_timeout: Duration,
}

// An extra tab for detail pages, closed after extraction.
pub struct Tab {
    page: Page,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn new(
        browser: Browser,
        page: Page,
        handler: JoinHandle<()>,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            browser,
            page,
            handler,
            wait_timeout,
        }
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(format!("{}: {}", url, e)))?;
        // Fragment-only changes do not emit a navigation lifecycle event.
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    pub async fn html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    pub async fn current_url(&self) -> Result<String> {
        let url = self.page.url().await?;
        url.ok_or_else(|| BrowserError::Navigation("page has no URL".to_string()).into())
    }

    pub async fn wait_for(&self, selector: &str) -> Result<()> {
        self.wait_for_with(selector, self.wait_timeout).await
    }

    pub async fn wait_for_with(&self, selector: &str, timeout: Duration) -> Result<()> {
        let expr = format!("document.querySelector({}) !== null", js_str(selector));
        if self.poll_until(&expr, timeout).await {
            Ok(())
        } else {
            Err(BrowserError::WaitTimeout(selector.to_string()).into())
        }
    }

    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        if self
            .poll_until("document.readyState === \"complete\"", timeout)
            .await
        {
            Ok(())
        } else {
            Err(BrowserError::WaitTimeout("document.readyState".to_string()).into())
        }
    }

    pub async fn count(&self, selector: &str) -> Result<u64> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_str(selector)
        ))
        .await
    }

    // Click the nth match of a selector. Returns false when there is no nth match.
    pub async fn click(&self, selector: &str, index: u64) -> Result<bool> {
        self.eval(format!(
            "(() => {{ const els = document.querySelectorAll({sel}); \
             if (els.length <= {index}) return false; \
             els[{index}].scrollIntoView(); els[{index}].click(); return true; }})()",
            sel = js_str(selector),
            index = index,
        ))
        .await
    }

    pub async fn click_where_attr(&self, selector: &str, attr: &str, value: &str) -> Result<bool> {
        self.eval(format!(
            "(() => {{ for (const el of document.querySelectorAll({sel})) {{ \
             if (el.getAttribute({attr}) === {value}) {{ el.scrollIntoView(); el.click(); return true; }} }} \
             return false; }})()",
            sel = js_str(selector),
            attr = js_str(attr),
            value = js_str(value),
        ))
        .await
    }

    pub async fn click_containing(&self, selector: &str, needle: &str) -> Result<bool> {
        self.eval(format!(
            "(() => {{ for (const el of document.querySelectorAll({sel})) {{ \
             if ((el.textContent || \"\").includes({needle})) {{ el.scrollIntoView(); el.click(); return true; }} }} \
             return false; }})()",
            sel = js_str(selector),
            needle = js_str(needle),
        ))
        .await
    }

    // A missing element reads as an empty string; CDP drops JS null values.
    pub async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        let html: String = self
            .eval(format!(
                "(() => {{ const el = document.querySelector({sel}); return el ? el.innerHTML : \"\"; }})()",
                sel = js_str(selector),
            ))
            .await?;
        Ok((!html.is_empty()).then_some(html))
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.eval_unit("window.scrollTo(0, document.body.scrollHeight)".to_string())
            .await
    }

    pub async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.eval_unit(format!(
            "(() => {{ const el = document.querySelector({sel}); if (el) el.scrollIntoView(); }})()",
            sel = js_str(selector),
        ))
        .await
    }

    pub async fn scroll_element_to_bottom(&self, selector: &str) -> Result<()> {
        self.eval_unit(format!(
            "(() => {{ const el = document.querySelector({sel}); if (el) el.scrollTop = el.scrollHeight; }})()",
            sel = js_str(selector),
        ))
        .await
    }

    pub async fn open_tab(&self, url: &str) -> Result<Tab> {
        let page = self.browser.new_page(url).await?;
        let _ = page.wait_for_navigation().await;
        Ok(Tab { page })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }

    async fn poll_until(&self, expr: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            // Evaluation failures mid-navigation read as "not yet".
            if let Ok(true) = self.eval::<bool>(expr.to_string()).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn eval<T: DeserializeOwned>(&self, expr: String) -> Result<T> {
        let result = self.page.evaluate(expr).await?;
        result
            .into_value::<T>()
            .map_err(|e| BrowserError::Evaluate(e.to_string()).into())
    }

    async fn eval_unit(&self, expr: String) -> Result<()> {
        self.page.evaluate(expr).await?;
        Ok(())
    }
}

impl Tab {
    pub async fn html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    pub async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}

// Quote a string as a JS literal. Serialization of a &str cannot fail.
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap()
}
