use crate::error::{FetchError, RenderError, Result};
use crate::fetcher::{PageContent, PageFetcher};
use crate::fingerprint::BrowserProfile;
use crate::render::{DocumentRenderer, PdfLayout};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use lcdscan_core::FetchConfig;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Headless Chromium engine.
///
/// Every fetch opens its own tab, so one engine serves concurrent probes.
/// After navigation the consent banner is dismissed when present.
pub struct BrowserEngine {
    browser: Browser,
    consent_selector: String,
    settle: Duration,
    handler_task: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a browser with a randomized client profile.
    pub async fn launch(config: &FetchConfig) -> Result<Self> {
        Self::with_profile(config, BrowserProfile::randomized()).await
    }

    /// Launch a browser presenting a specific client profile.
    pub async fn with_profile(config: &FetchConfig, profile: BrowserProfile) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(profile.viewport_width, profile.viewport_height)
            .arg(format!("--user-agent={}", profile.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(FetchError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler event error: {}", e);
                }
            }
        });

        tracing::info!(
            headless = config.headless,
            user_agent = %profile.user_agent,
            "launched browser engine"
        );

        Ok(Self {
            browser,
            consent_selector: config.consent_selector.clone(),
            settle: Duration::from_millis(config.settle_ms),
            handler_task,
        })
    }

    /// Close the browser process.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("failed to close browser cleanly: {}", e);
        }
    }

    async fn new_tab(&self, url: &str, timeout: Duration) -> Result<Page> {
        tokio::time::timeout(timeout, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                after: timeout,
            })?
            .map_err(|e| cdp_error(url, timeout, e))
    }

    async fn navigate(&self, page: &Page, url: &str, timeout: Duration) -> Result<()> {
        page.goto(url)
            .await
            .map_err(|e| cdp_error(url, timeout, e))?;
        self.dismiss_consent(page).await;
        Ok(())
    }

    async fn dismiss_consent(&self, page: &Page) {
        if let Ok(button) = page.find_element(self.consent_selector.as_str()).await {
            match button.click().await {
                Ok(_) => tracing::debug!("dismissed consent banner"),
                Err(e) => tracing::debug!("consent banner present but click failed: {}", e),
            }
            tokio::time::sleep(self.settle).await;
        }
    }

    async fn load(&self, page: &Page, url: &str, timeout: Duration) -> Result<PageContent> {
        self.navigate(page, url, timeout).await?;

        let html = page
            .content()
            .await
            .map_err(|e| cdp_error(url, timeout, e))?;
        let title = page
            .get_title()
            .await
            .map_err(|e| cdp_error(url, timeout, e))?
            .unwrap_or_default();
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(PageContent {
            url: final_url,
            html,
            title,
        })
    }

    async fn print(
        &self,
        page: &Page,
        url: &str,
        layout: &PdfLayout,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, RenderError> {
        self.navigate(page, url, timeout).await?;
        tokio::time::sleep(self.settle).await;

        let params = PrintToPdfParams::builder()
            .paper_width(layout.paper_width)
            .paper_height(layout.paper_height)
            .margin_top(layout.margin)
            .margin_bottom(layout.margin)
            .margin_left(layout.margin)
            .margin_right(layout.margin)
            .print_background(layout.print_background)
            .display_header_footer(true)
            .header_template(layout.header_template.clone())
            .footer_template(layout.footer_template.clone())
            .prefer_css_page_size(true)
            .scale(1.0)
            .build();

        page.pdf(params).await.map_err(|e| RenderError::Pdf {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait::async_trait]
impl PageFetcher for BrowserEngine {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageContent> {
        let page = self.new_tab(url, timeout).await?;

        let result = tokio::time::timeout(timeout, self.load(&page, url, timeout))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                })
            });

        if let Err(e) = page.close().await {
            tracing::debug!("failed to close tab for {}: {}", url, e);
        }
        result
    }
}

#[async_trait::async_trait]
impl DocumentRenderer for BrowserEngine {
    async fn render_to_document(
        &self,
        url: &str,
        layout: &PdfLayout,
        timeout: Duration,
    ) -> std::result::Result<Vec<u8>, RenderError> {
        let page = self.new_tab(url, timeout).await?;

        let result = tokio::time::timeout(timeout, self.print(&page, url, layout, timeout))
            .await
            .unwrap_or_else(|_| {
                Err(RenderError::Fetch(FetchError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                }))
            });

        if let Err(e) = page.close().await {
            tracing::debug!("failed to close tab for {}: {}", url, e);
        }
        result
    }
}

fn cdp_error(url: &str, timeout: Duration, error: CdpError) -> FetchError {
    match error {
        CdpError::Timeout => FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        },
        other => FetchError::Transport {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
