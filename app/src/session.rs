use anyhow::{Context, Result};
use lcdscan_browser::{
    BrowserEngine, BrowserProfile, HttpFetcher, PageFetcher, RetryPolicy, RetryingFetcher,
};
use lcdscan_core::{FetchBackend, FetchConfig};
use std::sync::Arc;

/// The fetch capability for one command, plus the browser behind it if any.
pub struct FetchSession {
    fetcher: Arc<dyn PageFetcher>,
    browser: Option<Arc<BrowserEngine>>,
}

impl FetchSession {
    /// Start the configured backend and wrap it in the retry policy.
    pub async fn start(config: &FetchConfig) -> Result<Self> {
        let policy = RetryPolicy::from_config(config);
        match config.backend {
            FetchBackend::Browser => {
                let engine = Arc::new(
                    BrowserEngine::launch(config)
                        .await
                        .context("failed to launch headless browser")?,
                );
                Ok(Self {
                    fetcher: Arc::new(RetryingFetcher::new(engine.clone(), policy)),
                    browser: Some(engine),
                })
            }
            FetchBackend::Http => {
                let http = HttpFetcher::new(&BrowserProfile::randomized())
                    .context("failed to build HTTP client")?;
                Ok(Self {
                    fetcher: Arc::new(RetryingFetcher::new(http, policy)),
                    browser: None,
                })
            }
        }
    }

    /// Launch a browser for document rendering regardless of the fetch backend.
    pub async fn start_renderer(config: &FetchConfig) -> Result<Arc<BrowserEngine>> {
        let engine = BrowserEngine::launch(config)
            .await
            .context("failed to launch headless browser")?;
        Ok(Arc::new(engine))
    }

    pub fn fetcher(&self) -> Arc<dyn PageFetcher> {
        self.fetcher.clone()
    }

    /// Close the browser once no other handle to it remains.
    pub async fn close(self) {
        drop(self.fetcher);
        if let Some(engine) = self.browser {
            close_browser(engine).await;
        }
    }
}

pub async fn close_browser(engine: Arc<BrowserEngine>) {
    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.shutdown().await,
        Err(_) => tracing::debug!("browser still shared at shutdown; dropping handle"),
    }
}
