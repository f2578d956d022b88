use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Rendered content of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Final URL after navigation
    pub url: String,
    /// Serialized document markup
    pub html: String,
    /// Document title, empty when the page has none
    pub title: String,
}

/// Capability to load a page: navigation, consent dismissal and content retrieval.
///
/// Implementations must bound every call by `timeout`.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and return its content and title.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageContent>;
}

#[async_trait::async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageContent> {
        (**self).fetch_page(url, timeout).await
    }
}
