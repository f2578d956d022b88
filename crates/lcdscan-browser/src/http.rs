use crate::error::{FetchError, Result};
use crate::fetcher::{PageContent, PageFetcher};
use crate::fingerprint::BrowserProfile;
use scraper::{Html, Selector};
use std::time::Duration;

/// Plain HTTP fetcher.
///
/// Does not execute scripts or dismiss consent banners; suited to static
/// report and index pages, and gives exact HTTP status codes.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(profile: &BrowserProfile) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(profile.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Launch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<PageContent> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(url, timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| request_error(url, timeout, &e))?;
        let title = document_title(&html);

        Ok(PageContent {
            url: final_url,
            html,
            title,
        })
    }
}

fn request_error(url: &str, timeout: Duration, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Text of the document's `<title>` element, trimmed; empty when absent.
pub(crate) fn document_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_title() {
        let html = "<html><head><title>\n  L33822 - CMS  </title></head><body></body></html>";
        assert_eq!(document_title(html), "L33822 - CMS");
        assert_eq!(document_title("<html><body>no title</body></html>"), "");
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retryable() {
        let fetcher = HttpFetcher::new(&BrowserProfile::default()).expect("build client");
        let err = fetcher
            .fetch_page("not-a-url", Duration::from_secs(1))
            .await
            .expect_err("invalid URL must fail");
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(!err.is_retryable());
    }
}
