#![allow(dead_code)]

use lcdscan_browser::{FetchError, PageContent, PageFetcher};
use lcdscan_core::{ClassifierConfig, PolicyId, SourceConfig};
use lcdscan_scanner::{PageClassifier, ProbeContext};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const INDEX_URL: &str = "https://mock.test/reports/index.aspx";

#[derive(Debug, Clone)]
pub enum MockResponse {
    Page { title: String, html: String },
    Transport,
    Status(u16),
}

/// In-memory fetcher. Unknown URLs answer with the site's error page.
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, MockResponse>>,
    calls: Mutex<Vec<String>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, response: MockResponse) {
        self.pages.lock().unwrap().insert(url.into(), response);
    }

    pub fn valid_policy(&self, id: u64, name: &str) {
        self.respond(record_url(id), valid_page(id, name));
    }

    pub fn fail_policy(&self, id: u64) {
        self.respond(record_url(id), MockResponse::Transport);
    }

    /// Cancel `token` once `calls` fetches have been served.
    pub fn cancel_after(&self, calls: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((calls, token));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, url: &str, _timeout: Duration) -> lcdscan_browser::Result<PageContent> {
        let served = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.len()
        };
        if let Some((limit, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if served >= *limit {
                token.cancel();
            }
        }

        let response = self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(error_page);

        match response {
            MockResponse::Page { title, html } => Ok(PageContent {
                url: url.to_string(),
                html,
                title,
            }),
            MockResponse::Transport => Err(FetchError::Transport {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            }),
            MockResponse::Status(status) => Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            }),
        }
    }
}

pub fn record_url(id: u64) -> String {
    SourceConfig::default().record_url(PolicyId::new(id).unwrap())
}

pub fn valid_page(id: u64, name: &str) -> MockResponse {
    MockResponse::Page {
        title: format!("LCD - {name} (L{id}) - CMS"),
        html: format!(
            "<html><body><h1>{name}</h1>\
             <p>Local Coverage Determination (LCD) L{id}</p></body></html>"
        ),
    }
}

pub fn error_page() -> MockResponse {
    MockResponse::Page {
        title: "Error - Page Not Found".to_string(),
        html: "<html><body><p>The page you requested could not be found.</p></body></html>"
            .to_string(),
    }
}

pub fn index_page(links: &[u64], next: Option<&str>) -> MockResponse {
    let mut html = String::from("<html><body><table>");
    for id in links {
        html.push_str(&format!(
            "<tr><td><a href=\"{}\">L{id} Policy {id}</a></td></tr>",
            record_url(*id)
        ));
    }
    html.push_str("</table>");
    if let Some(next) = next {
        html.push_str(&format!("<a href=\"{next}\">Next</a>"));
    }
    html.push_str("</body></html>");
    MockResponse::Page {
        title: "Final LCDs Report".to_string(),
        html,
    }
}

pub fn context(fetcher: Arc<MockFetcher>) -> ProbeContext {
    let classifier = PageClassifier::new(&ClassifierConfig::default()).unwrap();
    ProbeContext::new(fetcher, classifier, SourceConfig::default())
        .with_concurrency(2)
        .with_timeout(Duration::from_secs(1))
}
