//! Fetch boundary for the LCD discovery engine.
//!
//! Provides the `PageFetcher` capability consumed by the scanner, a retry
//! policy applied uniformly at this boundary, a headless browser engine
//! that dismisses the consent banner and renders pages to PDF, and a plain
//! HTTP fetcher for pages that need no script execution.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod http;
pub mod render;
pub mod retry;

pub use engine::BrowserEngine;
pub use error::{FetchError, FetchErrorKind, RenderError, Result};
pub use fetcher::{PageContent, PageFetcher};
pub use fingerprint::BrowserProfile;
pub use http::HttpFetcher;
pub use render::{DocumentRenderer, PdfLayout};
pub use retry::{RetryPolicy, RetryingFetcher};
