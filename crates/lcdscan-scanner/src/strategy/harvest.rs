use super::{DiscoveryStrategy, RecordSink};
use crate::error::{Result, ScanError};
use crate::probe::ProbeContext;
use async_trait::async_trait;
use lcdscan_core::{
    DocumentCode, LinkHarvestConfig, PolicyId, PolicyRecord, StrategyKind, Timestamp,
};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static LCD_ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)LCDId=(\d+)").expect("LCDId regex is hardcoded and valid"));

static DOC_ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DocID=(L\d+)").expect("DocID regex is hardcoded and valid"));

static TEXT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bL\d+\b").expect("code regex is hardcoded and valid"));

/// A record reference found in an index page hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedLink {
    pub id: PolicyId,
    pub doc_id: DocumentCode,
    pub title: String,
    pub url: String,
}

impl HarvestedLink {
    fn into_record(self) -> PolicyRecord {
        PolicyRecord {
            id: self.id,
            doc_id: self.doc_id,
            title: self.title,
            url: self.url,
            found_date: Timestamp::now(),
            strategy: StrategyKind::LinkHarvest,
        }
    }
}

/// Links extracted from one index page plus its pagination link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub links: Vec<HarvestedLink>,
    pub next: Option<String>,
}

/// Extract record links and the next-page link from an index page.
///
/// Hrefs are resolved against `page_url`. Within a page only the first link
/// for a given identifier is kept.
pub fn extract_links(
    html: &str,
    page_url: &str,
    link_selector: &str,
    next_selector: &str,
) -> PageLinks {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let resolve = |href: &str| -> Option<String> {
        match &base {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
        .map(String::from)
    };

    let mut result = PageLinks::default();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse(link_selector) {
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(id) = LCD_ID_PARAM
                .captures(href)
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .and_then(|value| PolicyId::new(value).ok())
            else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            let Some(url) = resolve(href) else {
                continue;
            };

            let text = collapse_whitespace(&anchor.text().collect::<String>());
            let code = DOC_ID_PARAM
                .captures(href)
                .map(|caps| caps[1].to_uppercase())
                .or_else(|| TEXT_CODE.find(&text).map(|m| m.as_str().to_string()));
            let doc_id = DocumentCode::extracted_or_derived(code.as_deref(), id);
            let title = if text.is_empty() {
                format!("LCD Policy {doc_id}")
            } else {
                text
            };

            result.links.push(HarvestedLink {
                id,
                doc_id,
                title,
                url,
            });
        }
    }

    if let Ok(selector) = Selector::parse(next_selector) {
        result.next = document
            .select(&selector)
            .filter(|anchor| {
                let text = anchor.text().collect::<String>();
                let text = text.trim();
                text == "Next"
                    || text == ">"
                    || text.starts_with("Next ")
                    || anchor
                        .value()
                        .attr("title")
                        .is_some_and(|title| title.contains("Next"))
            })
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| !href.trim().is_empty() && !href.trim_start().starts_with("javascript:"))
            .find_map(|href| resolve(href.trim()));
    }

    result
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Harvests record links from report and index pages.
///
/// Every linked identifier becomes a record, even one another strategy has
/// already probed. Each index chain stops at the first page with no new
/// identifiers.
#[derive(Debug, Clone)]
pub struct LinkHarvest {
    config: LinkHarvestConfig,
}

impl LinkHarvest {
    pub fn new(config: LinkHarvestConfig) -> Self {
        Self { config }
    }

    async fn follow_chain(
        &self,
        ctx: &ProbeContext,
        start: &str,
        sink: &mut RecordSink,
        seen: &mut HashSet<PolicyId>,
        totals: &mut HarvestTotals,
    ) -> Result<()> {
        let mut visited = HashSet::new();
        let mut next = Some(start.to_string());
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= self.config.max_pages || !visited.insert(url.clone()) {
                break;
            }

            let page = match ctx.fetch(&url).await {
                Ok(page) => page,
                Err(ScanError::Fetch(error)) => {
                    tracing::warn!(url = %url, error = %error, "index page unavailable, skipping");
                    totals.last_error = Some(error);
                    break;
                }
                Err(other) => return Err(other),
            };
            pages += 1;
            totals.pages += 1;

            let base = if Url::parse(&page.url).is_ok() {
                page.url.as_str()
            } else {
                url.as_str()
            };
            let extracted = extract_links(
                &page.html,
                base,
                &self.config.link_selector,
                &self.config.next_selector,
            );
            totals.links += extracted.links.len();

            let mut new_ids = 0;
            for link in extracted.links {
                if !seen.insert(link.id) {
                    continue;
                }
                new_ids += 1;
                // Probing strategies skip the id from here on; the merger settles credit.
                ctx.processed().claim(link.id);
                sink.push(link.into_record());
            }

            tracing::debug!(url = %url, page = pages, new_ids, "harvested index page");
            if new_ids == 0 {
                break;
            }
            next = extracted.next;
        }
        Ok(())
    }
}

#[derive(Default)]
struct HarvestTotals {
    pages: usize,
    links: usize,
    last_error: Option<lcdscan_browser::FetchError>,
}

#[async_trait]
impl DiscoveryStrategy for LinkHarvest {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LinkHarvest
    }

    async fn discover(&self, ctx: &ProbeContext, sink: &mut RecordSink) -> Result<()> {
        let mut seen = HashSet::new();
        let mut totals = HarvestTotals::default();

        for index in &self.config.index_pages {
            if ctx.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            let start = Url::parse(&ctx.source().base_url)
                .and_then(|base| base.join(index))
                .map(String::from)
                .unwrap_or_else(|_| index.clone());
            tracing::info!(url = %start, "harvesting index page");
            self.follow_chain(ctx, &start, sink, &mut seen, &mut totals)
                .await?;
        }

        if totals.pages == 0 {
            if let Some(error) = totals.last_error {
                return Err(ScanError::Fetch(error));
            }
        } else if totals.links == 0 {
            return Err(ScanError::StructureChanged {
                strategy: self.kind(),
                pages: totals.pages,
            });
        }

        tracing::info!(
            pages = totals.pages,
            links = totals.links,
            records = sink.len(),
            "link harvest complete"
        );
        Ok(())
    }
}
