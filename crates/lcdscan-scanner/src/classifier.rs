//! Page classification.
//!
//! Decides whether fetched content is a valid record page and, if so,
//! extracts its canonical metadata. Classification is a pure function of
//! the supplied title and markup; it never touches the network.
//!
//! Policy, first match wins:
//! 1. any negative signal in the title or body text: `NotFound`
//! 2. long-form marker in the body, or short-form marker in the title: `Valid`
//! 3. otherwise: `Ambiguous`

use crate::error::Result;
use lcdscan_browser::PageContent;
use lcdscan_core::{
    ClassifierConfig, ConfigError, DocumentCode, PolicyId, PolicyRecord, StrategyKind, Timestamp,
};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Canonical metadata extracted from a valid record page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMatch {
    pub id: PolicyId,
    pub doc_id: DocumentCode,
    pub title: String,
}

impl PolicyMatch {
    /// Stamp the match with its origin to produce a catalog record.
    pub fn into_record(self, url: String, strategy: StrategyKind) -> PolicyRecord {
        PolicyRecord {
            id: self.id,
            doc_id: self.doc_id,
            title: self.title,
            url,
            found_date: Timestamp::now(),
            strategy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Valid(PolicyMatch),
    NotFound,
    /// The page loaded but matched neither signal set strongly enough.
    Ambiguous(String),
}

pub struct PageClassifier {
    negative_signals: Vec<String>,
    positive_marker: String,
    short_marker: String,
    code_pattern: Regex,
    heading_selector: String,
    title_suffix: String,
}

impl PageClassifier {
    /// Build a classifier, compiling the code pattern and checking the heading selector.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let code_pattern =
            Regex::new(&config.code_pattern).map_err(|e| ConfigError::InvalidValue {
                field: "classifier.code_pattern".to_string(),
                reason: e.to_string(),
            })?;

        Selector::parse(&config.heading_selector).map_err(|e| ConfigError::InvalidValue {
            field: "classifier.heading_selector".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            negative_signals: config.negative_signals.clone(),
            positive_marker: config.positive_marker.clone(),
            short_marker: config.short_marker.clone(),
            code_pattern,
            heading_selector: config.heading_selector.clone(),
            title_suffix: config.title_suffix.clone(),
        })
    }

    pub fn classify_page(&self, id: PolicyId, page: &PageContent) -> Classification {
        self.classify(id, &page.title, &page.html)
    }

    pub fn classify(&self, id: PolicyId, title: &str, html: &str) -> Classification {
        let document = Html::parse_document(html);
        let body = body_text(&document);

        if let Some(signal) = self
            .negative_signals
            .iter()
            .find(|signal| title.contains(signal.as_str()) || body.contains(signal.as_str()))
        {
            tracing::trace!(policy_id = %id, signal = %signal, "negative signal present");
            return Classification::NotFound;
        }

        let long_form = body.contains(&self.positive_marker);
        let short_form = !self.short_marker.is_empty() && title.contains(&self.short_marker);
        if !long_form && !short_form {
            return Classification::Ambiguous(format!(
                "neither '{}' in body nor '{}' in title",
                self.positive_marker, self.short_marker
            ));
        }

        let extracted = self.code_pattern.find(&body).map(|m| m.as_str());
        let doc_id = DocumentCode::extracted_or_derived(extracted, id);

        let title = self
            .heading(&document)
            .or_else(|| self.clean_title(title))
            .unwrap_or_else(|| format!("LCD Policy {}", DocumentCode::derived(id)));

        Classification::Valid(PolicyMatch { id, doc_id, title })
    }

    fn heading(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse(&self.heading_selector).ok()?;
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty())
    }

    fn clean_title(&self, title: &str) -> Option<String> {
        let trimmed = title.trim();
        let stripped = if self.title_suffix.is_empty() {
            trimmed
        } else {
            trimmed
                .strip_suffix(self.title_suffix.trim_end())
                .unwrap_or(trimmed)
        };
        let cleaned = collapse_whitespace(stripped);
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

/// Visible text under `<body>`, excluding script and style content.
fn body_text(document: &Html) -> String {
    let mut text = String::new();
    let Ok(selector) = Selector::parse("body") else {
        return text;
    };

    for body in document.select(&selector) {
        for node in body.descendants() {
            let Some(fragment) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().filter_map(ElementRef::wrap).any(|el| {
                matches!(
                    el.value().name(),
                    "script" | "style" | "noscript" | "template"
                )
            });
            if !hidden {
                text.push_str(fragment);
                text.push(' ');
            }
        }
    }
    text
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
