//! Bulk document download for catalogued policies.

use crate::store::{CatalogEntry, CatalogFile};
use anyhow::{Context, Result};
use lcdscan_browser::{DocumentRenderer, PdfLayout};
use lcdscan_core::PolicyId;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How many failures the summary lists before collapsing the rest.
const SHOWN_FAILURES: usize = 5;

/// Settings for one bulk download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub layout: PdfLayout,
    pub timeout: Duration,
    /// Pause between consecutive renders
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub lcd_id: PolicyId,
    pub doc_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failures: Vec<DownloadFailure>,
    pub cancelled: bool,
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Downloaded: {}", self.downloaded)?;
        writeln!(f, "Skipped (already present): {}", self.skipped)?;
        write!(f, "Failed: {}", self.failures.len())?;
        for failure in self.failures.iter().take(SHOWN_FAILURES) {
            write!(f, "\n  - {}: {}", failure.doc_id, failure.error)?;
        }
        if self.failures.len() > SHOWN_FAILURES {
            write!(f, "\n  ... and {} more", self.failures.len() - SHOWN_FAILURES)?;
        }
        if self.cancelled {
            write!(f, "\nDownload interrupted before completion")?;
        }
        Ok(())
    }
}

/// Entries to download: every policy, or the first `sample_size`.
pub fn select_entries(catalog: &CatalogFile, all: bool, sample_size: usize) -> &[CatalogEntry] {
    if all {
        &catalog.policies
    } else {
        &catalog.policies[..sample_size.min(catalog.policies.len())]
    }
}

pub fn pdf_path(output_dir: &Path, id: PolicyId) -> PathBuf {
    output_dir.join(format!("Policy_{id}.pdf"))
}

/// Render each entry to `Policy_<id>.pdf`, skipping files that already exist.
///
/// A failed render is recorded and the run continues with the next entry.
pub async fn download_policies<R>(
    renderer: &R,
    entries: &[CatalogEntry],
    options: &DownloadOptions,
    cancel: &CancellationToken,
) -> Result<DownloadSummary>
where
    R: DocumentRenderer + ?Sized,
{
    tokio::fs::create_dir_all(&options.output_dir)
        .await
        .with_context(|| format!("failed to create {}", options.output_dir.display()))?;

    let mut summary = DownloadSummary::default();
    let total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let path = pdf_path(&options.output_dir, entry.lcd_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(doc_id = %entry.doc_id, "already downloaded, skipping");
            summary.skipped += 1;
            continue;
        }

        tracing::info!(
            progress = index + 1,
            total,
            doc_id = %entry.doc_id,
            title = %entry.title,
            "downloading policy"
        );

        let rendered = renderer
            .render_to_document(&entry.url, &options.layout, options.timeout)
            .await;
        match rendered {
            Ok(bytes) => {
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!(doc_id = %entry.doc_id, bytes = bytes.len(), path = %path.display(), "saved policy document");
                summary.downloaded += 1;
            }
            Err(e) => {
                tracing::warn!(doc_id = %entry.doc_id, error = %e, "failed to render policy");
                summary.failures.push(DownloadFailure {
                    lcd_id: entry.lcd_id,
                    doc_id: entry.doc_id.to_string(),
                    error: e.to_string(),
                });
            }
        }

        if index + 1 < total && !options.delay.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(options.delay) => {}
            }
        }
    }

    Ok(summary)
}
