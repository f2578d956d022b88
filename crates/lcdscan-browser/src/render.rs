use crate::error::RenderError;
use std::time::Duration;

/// Page layout for exported documents. Lengths are in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin: f64,
    pub print_background: bool,
    pub header_template: String,
    pub footer_template: String,
}

impl Default for PdfLayout {
    /// A4 with half-inch margins, a source banner header and a page counter footer.
    fn default() -> Self {
        Self {
            paper_width: 8.27,
            paper_height: 11.69,
            margin: 0.5,
            print_background: true,
            header_template: r#"<div style="font-size:10px; text-align:center; width:100%;">Medicare LCD Policy - Downloaded from CMS.gov</div>"#.to_string(),
            footer_template: r#"<div style="font-size:10px; text-align:center; width:100%;"><span class="pageNumber"></span> of <span class="totalPages"></span></div>"#.to_string(),
        }
    }
}

/// Capability to turn a validated record page into a paginated document.
#[async_trait::async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_to_document(
        &self,
        url: &str,
        layout: &PdfLayout,
        timeout: Duration,
    ) -> Result<Vec<u8>, RenderError>;
}
