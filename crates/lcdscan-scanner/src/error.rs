use lcdscan_core::{ConfigError, StrategyKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] lcdscan_browser::FetchError),

    #[error("{strategy} found no records on {pages} page(s); page structure may have changed")]
    StructureChanged { strategy: StrategyKind, pages: usize },

    #[error("run cancelled")]
    Cancelled,
}

impl ScanError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
