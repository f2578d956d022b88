//! lcdscan Scanner - Identifier-space discovery engine.
//!
//! This crate discovers valid LCD policy records by probing candidate
//! identifiers through the fetch boundary, classifying each page, and merging
//! what several independent strategies find into one deduplicated catalog.
//!
//! # Features
//!
//! - Conservative page classification with configurable marker strings
//! - Stride-based range scanning with density-adaptive refinement
//! - Seeded validation, report-page link harvesting and range probing
//! - Bounded concurrency, minimum inter-probe delay and run cancellation
//! - Pure, deterministic catalog merging with per-strategy provenance
//!
//! # Example
//!
//! ```rust,ignore
//! use lcdscan_scanner::{DiscoveryOrchestrator, ProbeContext};
//! use std::sync::Arc;
//!
//! let ctx = ProbeContext::from_config(&config, Arc::new(fetcher))?;
//! let orchestrator = DiscoveryOrchestrator::from_config(&config, ctx, false)?;
//! orchestrator.validate()?;
//!
//! let summary = orchestrator.run().await;
//! println!("found {} policies", summary.catalog.total());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod classifier;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod merger;
#[allow(missing_docs)]
pub mod orchestrator;
#[allow(missing_docs)]
pub mod probe;
#[allow(missing_docs)]
pub mod processed;
#[allow(missing_docs)]
pub mod range;
#[allow(missing_docs)]
pub mod refiner;
#[allow(missing_docs)]
pub mod scanner;
#[allow(missing_docs)]
pub mod strategy;

// Re-export commonly used types
pub use classifier::{Classification, PageClassifier, PolicyMatch};
pub use error::{Result, ScanError};
pub use merger::{Catalog, CatalogMerger, MergeOutcome, StrategyBatch};
pub use orchestrator::{DiscoveryOrchestrator, RunSummary, StrategyReport};
pub use probe::{ProbeContext, ProbeOutcome, ProbeStats};
pub use processed::ProcessedSet;
pub use range::SearchRange;
pub use refiner::{should_refine, DensityRefiner, RefineOutcome, RefinementLevel};
pub use scanner::{RangeScan, RangeScanner};
pub use strategy::{
    build_strategy, extract_links, DiscoveryStrategy, HarvestedLink, LinkHarvest, PageLinks,
    RangeProbe, RecordSink, SeededValidation,
};
