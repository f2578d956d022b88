//! lcdscan Core - Foundation crate for the LCD discovery tooling.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the fetch layer, the discovery engine and the command
//! line binary all depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and records (`PolicyId`, `DocumentCode`, `StrategyKind`, `PolicyRecord`)
//!
//! # Example
//!
//! ```rust
//! use lcdscan_core::{AppConfig, PolicyId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let id = PolicyId::new(33822)?;
//! assert_eq!(config.source.record_url(id), "https://www.cms.gov/medicare-coverage-database/view/lcd.aspx?LCDId=33822");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, ClassifierConfig, FetchBackend, FetchConfig, LinkHarvestConfig, RangeProbeConfig,
    RangeSpec, RefineConfig, RenderConfig, SourceConfig, StrategiesConfig,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{DocumentCode, PolicyId, PolicyRecord, StrategyKind, Timestamp};
