//! Shared types used across lcdscan.
//!
//! This module defines the identifier newtypes, the strategy enum used for
//! provenance, and the durable `PolicyRecord` unit of the catalog.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a record slot in the remote catalog.
///
/// Policy IDs are positive integers. They order numerically and are
/// serialized as decimal strings (`"33822"`), which is how the remote
/// source and the persisted catalog spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId(u64);

impl PolicyId {
    /// Create a new `PolicyId`.
    ///
    /// # Errors
    /// Returns error if the value is zero.
    pub fn new(value: u64) -> Result<Self, CoreError> {
        if value == 0 {
            return Err(CoreError::Validation(
                "invalid policy ID: must be a positive integer, got 0".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Get the numeric value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PolicyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<u64>().map_err(|e| {
            CoreError::Validation(format!("invalid policy ID '{s}': {e}"))
        })?;
        Self::new(value)
    }
}

impl Serialize for PolicyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PolicyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Secondary document code of a policy (`L33822`).
///
/// Never empty: when a code cannot be extracted from page content the
/// derived form `"L" + id` is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentCode(String);

impl DocumentCode {
    /// Create a `DocumentCode` from an extracted string.
    ///
    /// # Errors
    /// Returns error if the code is empty or whitespace.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "invalid document code: must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The code derived from the policy identifier.
    #[must_use]
    pub fn derived(id: PolicyId) -> Self {
        Self(format!("L{id}"))
    }

    /// Use the extracted code when present and non-empty, otherwise derive it.
    #[must_use]
    pub fn extracted_or_derived(extracted: Option<&str>, id: PolicyId) -> Self {
        extracted
            .and_then(|code| Self::new(code).ok())
            .unwrap_or_else(|| Self::derived(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discovery procedures that can be credited with finding a record.
///
/// The declaration order is the default execution (and provenance) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Probe a fixed list of previously confirmed identifiers
    SeededValidation,
    /// Extract identifiers from links on index and report pages
    LinkHarvest,
    /// Density-adaptive probing of configured identifier ranges
    RangeProbe,
}

impl StrategyKind {
    /// All strategies in default execution order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::SeededValidation,
        StrategyKind::LinkHarvest,
        StrategyKind::RangeProbe,
    ];

    /// Stable machine name, as used in configuration and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeededValidation => "seeded-validation",
            Self::LinkHarvest => "link-harvest",
            Self::RangeProbe => "range-probe",
        }
    }

    /// Human-readable description, used for the catalog `search_method`.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SeededValidation => "Seeded ID validation",
            Self::LinkHarvest => "Report page link harvest",
            Self::RangeProbe => "Adaptive ID range probing",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown strategy '{s}'")))
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, CoreError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| CoreError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// A discovered policy: the durable unit of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Numeric identifier, unique within a catalog
    pub id: PolicyId,
    /// Secondary document code (never empty)
    pub doc_id: DocumentCode,
    /// Policy title
    pub title: String,
    /// Page the record was validated or harvested from
    pub url: String,
    /// When the record was discovered
    pub found_date: Timestamp,
    /// Strategy credited with the discovery
    pub strategy: StrategyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_id_rejects_zero() {
        assert!(PolicyId::new(0).is_err());
        assert_eq!(PolicyId::new(33822).expect("valid id").get(), 33822);
    }

    #[test]
    fn test_policy_id_parse() {
        let id: PolicyId = " 35000 ".parse().expect("parse id");
        assert_eq!(id.get(), 35000);
        assert!("L35000".parse::<PolicyId>().is_err());
        assert!("".parse::<PolicyId>().is_err());
    }

    #[test]
    fn test_policy_id_serializes_as_string() {
        let id = PolicyId::new(33822).expect("valid id");
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"33822\"");

        let back: PolicyId = serde_json::from_str(&json).expect("deserialize id");
        assert_eq!(back, id);
        assert!(serde_json::from_str::<PolicyId>("\"abc\"").is_err());
    }

    #[test]
    fn test_policy_id_orders_numerically() {
        let small = PolicyId::new(9999).expect("valid id");
        let large = PolicyId::new(10000).expect("valid id");
        assert!(small < large);
    }

    #[test]
    fn test_document_code_fallback() {
        let id = PolicyId::new(33822).expect("valid id");
        assert_eq!(DocumentCode::derived(id).as_str(), "L33822");
        assert_eq!(
            DocumentCode::extracted_or_derived(Some("  "), id).as_str(),
            "L33822"
        );
        assert_eq!(
            DocumentCode::extracted_or_derived(Some("L38617"), id).as_str(),
            "L38617"
        );
        assert!(DocumentCode::new("").is_err());
    }

    #[test]
    fn test_strategy_kind_round_trip_names() {
        for kind in StrategyKind::ALL {
            let parsed: StrategyKind = kind.as_str().parse().expect("parse kind");
            assert_eq!(parsed, kind);
        }
        assert!("crawl-everything".parse::<StrategyKind>().is_err());

        let json = serde_json::to_string(&StrategyKind::LinkHarvest).expect("serialize kind");
        assert_eq!(json, "\"link-harvest\"");
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let parsed = Timestamp::from_rfc3339(&ts.to_rfc3339()).expect("parse timestamp");
        assert_eq!(ts.as_datetime().timestamp(), parsed.as_datetime().timestamp());
    }
}
